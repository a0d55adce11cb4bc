//! Multilingual name extraction and normalization.

use std::collections::HashSet;

use crate::domain::Tags;

/// Language-independent name tags checked for every element.
const NAME_KEYS: &[&str] = &["name", "name:en", "int_name", "official_name"];

/// Tags holding `;`-separated lists of names.
const LIST_KEYS: &[&str] = &["alt_name"];

/// Romanization suffixes appended to `name:<lang>`.
const ROMANIZED_SUFFIXES: &[&str] = &["-Latn", "_rm", "-Latn-pinyin"];

/// Normalize a name for comparison.
///
/// Lower-cases, replaces every non-alphanumeric character with a space and
/// collapses runs of whitespace. Non-Latin letters are kept, so `新宿` and
/// `Shinjuku` stay distinct but comparable within their own script.
///
/// ```
/// use transit_sync::matching::normalize;
///
/// assert_eq!(normalize("  Red-Line (Main) "), "red line main");
/// assert_eq!(normalize("U2"), "u2");
/// ```
pub fn normalize(name: &str) -> String {
    let mapped: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every plausible name of an element, in discovery order, de-duplicated.
pub fn candidate_names(tags: &Tags, local_languages: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |value: &str| {
        let value = value.trim();
        if !value.is_empty() && !names.iter().any(|n| n == value) {
            names.push(value.to_string());
        }
    };

    for key in NAME_KEYS {
        if let Some(v) = tags.get(key) {
            push(v);
        }
    }
    for key in LIST_KEYS {
        if let Some(v) = tags.get(key) {
            v.split(';').for_each(&mut push);
        }
    }
    for lang in local_languages {
        let base = format!("name:{lang}");
        if let Some(v) = tags.get(&base) {
            push(v);
        }
        for suffix in ROMANIZED_SUFFIXES {
            if let Some(v) = tags.get(&format!("{base}{suffix}")) {
                push(v);
            }
        }
    }

    names
}

/// Candidate names of a line-shaped element: the station names plus `ref`.
pub fn line_candidate_names(tags: &Tags, local_languages: &[String]) -> Vec<String> {
    let mut names = candidate_names(tags, local_languages);
    if let Some(r) = tags.get("ref") {
        let r = r.trim();
        if !r.is_empty() && !names.iter().any(|n| n == r) {
            names.push(r.to_string());
        }
    }
    names
}

/// A set of normalized keywords.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    normalized: HashSet<String>,
}

impl KeywordSet {
    pub fn new<'a, I: IntoIterator<Item = &'a str>>(keywords: I) -> Self {
        Self {
            normalized: keywords
                .into_iter()
                .map(normalize)
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.normalized.contains(&normalize(name))
    }

    /// True if any candidate normalizes to a keyword.
    pub fn matches_any<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        candidates.iter().any(|c| self.contains(c.as_ref()))
    }
}
