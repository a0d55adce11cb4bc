//! Best-effort line suggestions for unregistered geometries.
//!
//! When a line-shaped element matches no configured keywords, operators
//! still want a hint about which registry line it may belong to. Scoring is
//! token overlap; the result is only offered when it is clearly the best.

use std::collections::BTreeSet;

use crate::domain::LineId;
use crate::registry::LineSpec;

use super::names::normalize;

/// Default minimum score for offering a suggestion.
pub const DEFAULT_MIN_SUGGESTION_SCORE: f64 = 0.5;

/// A suggested registry line for an unmatched name.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub line: LineId,
    pub score: f64,
}

fn tokens(name: &str) -> BTreeSet<String> {
    normalize(name)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the token sets of two names.
pub fn token_score(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    shared / union
}

/// Suggest the registry line whose name or keywords best resemble `names`.
///
/// Returns `None` when the best score is below `min_score` or when two
/// lines tie for the best score.
pub fn suggest_line(names: &[String], lines: &[LineSpec], min_score: f64) -> Option<Suggestion> {
    let mut scored: Vec<(f64, &LineId)> = lines
        .iter()
        .map(|line| {
            let score = std::iter::once(line.name.as_str())
                .chain(line.keywords.iter().map(String::as_str))
                .flat_map(|reference| names.iter().map(move |n| token_score(n, reference)))
                .fold(0.0, f64::max);
            (score, &line.id)
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let (best_score, best_line) = *scored.first()?;
    if best_score < min_score {
        return None;
    }
    if let Some((runner_up, _)) = scored.get(1)
        && *runner_up >= best_score
    {
        return None;
    }

    Some(Suggestion {
        line: best_line.clone(),
        score: best_score,
    })
}
