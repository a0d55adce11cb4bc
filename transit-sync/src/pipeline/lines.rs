//! Line assembly: binding registry lines to matching OSM geometries.

use std::collections::HashSet;

use geo_types::{LineString, MultiLineString};

use crate::color::{FALLBACK_COLOR, normalize_hex, same_color};
use crate::domain::{ElementId, RawElement};
use crate::geometry::chain_parts;
use crate::matching::{
    KeywordSet, Suggestion, candidate_names, line_candidate_names, normalize, suggest_line,
};
use crate::registry::{LineSpec, Registry};

/// Why a registry line produced no output this run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineShortfall {
    /// The line has no keywords to match with
    #[error("no keywords configured")]
    NoKeywords,

    /// Not enough matching geometries were found
    #[error("found {found} matching segment(s), need at least {required}")]
    TooFewSegments { found: usize, required: usize },
}

/// A registry line bound to the geometries that represent it.
#[derive(Debug, Clone)]
pub struct MatchedLine {
    pub spec: LineSpec,
    /// Effective display order.
    pub order: u32,
    /// Resolved display colour (`#RRGGBB` when known).
    pub color: String,
    /// Matching elements in discovery order; these are what get published.
    pub segments: Vec<RawElement>,
    /// All segment parts chained into one travel direction, for distance
    /// and ordering calculations only.
    pub combined: MultiLineString<f64>,
}

/// Match a line's keywords against every line-shaped element.
pub fn assemble_line(
    spec: &LineSpec,
    order: u32,
    line_elements: &[&RawElement],
    local_languages: &[String],
) -> Result<MatchedLine, LineShortfall> {
    let keywords = KeywordSet::new(spec.keywords.iter().map(String::as_str));
    if keywords.is_empty() {
        return Err(LineShortfall::NoKeywords);
    }

    let segments: Vec<RawElement> = line_elements
        .iter()
        .filter(|el| keywords.matches_any(&line_candidate_names(&el.tags, local_languages)))
        .map(|el| (*el).clone())
        .collect();

    let required = spec.required_segments();
    if segments.len() < required {
        return Err(LineShortfall::TooFewSegments {
            found: segments.len(),
            required,
        });
    }

    let parts: Vec<LineString<f64>> = segments
        .iter()
        .flat_map(|el| el.line_parts().into_iter().cloned())
        .collect();

    Ok(MatchedLine {
        spec: spec.clone(),
        order,
        color: resolve_color(spec, &segments),
        segments,
        combined: chain_parts(parts),
    })
}

/// Registry colour, else the first valid OSM `colour`, else the fallback.
fn resolve_color(spec: &LineSpec, segments: &[RawElement]) -> String {
    if let Some(color) = &spec.color {
        return normalize_hex(color).unwrap_or_else(|| color.trim().to_string());
    }
    segments
        .iter()
        .filter_map(|el| el.tags.get("colour"))
        .find_map(normalize_hex)
        .unwrap_or_else(|| FALLBACK_COLOR.to_string())
}

/// Warnings about disagreements between registry and OSM colours.
///
/// One warning per distinct OSM colour that differs from the registry; when
/// the registry has no colour, one warning naming the colour that was used.
pub fn color_warnings(line: &MatchedLine) -> Vec<String> {
    let id = &line.spec.id;
    let tagged: Vec<(ElementId, &str)> = line
        .segments
        .iter()
        .filter_map(|el| el.tags.get("colour").map(|c| (el.id, c)))
        .collect();

    match &line.spec.color {
        Some(configured) => {
            let mut seen: Vec<&str> = Vec::new();
            let mut warnings = Vec::new();
            for (element, colour) in tagged {
                if same_color(configured, colour) || seen.iter().any(|s| same_color(s, colour)) {
                    continue;
                }
                seen.push(colour);
                warnings.push(format!(
                    "{id}: OSM colour {colour} on {element} differs from registry colour {configured}"
                ));
            }
            warnings
        }
        None if line.color == FALLBACK_COLOR && tagged.is_empty() => vec![format!(
            "{id}: no colour configured or tagged; using {FALLBACK_COLOR}"
        )],
        None => vec![format!(
            "{id}: no colour configured; using OSM colour {}",
            line.color
        )],
    }
}

/// A named line-shaped element that matches no registry line.
#[derive(Debug, Clone, PartialEq)]
pub struct UnregisteredLine {
    pub element: ElementId,
    pub name: String,
    pub suggestion: Option<Suggestion>,
}

/// Report line-shaped elements whose names match no configured keywords.
///
/// Unnamed elements (plain track) are ignored. Results are de-duplicated by
/// normalized name, keeping the first element seen.
pub fn find_unregistered_lines(
    line_elements: &[&RawElement],
    registry: &Registry,
    min_suggestion_score: f64,
) -> Vec<UnregisteredLine> {
    let keyword_sets: Vec<KeywordSet> = registry
        .lines
        .iter()
        .map(|l| KeywordSet::new(l.keywords.iter().map(String::as_str)))
        .filter(|k| !k.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for el in line_elements {
        let names = candidate_names(&el.tags, &registry.local_languages);
        let Some(primary) = names.first() else {
            continue;
        };

        let all_names = line_candidate_names(&el.tags, &registry.local_languages);
        if keyword_sets.iter().any(|k| k.matches_any(&all_names)) {
            continue;
        }
        if !seen.insert(normalize(primary)) {
            continue;
        }

        found.push(UnregisteredLine {
            element: el.id,
            name: primary.clone(),
            suggestion: suggest_line(&names, &registry.lines, min_suggestion_score),
        });
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ElementGeometry, LineId, Tags};

    fn way(id: i64, tags: &[(&str, &str)], coords: &[(f64, f64)]) -> RawElement {
        RawElement {
            id: ElementId::way(id),
            tags: tags.iter().copied().collect::<Tags>(),
            geometry: ElementGeometry::LineString(LineString::from(coords.to_vec())),
        }
    }

    fn spec(id: &str, keywords: &[&str], color: Option<&str>) -> LineSpec {
        LineSpec {
            id: LineId::parse(id).unwrap(),
            name: id.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            color: color.map(str::to_string),
            icon: None,
            order: None,
            allow_single_segment: false,
        }
    }

    fn elements() -> Vec<RawElement> {
        vec![
            way(1, &[("name", "Red Line"), ("colour", "#ff0000")], &[(0.0, 0.0), (1.0, 0.0)]),
            way(2, &[("name", "Blue Line")], &[(0.0, 1.0), (1.0, 1.0)]),
            way(3, &[("name", "red-line"), ("colour", "#EE352E")], &[(1.0, 0.0), (2.0, 0.0)]),
            way(4, &[("railway", "subway")], &[(5.0, 5.0), (6.0, 5.0)]),
        ]
    }

    #[test]
    fn assembles_matching_segments() {
        let els = elements();
        let refs: Vec<&RawElement> = els.iter().collect();
        let line = assemble_line(&spec("L1", &["Red Line"], Some("#EE352E")), 0, &refs, &[]).unwrap();

        assert_eq!(line.segments.len(), 2);
        assert_eq!(line.segments[0].id, ElementId::way(1));
        assert_eq!(line.segments[1].id, ElementId::way(3));
        assert_eq!(line.combined.0.len(), 2);
        assert_eq!(line.color, "#EE352E");
    }

    #[test]
    fn empty_keywords_is_shortfall() {
        let els = elements();
        let refs: Vec<&RawElement> = els.iter().collect();
        let err = assemble_line(&spec("L1", &[], None), 0, &refs, &[]).unwrap_err();
        assert_eq!(err, LineShortfall::NoKeywords);
    }

    #[test]
    fn single_segment_needs_waiver() {
        let els = elements();
        let refs: Vec<&RawElement> = els.iter().collect();

        let err = assemble_line(&spec("B", &["Blue Line"], None), 0, &refs, &[]).unwrap_err();
        assert_eq!(err, LineShortfall::TooFewSegments { found: 1, required: 2 });
        assert_eq!(err.to_string(), "found 1 matching segment(s), need at least 2");

        let mut waived = spec("B", &["Blue Line"], None);
        waived.allow_single_segment = true;
        assert!(assemble_line(&waived, 0, &refs, &[]).is_ok());
    }

    #[test]
    fn ref_tag_matches_keywords() {
        let els = vec![
            way(1, &[("ref", "U2")], &[(0.0, 0.0), (1.0, 0.0)]),
            way(2, &[("ref", "u2")], &[(1.0, 0.0), (2.0, 0.0)]),
        ];
        let refs: Vec<&RawElement> = els.iter().collect();
        assert!(assemble_line(&spec("U2", &["U2"], None), 0, &refs, &[]).is_ok());
    }

    #[test]
    fn color_warning_for_mismatch() {
        let els = elements();
        let refs: Vec<&RawElement> = els.iter().collect();
        let line = assemble_line(&spec("L1", &["Red Line"], Some("#ee352e")), 0, &refs, &[]).unwrap();

        let warnings = color_warnings(&line);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("#ff0000"));
        assert!(warnings[0].contains("way/1"));
    }

    #[test]
    fn osm_color_used_when_unconfigured() {
        let els = elements();
        let refs: Vec<&RawElement> = els.iter().collect();
        let line = assemble_line(&spec("L1", &["Red Line"], None), 0, &refs, &[]).unwrap();

        assert_eq!(line.color, "#FF0000");
        let warnings = color_warnings(&line);
        assert_eq!(warnings, vec!["L1: no colour configured; using OSM colour #FF0000"]);
    }

    #[test]
    fn fallback_color_when_nothing_known() {
        let els = vec![
            way(1, &[("name", "Gray")], &[(0.0, 0.0), (1.0, 0.0)]),
            way(2, &[("name", "Gray")], &[(1.0, 0.0), (2.0, 0.0)]),
        ];
        let refs: Vec<&RawElement> = els.iter().collect();
        let line = assemble_line(&spec("G", &["Gray"], None), 0, &refs, &[]).unwrap();
        assert_eq!(line.color, FALLBACK_COLOR);
        assert!(color_warnings(&line)[0].contains("no colour configured or tagged"));
    }

    #[test]
    fn unregistered_lines_are_reported_once() {
        let mut els = elements();
        els.push(way(5, &[("name", "Blue  Line")], &[(0.0, 2.0), (1.0, 2.0)]));
        let refs: Vec<&RawElement> = els.iter().collect();

        let registry: Registry = serde_json::from_value(serde_json::json!({
            "bbox": [0, 0, 10, 10],
            "lines": [
                {"id": "L1", "name": "Red Line", "keywords": ["Red Line"]},
                {"id": "X", "name": "Unused", "keywords": []}
            ]
        }))
        .unwrap();

        let found = find_unregistered_lines(&refs, &registry, 0.3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].element, ElementId::way(2));
        assert_eq!(found[0].name, "Blue Line");
        // "Blue Line" vs "Red Line" shares one token of three.
        assert_eq!(found[0].suggestion.as_ref().unwrap().line.as_str(), "L1");
    }
}
