//! Registry document types.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{BoundingBox, Coordinate, LineId};
use crate::matching::normalize;

use super::error::RegistryError;

/// One configured line and the keywords that identify its geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LineSpec {
    pub id: LineId,
    pub name: String,
    /// Names matched against OSM line tags. An empty list skips the line.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Display order; defaults to the position in the registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    /// Accept a single matching way (funiculars, single-span cableways).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_single_segment: bool,
}

impl LineSpec {
    /// Minimum number of matching geometries for the line to count as found.
    pub fn required_segments(&self) -> usize {
        if self.allow_single_segment { 1 } else { 2 }
    }
}

/// Per-city configuration maintained by operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Registry {
    pub bbox: BoundingBox,
    #[serde(default)]
    pub modes: Vec<String>,
    /// Language codes whose `name:<lang>` tags count as names.
    #[serde(default)]
    pub local_languages: Vec<String>,
    #[serde(default)]
    pub lines: Vec<LineSpec>,
    /// Raw station name → canonical name.
    #[serde(default)]
    pub station_aliases: BTreeMap<String, String>,
    /// Canonical name → localized names published as alternates.
    #[serde(default)]
    pub station_local_names: BTreeMap<String, Vec<String>>,
    /// Line → canonical station name → fixed coordinate.
    #[serde(default)]
    pub manual_coords: BTreeMap<LineId, BTreeMap<String, Coordinate>>,
}

impl Registry {
    /// Parse and validate a registry document.
    pub fn from_json(city: &str, json: &str) -> Result<Self, RegistryError> {
        let registry: Registry =
            serde_json::from_str(json).map_err(|e| RegistryError::Malformed {
                city: city.to_string(),
                message: e.to_string(),
            })?;
        registry.validate()?;
        Ok(registry)
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for line in &self.lines {
            if !seen.insert(&line.id) {
                return Err(RegistryError::DuplicateLine(line.id.clone()));
            }
        }

        for line_id in self.manual_coords.keys() {
            if !seen.contains(line_id) {
                return Err(RegistryError::UnknownLine(line_id.clone()));
            }
        }

        Ok(())
    }

    pub fn line(&self, id: &LineId) -> Option<&LineSpec> {
        self.lines.iter().find(|l| &l.id == id)
    }

    /// Effective display order of the line at `index`.
    pub fn line_order(&self, index: usize) -> u32 {
        self.lines
            .get(index)
            .and_then(|l| l.order)
            .unwrap_or(index as u32)
    }

    /// Resolve a raw station name to its canonical name.
    ///
    /// Exact alias keys win; otherwise keys are compared after
    /// normalization. Names without an alias are their own canonical name.
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        if let Some(canonical) = self.station_aliases.get(name) {
            return canonical;
        }
        let wanted = normalize(name);
        self.station_aliases
            .iter()
            .find(|(alias, _)| normalize(alias) == wanted)
            .map(|(_, canonical)| canonical.as_str())
            .unwrap_or(name)
    }

    pub fn local_names(&self, canonical: &str) -> Option<&[String]> {
        self.station_local_names
            .get(canonical)
            .map(|names| names.as_slice())
    }

    pub fn manual_coords_for(&self, line: &LineId) -> Option<&BTreeMap<String, Coordinate>> {
        self.manual_coords.get(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "bbox": [40.70, -74.02, 40.78, -73.95],
        "modes": ["subway", "tram"],
        "localLanguages": ["es"],
        "lines": [
            {"id": "L1", "name": "Red Line", "keywords": ["Red Line"], "color": "#EE352E"},
            {"id": "F", "name": "Funicular", "keywords": ["Hill Funicular"], "allowSingleSegment": true, "order": 9}
        ],
        "stationAliases": {"Central Station": "Central"},
        "stationLocalNames": {"Central": ["Estación Central"]},
        "manualCoords": {"L1": {"Pier Station": {"lat": 40.71, "lon": -74.01}}}
    }"##;

    fn line(id: &str) -> LineId {
        LineId::parse(id).unwrap()
    }

    #[test]
    fn parse_sample() {
        let r = Registry::from_json("nyc", SAMPLE).unwrap();
        assert_eq!(r.lines.len(), 2);
        assert_eq!(r.lines[0].required_segments(), 2);
        assert_eq!(r.lines[1].required_segments(), 1);
        assert_eq!(r.line_order(0), 0);
        assert_eq!(r.line_order(1), 9);
        assert_eq!(
            r.manual_coords_for(&line("L1")).unwrap()["Pier Station"],
            Coordinate::new(40.71, -74.01)
        );
        assert_eq!(r.local_names("Central").unwrap(), ["Estación Central"]);
    }

    #[test]
    fn empty_keywords_are_allowed() {
        let json = r#"{"bbox": [0, 0, 1, 1], "lines": [{"id": "A", "name": "A"}]}"#;
        let r = Registry::from_json("x", json).unwrap();
        assert!(r.lines[0].keywords.is_empty());
    }

    #[test]
    fn duplicate_line_ids_rejected() {
        let json = r#"{"bbox": [0, 0, 1, 1], "lines": [
            {"id": "A", "name": "A", "keywords": ["a"]},
            {"id": "A", "name": "B", "keywords": ["b"]}
        ]}"#;
        let err = Registry::from_json("x", json).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateLine(id) if id.as_str() == "A"));
    }

    #[test]
    fn manual_coords_for_unknown_line_rejected() {
        let json = r#"{"bbox": [0, 0, 1, 1], "lines": [],
            "manualCoords": {"Z": {"X": {"lat": 0.5, "lon": 0.5}}}}"#;
        let err = Registry::from_json("x", json).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownLine(_)));
    }

    #[test]
    fn unknown_fields_rejected() {
        let json = r#"{"bbox": [0, 0, 1, 1], "linez": []}"#;
        let err = Registry::from_json("x", json).unwrap_err();
        assert!(matches!(err, RegistryError::Malformed { .. }));
    }

    #[test]
    fn invalid_line_id_rejected() {
        let json = r#"{"bbox": [0, 0, 1, 1], "lines": [{"id": "Red Line", "name": "x"}]}"#;
        assert!(Registry::from_json("x", json).is_err());
    }

    #[test]
    fn alias_resolution() {
        let r = Registry::from_json("nyc", SAMPLE).unwrap();
        assert_eq!(r.resolve_alias("Central Station"), "Central");
        assert_eq!(r.resolve_alias("central  station"), "Central");
        assert_eq!(r.resolve_alias("Central"), "Central");
        assert_eq!(r.resolve_alias("Elm St"), "Elm St");
    }

    #[test]
    fn serialization_roundtrip_preserves_document() {
        let r = Registry::from_json("nyc", SAMPLE).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        let again = Registry::from_json("nyc", &json).unwrap();
        assert_eq!(r, again);
        assert!(!json.contains("allowSingleSegment\":false"));
    }
}
