//! Canonical station records.

use serde::{Deserialize, Serialize};

use super::{Coordinate, LineId};
use crate::matching::normalize;

/// A deduplicated, stably identified station on one line.
///
/// `id` stays the same across runs for as long as the line keeps producing
/// a station whose name normalizes the same way. `order` is the 0-based position along the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalStation {
    pub id: u64,
    pub name: String,
    pub alternate_names: Vec<String>,
    pub line: LineId,
    pub order: u32,
    pub coordinate: Coordinate,
}

impl CanonicalStation {
    /// Identity key used when reconciling runs.
    pub fn key(&self) -> StationKey {
        StationKey::new(self.line.clone(), &self.name)
    }
}

/// `(line, normalized name)` identity of a station.
///
/// Spelling changes that only touch case or punctuation keep the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationKey {
    pub line: LineId,
    pub name: String,
}

impl StationKey {
    pub fn new(line: LineId, name: &str) -> Self {
        let normalized = normalize(name);
        let name = if normalized.is_empty() {
            name.trim().to_string()
        } else {
            normalized
        };
        Self { line, name }
    }
}

impl std::fmt::Display for StationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.line, self.name)
    }
}
