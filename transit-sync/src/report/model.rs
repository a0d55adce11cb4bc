//! Run report data model.
//!
//! A report is opened when the run starts, appended to while cities are
//! processed and closed with [`RunReport::finish`], which consumes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalStation, Coordinate, LineId};
use crate::pipeline::{StationDiff, UnregisteredLine};

/// A station named in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationEntry {
    pub id: u64,
    pub line: LineId,
    pub name: String,
    pub coordinate: Coordinate,
}

impl From<&CanonicalStation> for StationEntry {
    fn from(s: &CanonicalStation) -> Self {
        Self {
            id: s.id,
            line: s.line.clone(),
            name: s.name.clone(),
            coordinate: s.coordinate,
        }
    }
}

/// A station whose coordinate moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedEntry {
    pub id: u64,
    pub line: LineId,
    pub name: String,
    pub from: Coordinate,
    pub to: Coordinate,
}

/// A line that produced no output this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineErrorEntry {
    pub line: LineId,
    pub message: String,
}

/// A named line-shaped element no registry line claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisteredEntry {
    pub element: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<LineId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl From<&UnregisteredLine> for UnregisteredEntry {
    fn from(u: &UnregisteredLine) -> Self {
        Self {
            element: u.element.to_string(),
            name: u.name.clone(),
            suggestion: u.suggestion.as_ref().map(|s| s.line.clone()),
            score: u.suggestion.as_ref().map(|s| s.score),
        }
    }
}

/// Everything that happened to one city during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityReport {
    pub city: String,
    /// `cache` or `network`, once data was obtained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub lines_processed: Vec<LineId>,
    pub new_stations: Vec<StationEntry>,
    pub updated_stations: Vec<UpdatedEntry>,
    pub removed_stations: Vec<StationEntry>,
    pub line_errors: Vec<LineErrorEntry>,
    pub color_warnings: Vec<String>,
    pub unregistered_lines: Vec<UnregisteredEntry>,
    pub verification_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CityReport {
    pub fn new(city: &str) -> Self {
        Self {
            city: city.to_string(),
            ..Self::default()
        }
    }

    pub fn record_diff(&mut self, diff: &StationDiff) {
        self.new_stations.extend(diff.new.iter().map(StationEntry::from));
        self.updated_stations
            .extend(diff.updated.iter().map(|u| UpdatedEntry {
                id: u.station.id,
                line: u.station.line.clone(),
                name: u.station.name.clone(),
                from: u.previous,
                to: u.station.coordinate,
            }));
        self.removed_stations
            .extend(diff.removed.iter().map(StationEntry::from));
    }

    pub fn has_changes(&self) -> bool {
        !self.new_stations.is_empty()
            || !self.updated_stations.is_empty()
            || !self.removed_stations.is_empty()
    }
}

/// Report of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub cities: Vec<CityReport>,
    /// City-level failures, prefixed with the city.
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn start(at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at: at,
            finished_at: None,
            dry_run,
            cities: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// The entry for `city`, created on first use.
    pub fn city_mut(&mut self, city: &str) -> &mut CityReport {
        let index = match self.cities.iter().position(|c| c.city == city) {
            Some(i) => i,
            None => {
                self.cities.push(CityReport::new(city));
                self.cities.len() - 1
            }
        };
        &mut self.cities[index]
    }

    /// Record a failure; `city` is `None` for run-level failures.
    pub fn record_error(&mut self, city: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        match city {
            Some(city) => {
                self.errors.push(format!("{city}: {message}"));
                self.city_mut(city).error = Some(message);
            }
            None => self.errors.push(message),
        }
    }

    pub fn finish(mut self, at: DateTime<Utc>) -> Self {
        self.finished_at = Some(at);
        self
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        self.cities.iter().fold((0, 0, 0), |(n, u, r), c| {
            (
                n + c.new_stations.len(),
                u + c.updated_stations.len(),
                r + c.removed_stations.len(),
            )
        })
    }

    /// One-line summary, used as the notification subject.
    pub fn subject(&self) -> String {
        let (new, updated, removed) = self.counts();
        format!(
            "transit-sync {}: {} new, {} updated, {} removed, {} error(s)",
            self.started_at.format("%Y-%m-%d"),
            new,
            updated,
            removed,
            self.errors.len()
        )
    }
}
