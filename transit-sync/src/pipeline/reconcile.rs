//! Reconciliation of computed stations against the last published output.
//!
//! Ids are stable per `(line, canonical name)`: a station keeps its id for
//! as long as it keeps being produced, new stations get ids above every id
//! ever published, and stations that disappear are never dropped from the
//! artifacts, only flagged for review.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::artifacts::{ArtifactError, Dataset};
use crate::domain::{CanonicalStation, Coordinate, LineId, StationKey};

use super::stations::LineStations;

/// Source of the previously published dataset of a city.
pub trait PriorStore {
    fn load(&self, city: &str) -> Result<Dataset, ArtifactError>;
}

/// In-memory prior datasets keyed by city.
#[derive(Debug, Clone, Default)]
pub struct MemoryPrior {
    datasets: HashMap<String, Dataset>,
}

impl MemoryPrior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, city: &str, dataset: Dataset) -> Self {
        self.datasets.insert(city.to_string(), dataset);
        self
    }
}

impl PriorStore for MemoryPrior {
    fn load(&self, city: &str) -> Result<Dataset, ArtifactError> {
        Ok(self.datasets.get(city).cloned().unwrap_or_default())
    }
}

/// A station whose coordinate moved since the last run.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedStation {
    pub station: CanonicalStation,
    pub previous: Coordinate,
}

/// Changes between the prior and the reconciled station sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationDiff {
    pub new: Vec<CanonicalStation>,
    pub updated: Vec<UpdatedStation>,
    /// Prior stations of recomputed lines that were not produced again.
    pub removed: Vec<CanonicalStation>,
}

impl StationDiff {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Result of reconciling one city.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Computed stations followed by retained prior stations.
    pub stations: Vec<CanonicalStation>,
    pub diff: StationDiff,
}

/// Assign stable ids to `computed` and retain what `prior` had beyond it.
///
/// `computed` is expected in registry line order with each line's stations
/// in order; new ids are handed out in that order. Prior stations of lines
/// that are not in `computed` are carried over untouched and not flagged.
pub fn reconcile(computed: &[LineStations], prior: &[CanonicalStation]) -> Reconciliation {
    let lookup: HashMap<StationKey, &CanonicalStation> =
        prior.iter().map(|s| (s.key(), s)).collect();
    let mut next_id = prior.iter().map(|s| s.id).max().unwrap_or(0);

    let recomputed: HashSet<&LineId> = computed.iter().map(|l| &l.line).collect();
    let mut produced: BTreeSet<StationKey> = BTreeSet::new();
    let mut stations = Vec::new();
    let mut diff = StationDiff::default();

    for line in computed {
        for located in &line.stations {
            let key = StationKey::new(line.line.clone(), &located.name);
            if !produced.insert(key.clone()) {
                continue;
            }

            let id = match lookup.get(&key) {
                Some(previous) => previous.id,
                None => {
                    next_id += 1;
                    next_id
                }
            };
            let station = CanonicalStation {
                id,
                name: located.name.clone(),
                alternate_names: located.alternate_names.clone(),
                line: line.line.clone(),
                order: located.order,
                coordinate: located.coordinate,
            };

            match lookup.get(&key) {
                None => diff.new.push(station.clone()),
                Some(previous) if previous.coordinate != station.coordinate => {
                    diff.updated.push(UpdatedStation {
                        station: station.clone(),
                        previous: previous.coordinate,
                    });
                }
                Some(_) => {}
            }
            stations.push(station);
        }
    }

    for station in prior {
        if produced.contains(&station.key()) {
            continue;
        }
        if recomputed.contains(&station.line) {
            diff.removed.push(station.clone());
        }
        stations.push(station.clone());
    }

    Reconciliation { stations, diff }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stations::{LocatedStation, StationSource};

    fn line(id: &str) -> LineId {
        LineId::parse(id).unwrap()
    }

    fn located(name: &str, order: u32, lat: f64) -> LocatedStation {
        LocatedStation {
            name: name.into(),
            alternate_names: vec![],
            coordinate: Coordinate::new(lat, 0.0),
            order,
            source: StationSource::Manual,
        }
    }

    fn prior(id: u64, line_id: &str, name: &str, lat: f64) -> CanonicalStation {
        CanonicalStation {
            id,
            name: name.into(),
            alternate_names: vec![],
            line: line(line_id),
            order: 0,
            coordinate: Coordinate::new(lat, 0.0),
        }
    }

    #[test]
    fn fresh_ids_follow_line_and_station_order() {
        let computed = vec![
            LineStations {
                line: line("L1"),
                stations: vec![located("A", 0, 1.0), located("B", 1, 2.0)],
            },
            LineStations {
                line: line("L2"),
                stations: vec![located("A", 0, 1.0)],
            },
        ];
        let result = reconcile(&computed, &[]);
        let ids: Vec<(u64, &str, &str)> = result
            .stations
            .iter()
            .map(|s| (s.id, s.line.as_str(), s.name.as_str()))
            .collect();
        assert_eq!(ids, vec![(1, "L1", "A"), (2, "L1", "B"), (3, "L2", "A")]);
        assert_eq!(result.diff.new.len(), 3);
    }

    #[test]
    fn existing_station_keeps_id_and_is_updated() {
        let computed = vec![LineStations {
            line: line("L1"),
            stations: vec![located("Elm St", 0, 40.75), located("Oak Av", 1, 40.76)],
        }];
        let previous = vec![prior(7, "L1", "Elm St", 40.70), prior(12, "L2", "Other", 1.0)];

        let result = reconcile(&computed, &previous);
        assert_eq!(result.stations[0].id, 7);
        assert_eq!(result.stations[0].coordinate, Coordinate::new(40.75, 0.0));
        assert_eq!(result.diff.updated.len(), 1);
        assert_eq!(result.diff.updated[0].previous, Coordinate::new(40.70, 0.0));
        // Counter starts at the highest prior id, across all lines.
        assert_eq!(result.stations[1].id, 13);
        assert_eq!(result.diff.new.len(), 1);
        assert_eq!(result.diff.new[0].name, "Oak Av");
    }

    #[test]
    fn respelled_station_keeps_id() {
        let computed = vec![LineStations {
            line: line("L1"),
            stations: vec![located("ELM ST", 0, 40.7)],
        }];
        let result = reconcile(&computed, &[prior(7, "L1", "Elm St", 40.7)]);

        let ids: Vec<(u64, &str, u32)> = result
            .stations
            .iter()
            .map(|s| (s.id, s.name.as_str(), s.order))
            .collect();
        assert_eq!(ids, vec![(7, "ELM ST", 0)]);
        assert!(result.diff.new.is_empty());
        assert!(result.diff.removed.is_empty());
    }

    #[test]
    fn unchanged_station_is_not_flagged() {
        let computed = vec![LineStations {
            line: line("L1"),
            stations: vec![located("Elm St", 0, 40.7)],
        }];
        let result = reconcile(&computed, &[prior(7, "L1", "Elm St", 40.7)]);
        assert!(result.diff.is_empty());
        assert_eq!(result.stations.len(), 1);
    }

    #[test]
    fn missing_station_is_retained_and_flagged() {
        let computed = vec![LineStations {
            line: line("L1"),
            stations: vec![located("A", 0, 1.0)],
        }];
        let previous = vec![prior(1, "L1", "A", 1.0), prior(2, "L1", "Gone", 2.0)];

        let result = reconcile(&computed, &previous);
        assert_eq!(result.stations.len(), 2);
        assert_eq!(result.stations[1], previous[1]);
        assert_eq!(result.diff.removed, vec![previous[1].clone()]);
    }

    #[test]
    fn stations_of_skipped_lines_are_kept_quietly() {
        let previous = vec![prior(4, "L9", "Depot", 1.0)];
        let result = reconcile(&[], &previous);
        assert_eq!(result.stations, previous);
        assert!(result.diff.is_empty());
    }

    #[test]
    fn reconciling_own_output_is_idempotent() {
        let computed = vec![LineStations {
            line: line("L1"),
            stations: vec![located("A", 0, 1.0), located("B", 1, 2.0)],
        }];
        let first = reconcile(&computed, &[]);
        let second = reconcile(&computed, &first.stations);
        assert_eq!(first.stations, second.stations);
        assert!(second.diff.is_empty());
    }

    #[test]
    fn memory_prior_defaults_to_empty() {
        let store = MemoryPrior::new().with(
            "nyc",
            Dataset {
                stations: vec![prior(1, "L1", "A", 1.0)],
                ..Dataset::default()
            },
        );
        assert_eq!(store.load("nyc").unwrap().stations.len(), 1);
        assert!(store.load("paris").unwrap().stations.is_empty());
    }
}
