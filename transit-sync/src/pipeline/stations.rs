//! Station location and clustering along a matched line.
//!
//! For one line, candidate points are filtered for eligibility, kept when
//! they lie within [`MATCH_THRESHOLD_METERS`] of the line, grouped by
//! canonical name, reduced to one representative each, ordered by their
//! position along the line, and finally patched with manual coordinates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Coordinate, ElementId, LineId, RawElement, Tags};
use crate::geometry::{distance_to_line, project_onto_line};
use crate::matching::{candidate_names, normalize};
use crate::registry::Registry;

use super::lines::MatchedLine;

/// Maximum distance between a station point and its line, in metres.
///
/// Roughly the footprint of a large platform complex; not a tuning knob.
pub const MATCH_THRESHOLD_METERS: f64 = 150.0;

/// Lifecycle prefixes that mark a feature as not in service.
const INACTIVE_STATES: &[&str] = &["construction", "proposed", "disused", "abandoned"];

/// Tags holding a planned opening date.
const OPENING_DATE_KEYS: &[&str] = &["opening_date", "start_date"];

/// True for point elements tagged as a station, halt or stop position.
pub fn is_station_like(el: &RawElement) -> bool {
    el.is_point()
        && (el.tags.any_value("railway", ["station", "halt", "tram_stop", "stop"])
            || el.tags.any_value("public_transport", ["station", "stop_position"])
            || el.tags.is("aerialway", "station"))
}

/// True for elements explicitly tagged as a rail or aerial station.
pub fn is_preferred_station(el: &RawElement) -> bool {
    el.tags.is("railway", "station")
        || el.tags.is("public_transport", "station")
        || el.tags.is("aerialway", "station")
}

fn is_inactive(tags: &Tags) -> bool {
    INACTIVE_STATES.iter().any(|state| {
        let prefix = format!("{state}:");
        tags.is("railway", state)
            || tags.is("public_transport", state)
            || tags.has(state)
            || tags.with_prefix(&prefix).next().is_some()
    })
}

/// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`; partial dates mean the first day.
fn parse_opening_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return None;
    }
    match value.split('-').count() {
        1 => NaiveDate::parse_from_str(&format!("{value}-01-01"), "%Y-%m-%d").ok(),
        2 => NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").ok(),
        3 => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn opens_after(tags: &Tags, today: NaiveDate) -> bool {
    OPENING_DATE_KEYS
        .iter()
        .filter_map(|key| tags.get(key))
        .filter_map(parse_opening_date)
        .any(|date| date > today)
}

/// Structural eligibility of a candidate point on `today`.
///
/// The element must be station-like, in service, and not scheduled to open
/// in the future. Unparseable dates are ignored.
pub fn is_eligible(el: &RawElement, today: NaiveDate) -> bool {
    is_station_like(el) && !is_inactive(&el.tags) && !opens_after(&el.tags, today)
}

/// Points that resolved to the same canonical name on one line.
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    /// Canonical name, as first seen.
    pub name: String,
    /// Members in discovery order.
    pub members: Vec<&'a RawElement>,
}

/// Group `(element, canonical name)` pairs by normalized canonical name.
///
/// Clusters appear in the order their first member was discovered.
pub fn cluster_candidates<'a, I>(candidates: I) -> Vec<Cluster<'a>>
where
    I: IntoIterator<Item = (&'a RawElement, String)>,
{
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut clusters: Vec<Cluster<'a>> = Vec::new();

    for (element, name) in candidates {
        let key = normalize(&name);
        match index.get(&key) {
            Some(&i) => clusters[i].members.push(element),
            None => {
                index.insert(key, clusters.len());
                clusters.push(Cluster {
                    name,
                    members: vec![element],
                });
            }
        }
    }

    clusters
}

/// First member tagged as a station, else the first member.
pub fn pick_representative<'a>(cluster: &Cluster<'a>) -> Option<&'a RawElement> {
    cluster
        .members
        .iter()
        .copied()
        .find(|el| is_preferred_station(el))
        .or_else(|| cluster.members.first().copied())
}

/// Where a located station's coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationSource {
    Osm(ElementId),
    Manual,
}

/// A station placed on a line, before ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedStation {
    pub name: String,
    pub alternate_names: Vec<String>,
    pub coordinate: Coordinate,
    pub order: u32,
    pub source: StationSource,
}

/// The ordered stations of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStations {
    pub line: LineId,
    pub stations: Vec<LocatedStation>,
}

/// Localized names of a station that differ from its canonical name.
fn alternate_names(registry: &Registry, canonical: &str, rep: &RawElement) -> Vec<String> {
    if let Some(configured) = registry.local_names(canonical) {
        return configured.to_vec();
    }
    let common = candidate_names(&rep.tags, &[]);
    candidate_names(&rep.tags, &registry.local_languages)
        .into_iter()
        .filter(|n| n != canonical && !common.contains(n))
        .collect()
}

/// Locate and order the stations of `line` among `points`.
pub fn locate_stations(
    line: &MatchedLine,
    points: &[&RawElement],
    registry: &Registry,
    today: NaiveDate,
) -> LineStations {
    let mut candidates = Vec::new();
    for el in points {
        if !is_eligible(el, today) {
            continue;
        }
        let Some(coordinate) = el.coordinate() else {
            continue;
        };
        let names = candidate_names(&el.tags, &registry.local_languages);
        let Some(primary) = names.first() else {
            continue;
        };
        match distance_to_line(coordinate, &line.combined) {
            Some(d) if d <= MATCH_THRESHOLD_METERS => {
                candidates.push((*el, registry.resolve_alias(primary).to_string()));
            }
            _ => {}
        }
    }

    let clusters = cluster_candidates(candidates);

    let mut placed: Vec<(f64, LocatedStation)> = clusters
        .iter()
        .filter_map(|cluster| {
            let rep = pick_representative(cluster)?;
            let coordinate = rep.coordinate()?;
            let along = project_onto_line(coordinate, &line.combined).unwrap_or(0.0);
            Some((
                along,
                LocatedStation {
                    name: cluster.name.clone(),
                    alternate_names: alternate_names(registry, &cluster.name, rep),
                    coordinate: coordinate.rounded(),
                    order: 0,
                    source: StationSource::Osm(rep.id),
                },
            ))
        })
        .collect();

    // Stable: equal positions keep discovery order.
    placed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut stations: Vec<LocatedStation> = placed
        .into_iter()
        .enumerate()
        .map(|(i, (_, mut station))| {
            station.order = i as u32;
            station
        })
        .collect();

    if let Some(overrides) = registry.manual_coords_for(&line.spec.id) {
        apply_manual_coords(&mut stations, overrides, registry);
    }

    debug!(
        line = %line.spec.id,
        candidates = clusters.len(),
        stations = stations.len(),
        "Located stations"
    );

    LineStations {
        line: line.spec.id.clone(),
        stations,
    }
}

/// Apply manual coordinates to a line's ordered stations.
///
/// A matched station keeps its order and takes the configured coordinate.
/// Unmatched names are appended after the last order, in name order.
pub fn apply_manual_coords(
    stations: &mut Vec<LocatedStation>,
    overrides: &BTreeMap<String, Coordinate>,
    registry: &Registry,
) {
    for (name, coordinate) in overrides {
        let wanted = normalize(name);
        match stations.iter_mut().find(|s| normalize(&s.name) == wanted) {
            Some(station) => {
                station.coordinate = coordinate.rounded();
                station.source = StationSource::Manual;
            }
            None => {
                let order = stations.len() as u32;
                stations.push(LocatedStation {
                    name: name.clone(),
                    alternate_names: registry
                        .local_names(name)
                        .map(<[String]>::to_vec)
                        .unwrap_or_default(),
                    coordinate: coordinate.rounded(),
                    order,
                    source: StationSource::Manual,
                });
            }
        }
    }
}
