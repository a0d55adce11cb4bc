//! The published dataset of a city and how a run produces it.

use std::collections::{BTreeMap, HashMap, HashSet};

use geo_types::{LineString, MultiLineString};
use serde::{Deserialize, Serialize};

use crate::color::text_color_for;
use crate::domain::{CanonicalStation, ElementGeometry, LineId};
use crate::pipeline::MatchedLine;
use crate::registry::Registry;

/// Display metadata of one line, as published in `lines.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMetadata {
    pub name: String,
    pub color: String,
    pub background_color: String,
    pub text_color: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Geometry of a published route segment.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteGeometry {
    LineString(LineString<f64>),
    MultiLineString(MultiLineString<f64>),
}

/// One route segment of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFeature {
    pub line: LineId,
    pub name: String,
    pub color: String,
    pub order: u32,
    pub geometry: RouteGeometry,
}

/// Everything published for a city.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub lines: BTreeMap<LineId, LineMetadata>,
    pub routes: Vec<RouteFeature>,
    pub stations: Vec<CanonicalStation>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.routes.is_empty() && self.stations.is_empty()
    }
}

fn route_geometry(geometry: &ElementGeometry) -> Option<RouteGeometry> {
    match geometry {
        ElementGeometry::Point(_) => None,
        ElementGeometry::LineString(ls) => Some(RouteGeometry::LineString(ls.clone())),
        ElementGeometry::MultiLineString(mls) => Some(RouteGeometry::MultiLineString(mls.clone())),
    }
}

/// Assemble the dataset to publish from this run's results.
///
/// Lines recomputed this run replace their prior metadata and routes; every
/// other line keeps what was published before. Routes are grouped by
/// registry line order (unknown lines last, by id), keeping segment order
/// within a line. Stations are sorted by line the same way, then by order
/// and id.
pub fn build_dataset(
    registry: &Registry,
    matched: &[MatchedLine],
    stations: Vec<CanonicalStation>,
    prior: &Dataset,
) -> Dataset {
    let recomputed: HashSet<&LineId> = matched.iter().map(|l| &l.spec.id).collect();

    let mut lines: BTreeMap<LineId, LineMetadata> = prior
        .lines
        .iter()
        .filter(|(id, _)| !recomputed.contains(id))
        .map(|(id, meta)| (id.clone(), meta.clone()))
        .collect();

    let mut routes: Vec<RouteFeature> = prior
        .routes
        .iter()
        .filter(|r| !recomputed.contains(&r.line))
        .cloned()
        .collect();

    for line in matched {
        let spec = &line.spec;
        lines.insert(
            spec.id.clone(),
            LineMetadata {
                name: spec.name.clone(),
                color: line.color.clone(),
                background_color: line.color.clone(),
                text_color: text_color_for(&line.color).to_string(),
                order: line.order,
                icon: spec.icon.clone(),
            },
        );

        routes.extend(line.segments.iter().filter_map(|segment| {
            Some(RouteFeature {
                line: spec.id.clone(),
                name: spec.name.clone(),
                color: line.color.clone(),
                order: line.order,
                geometry: route_geometry(&segment.geometry)?,
            })
        }));
    }

    let rank: HashMap<&LineId, usize> = registry
        .lines
        .iter()
        .enumerate()
        .map(|(i, l)| (&l.id, i))
        .collect();
    let line_rank = |id: &LineId| rank.get(id).copied().unwrap_or(usize::MAX);

    routes.sort_by(|a, b| {
        line_rank(&a.line)
            .cmp(&line_rank(&b.line))
            .then_with(|| a.line.cmp(&b.line))
    });

    let mut stations = stations;
    stations.sort_by(|a, b| {
        line_rank(&a.line)
            .cmp(&line_rank(&b.line))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.order.cmp(&b.order))
            .then_with(|| a.id.cmp(&b.id))
    });

    Dataset {
        lines,
        routes,
        stations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, ElementId, RawElement, Tags};

    fn registry() -> Registry {
        Registry::from_json(
            "test",
            r##"{"bbox": [0, 0, 1, 1], "lines": [
                {"id": "B", "name": "Blue", "keywords": ["Blue"], "icon": "b.svg"},
                {"id": "A", "name": "Amber", "keywords": ["Amber"]}
            ]}"##,
        )
        .unwrap()
    }

    fn segment(id: i64) -> RawElement {
        RawElement {
            id: ElementId::way(id),
            tags: Tags::new(),
            geometry: ElementGeometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])),
        }
    }

    fn matched(registry: &Registry, index: usize, color: &str) -> MatchedLine {
        MatchedLine {
            spec: registry.lines[index].clone(),
            order: index as u32,
            color: color.into(),
            segments: vec![segment(1), segment(2)],
            combined: MultiLineString::new(vec![]),
        }
    }

    fn station(id: u64, line: &str, order: u32) -> CanonicalStation {
        CanonicalStation {
            id,
            name: format!("S{id}"),
            alternate_names: vec![],
            line: LineId::parse(line).unwrap(),
            order,
            coordinate: Coordinate::new(0.0, 0.0),
        }
    }

    #[test]
    fn metadata_from_matched_lines() {
        let registry = registry();
        let dataset = build_dataset(&registry, &[matched(&registry, 0, "#0039A6")], vec![], &Dataset::default());

        let blue = &dataset.lines[&LineId::parse("B").unwrap()];
        assert_eq!(blue.background_color, "#0039A6");
        assert_eq!(blue.text_color, "#FFFFFF");
        assert_eq!(blue.icon.as_deref(), Some("b.svg"));
        assert_eq!(dataset.routes.len(), 2);
        assert!(dataset.routes.iter().all(|r| r.line.as_str() == "B" && r.name == "Blue"));
    }

    #[test]
    fn unrecomputed_lines_keep_prior_output() {
        let registry = registry();
        let previous = build_dataset(
            &registry,
            &[matched(&registry, 0, "#0039A6"), matched(&registry, 1, "#FFD100")],
            vec![station(1, "B", 0), station(2, "A", 0)],
            &Dataset::default(),
        );

        let next = build_dataset(&registry, &[matched(&registry, 1, "#FFC000")], previous.stations.clone(), &previous);
        assert_eq!(next.lines.len(), 2);
        assert_eq!(next.lines[&LineId::parse("B").unwrap()], previous.lines[&LineId::parse("B").unwrap()]);
        assert_eq!(next.lines[&LineId::parse("A").unwrap()].color, "#FFC000");
        assert_eq!(next.routes.len(), 4);
        assert!(next.routes[..2].iter().all(|r| r.line.as_str() == "B"));
        assert!(next.routes[2..].iter().all(|r| r.color == "#FFC000"));
    }

    #[test]
    fn stations_sorted_by_registry_line_order() {
        let registry = registry();
        let dataset = build_dataset(
            &registry,
            &[],
            vec![station(5, "A", 1), station(3, "Z", 0), station(4, "A", 0), station(9, "B", 0)],
            &Dataset::default(),
        );
        let ids: Vec<u64> = dataset.stations.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![9, 4, 5, 3]);
    }
}
