//! Overpass JSON response types and conversion to raw elements.

use std::collections::BTreeMap;

use geo_types::{Coord, LineString, MultiLineString, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ElementGeometry, ElementId, RawElement, Tags};

use super::error::FetchError;

/// Top-level Overpass JSON response.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
    /// Set when the server hit a runtime error (timeout, memory) mid-query.
    #[serde(default)]
    pub remark: Option<String>,
}

/// A `{lat, lon}` pair as Overpass returns it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl From<LatLon> for Coord<f64> {
    fn from(p: LatLon) -> Self {
        Coord { x: p.lon, y: p.lat }
    }
}

/// Member of a relation, with inline geometry when queried with `out geom`.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassMember {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "ref")]
    pub member_ref: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Option<Vec<Option<LatLon>>>,
}

/// One element of an Overpass response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverpassElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: i64,
        /// Entries are `null` for nodes outside the bbox on clipped output.
        #[serde(default)]
        geometry: Vec<Option<LatLon>>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<OverpassMember>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    /// `area`, `count` and other element types are ignored.
    #[serde(other)]
    Other,
}

/// Split a possibly-gapped geometry into contiguous runs of at least two points.
fn contiguous_runs(points: &[Option<LatLon>]) -> Vec<LineString<f64>> {
    points
        .split(|p| p.is_none())
        .filter(|run| run.len() >= 2)
        .map(|run| LineString::new(run.iter().flatten().map(|&p| Coord::from(p)).collect()))
        .collect()
}

impl OverpassElement {
    /// Convert to a raw element; `None` for elements without usable geometry.
    pub fn into_raw(self) -> Option<RawElement> {
        match self {
            OverpassElement::Node { id, lat, lon, tags } => Some(RawElement {
                id: ElementId::node(id),
                tags: tags.into_iter().collect::<Tags>(),
                geometry: ElementGeometry::Point(Point::new(lon, lat)),
            }),
            OverpassElement::Way { id, geometry, tags } => {
                let mut runs = contiguous_runs(&geometry);
                let geometry = match runs.len() {
                    0 => return None,
                    1 => ElementGeometry::LineString(runs.remove(0)),
                    _ => ElementGeometry::MultiLineString(MultiLineString::new(runs)),
                };
                Some(RawElement {
                    id: ElementId::way(id),
                    tags: tags.into_iter().collect::<Tags>(),
                    geometry,
                })
            }
            OverpassElement::Relation { id, members, tags } => {
                let parts: Vec<LineString<f64>> = members
                    .iter()
                    .filter(|m| m.kind == "way")
                    .filter(|m| !matches!(m.role.as_str(), "platform" | "stop" | "station"))
                    .filter_map(|m| m.geometry.as_deref())
                    .flat_map(contiguous_runs)
                    .collect();
                if parts.is_empty() {
                    return None;
                }
                Some(RawElement {
                    id: ElementId::relation(id),
                    tags: tags.into_iter().collect::<Tags>(),
                    geometry: ElementGeometry::MultiLineString(MultiLineString::new(parts)),
                })
            }
            OverpassElement::Other => None,
        }
    }
}

/// Parse an Overpass JSON body into raw elements, keeping response order.
pub fn parse_response(body: &str) -> Result<Vec<RawElement>, FetchError> {
    let response: OverpassResponse = serde_json::from_str(body).map_err(|e| FetchError::Json {
        message: e.to_string(),
    })?;

    if let Some(remark) = response.remark.filter(|r| r.contains("error")) {
        return Err(FetchError::Remark(remark));
    }

    let total = response.elements.len();
    let elements: Vec<RawElement> = response
        .elements
        .into_iter()
        .filter_map(OverpassElement::into_raw)
        .collect();

    debug!(total, usable = elements.len(), "Parsed Overpass response");
    Ok(elements)
}
