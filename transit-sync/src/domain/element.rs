//! Raw tagged elements from the geographic data source.

use std::collections::BTreeMap;
use std::fmt;

use geo_types::{LineString, MultiLineString, Point};

use super::Coordinate;

/// OSM element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// An OSM element reference, e.g. `way/1234`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    pub kind: ElementKind,
    pub id: i64,
}

impl ElementId {
    pub fn node(id: i64) -> Self {
        Self {
            kind: ElementKind::Node,
            id,
        }
    }

    pub fn way(id: i64) -> Self {
        Self {
            kind: ElementKind::Way,
            id,
        }
    }

    pub fn relation(id: i64) -> Self {
        Self {
            kind: ElementKind::Relation,
            id,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.id)
    }
}

/// Free-form element tags.
///
/// Any tag may be absent; the accessors never fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// True when `key` is present with exactly `value`.
    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    pub fn any_value<'a, I: IntoIterator<Item = &'a str>>(&self, key: &str, values: I) -> bool {
        match self.get(key) {
            Some(v) => values.into_iter().any(|candidate| candidate == v),
            None => false,
        }
    }

    /// Tags whose key starts with `prefix`, in key order.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Geometry of a raw element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementGeometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    MultiLineString(MultiLineString<f64>),
}

/// A tagged geometric primitive, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub id: ElementId,
    pub tags: Tags,
    pub geometry: ElementGeometry,
}

impl RawElement {
    pub fn is_point(&self) -> bool {
        matches!(self.geometry, ElementGeometry::Point(_))
    }

    pub fn is_line_shaped(&self) -> bool {
        matches!(
            self.geometry,
            ElementGeometry::LineString(_) | ElementGeometry::MultiLineString(_)
        )
    }

    /// Coordinate of a point element.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match &self.geometry {
            ElementGeometry::Point(p) => Some(Coordinate::new(p.y(), p.x())),
            _ => None,
        }
    }

    /// Line parts of a line-shaped element.
    pub fn line_parts(&self) -> Vec<&LineString<f64>> {
        match &self.geometry {
            ElementGeometry::Point(_) => Vec::new(),
            ElementGeometry::LineString(ls) => vec![ls],
            ElementGeometry::MultiLineString(mls) => mls.0.iter().collect(),
        }
    }
}
