//! WGS84 coordinates and bounding boxes.

use std::fmt;

use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};

/// Decimal places kept for published coordinates (~1 cm).
const COORD_PRECISION: f64 = 1e7;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Round to the published precision.
    ///
    /// Every coordinate written to an artifact goes through this, so a
    /// reloaded artifact compares equal to the value that produced it.
    pub fn rounded(self) -> Self {
        Self {
            lat: round(self.lat),
            lon: round(self.lon),
        }
    }

    /// Position in GeoJSON axis order (`[lon, lat]`).
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }

    /// Read a GeoJSON position (`[lon, lat, ...]`).
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] => Some(Self::new(*lat, *lon)),
            _ => None,
        }
    }
}

fn round(v: f64) -> f64 {
    (v * COORD_PRECISION).round() / COORD_PRECISION
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Coord { x: c.lon, y: c.lat }
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(c: Coord<f64>) -> Self {
        Coordinate::new(c.y, c.x)
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lon, c.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.7},{:.7}", self.lat, self.lon)
    }
}

/// Error returned for a malformed bounding box.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid bounding box: {reason}")]
pub struct InvalidBoundingBox {
    reason: &'static str,
}

/// A south/west/north/east bounding box.
///
/// Serialized as `[south, west, north, east]`, the order Overpass uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, InvalidBoundingBox> {
        let values = [south, west, north, east];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(InvalidBoundingBox {
                reason: "values must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err(InvalidBoundingBox {
                reason: "latitudes must be within [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(InvalidBoundingBox {
                reason: "longitudes must be within [-180, 180]",
            });
        }
        if south >= north {
            return Err(InvalidBoundingBox {
                reason: "south must be less than north",
            });
        }
        if west >= east {
            return Err(InvalidBoundingBox {
                reason: "west must be less than east",
            });
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        (self.south..=self.north).contains(&c.lat) && (self.west..=self.east).contains(&c.lon)
    }

    /// Overpass `S,W,N,E` form with fixed precision.
    pub fn to_overpass(&self) -> String {
        format!(
            "{:.7},{:.7},{:.7},{:.7}",
            self.south, self.west, self.north, self.east
        )
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = InvalidBoundingBox;

    fn try_from(v: [f64; 4]) -> Result<Self, Self::Error> {
        BoundingBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.south, b.west, b.north, b.east]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_stable() {
        let c = Coordinate::new(40.712_345_678_9, -74.001_234_567_1).rounded();
        assert_eq!(c, c.rounded());
        assert_eq!(c.lat, 40.712_345_7);
    }

    #[test]
    fn position_axis_order() {
        let c = Coordinate::new(40.7, -74.0);
        assert_eq!(c.to_position(), vec![-74.0, 40.7]);
        assert_eq!(Coordinate::from_position(&[-74.0, 40.7]), Some(c));
        assert_eq!(Coordinate::from_position(&[1.0]), None);
    }

    #[test]
    fn bbox_parses_from_array() {
        let b: BoundingBox = serde_json::from_str("[40.70,-74.02,40.78,-73.95]").unwrap();
        assert_eq!(b.south, 40.70);
        assert_eq!(b.east, -73.95);
        assert_eq!(serde_json::to_string(&b).unwrap(), "[40.7,-74.02,40.78,-73.95]");
    }

    #[test]
    fn bbox_rejects_inverted() {
        assert!(BoundingBox::new(40.78, -74.02, 40.70, -73.95).is_err());
        assert!(BoundingBox::new(40.70, -73.95, 40.78, -74.02).is_err());
        assert!(BoundingBox::new(91.0, 0.0, 92.0, 1.0).is_err());
        assert!(serde_json::from_str::<BoundingBox>("[1,2,0,3]").is_err());
    }

    #[test]
    fn bbox_overpass_format() {
        let b = BoundingBox::new(40.70, -74.02, 40.78, -73.95).unwrap();
        assert_eq!(
            b.to_overpass(),
            "40.7000000,-74.0200000,40.7800000,-73.9500000"
        );
        assert!(b.contains(Coordinate::new(40.75, -74.0)));
        assert!(!b.contains(Coordinate::new(40.80, -74.0)));
    }
}
