//! Metric geometry on WGS84 coordinates.
//!
//! Point-to-line distances are measured in a local tangent plane centred on
//! the query point (equirectangular, accurate to well under a metre at the
//! few-hundred-metre scale the station threshold works at), using geo's
//! planar locate and distance algorithms on the projected parts. Positions along
//! a line are cumulative haversine lengths, which do not depend on the
//! query point and so stay comparable between stations.

use std::collections::VecDeque;

use geo::{Distance, Euclidean, Haversine, LineInterpolatePoint, LineLocatePoint};
use geo_types::{Coord, LineString, MultiLineString, Point};

use crate::domain::Coordinate;

/// Mean earth radius in metres, as used by `geo`'s haversine.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Local Tangent Plane projection centred at `(lon0, lat0)`.
///
/// x = R * cos(lat0) * dlon, y = R * dlat
#[derive(Debug, Clone, Copy)]
pub struct LocalTangentPlane {
    origin_lon_rad: f64,
    origin_lat_rad: f64,
    cos_lat0: f64,
}

impl LocalTangentPlane {
    pub fn new(lon0: f64, lat0: f64) -> Self {
        let origin_lat_rad = lat0.to_radians();
        Self {
            origin_lon_rad: lon0.to_radians(),
            origin_lat_rad,
            cos_lat0: origin_lat_rad.cos(),
        }
    }

    pub fn centred_on(c: Coordinate) -> Self {
        Self::new(c.lon, c.lat)
    }

    /// Project `(lon, lat)` to `(x, y)` metres.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let dlon = lon.to_radians() - self.origin_lon_rad;
        let dlat = lat.to_radians() - self.origin_lat_rad;
        (EARTH_RADIUS_M * self.cos_lat0 * dlon, EARTH_RADIUS_M * dlat)
    }

    /// Unproject `(x, y)` metres to `(lon, lat)`.
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.origin_lon_rad + x / (EARTH_RADIUS_M * self.cos_lat0);
        let lat = self.origin_lat_rad + y / EARTH_RADIUS_M;
        (lon.to_degrees(), lat.to_degrees())
    }

    fn project_coord(&self, c: Coord<f64>) -> (f64, f64) {
        self.project(c.x, c.y)
    }
}

/// Nearest point of one line part to the plane origin.
///
/// The part is projected into `plane` and handed to geo's locate and
/// interpolate algorithms. Returns `(distance, fraction)`, where `fraction`
/// is the position along the part in `[0, 1]`.
fn nearest_on_part(plane: &LocalTangentPlane, part: &LineString<f64>) -> Option<(f64, f64)> {
    let origin = Point::new(0.0, 0.0);
    let projected: LineString<f64> = part
        .0
        .iter()
        .map(|&c| {
            let (x, y) = plane.project_coord(c);
            Coord { x, y }
        })
        .collect();

    match projected.0.as_slice() {
        [] => None,
        [only] => Some((Euclidean.distance(origin, Point::from(*only)), 0.0)),
        _ => {
            let fraction = projected.line_locate_point(&origin)?;
            let nearest = projected.line_interpolate_point(fraction)?;
            Some((Euclidean.distance(origin, nearest), fraction))
        }
    }
}

/// Haversine distance between two coordinates in metres.
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Minimum distance in metres from `point` to any segment of `line`.
///
/// Returns `None` for a line without coordinates.
pub fn distance_to_line(point: Coordinate, line: &MultiLineString<f64>) -> Option<f64> {
    let plane = LocalTangentPlane::centred_on(point);
    line.0
        .iter()
        .filter_map(|part| nearest_on_part(&plane, part))
        .map(|(d, _)| d)
        .reduce(f64::min)
}

/// Distance along `line` in metres of the point on it nearest to `point`.
///
/// Parts are walked in order and their lengths accumulate, so the value is a
/// position along the whole multi-geometry. When two parts are equally
/// near, the earlier one wins.
pub fn project_onto_line(point: Coordinate, line: &MultiLineString<f64>) -> Option<f64> {
    let plane = LocalTangentPlane::centred_on(point);
    let mut best: Option<(f64, f64)> = None; // (distance, along)
    let mut walked = 0.0;

    for part in &line.0 {
        let part_len = part_length_m(part);
        if let Some((d, fraction)) = nearest_on_part(&plane, part)
            && best.is_none_or(|(bd, _)| d < bd)
        {
            best = Some((d, walked + fraction * part_len));
        }
        walked += part_len;
    }

    best.map(|(_, along)| along)
}

fn part_length_m(part: &LineString<f64>) -> f64 {
    part.0.windows(2).map(|seg| haversine_m(seg[0], seg[1])).sum()
}

/// Total haversine length of a multi-line in metres.
pub fn length_m(line: &MultiLineString<f64>) -> f64 {
    line.0.iter().map(part_length_m).sum()
}

fn endpoints(ls: &LineString<f64>) -> Option<(Coord<f64>, Coord<f64>)> {
    Some((*ls.0.first()?, *ls.0.last()?))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ChainEnd {
    Head,
    Tail,
}

/// Chain line parts into one travel direction.
///
/// The first part fixes the direction. The chain then grows at both ends:
/// each step takes the remaining part with an endpoint closest to either
/// chain end, reversing it as needed, and appends it at the tail or
/// prepends it at the head. Ties go to the earlier part and then to the
/// tail, so the result is deterministic for a given input order. Empty
/// parts are dropped.
pub fn chain_parts(parts: Vec<LineString<f64>>) -> MultiLineString<f64> {
    let mut remaining: VecDeque<LineString<f64>> =
        parts.into_iter().filter(|p| !p.0.is_empty()).collect();
    let Some(first) = remaining.pop_front() else {
        return MultiLineString::new(Vec::new());
    };

    let mut chained = VecDeque::from([first]);
    while !remaining.is_empty() {
        let (Some(head), Some(tail)) = (
            chained.front().and_then(|ls| ls.0.first()).copied(),
            chained.back().and_then(|ls| ls.0.last()).copied(),
        ) else {
            break;
        };

        let mut best: Option<(usize, f64, ChainEnd, bool)> = None; // (index, gap, end, reverse)
        for (i, part) in remaining.iter().enumerate() {
            let Some((s, e)) = endpoints(part) else {
                continue;
            };
            let options = [
                (haversine_m(tail, s), ChainEnd::Tail, false),
                (haversine_m(tail, e), ChainEnd::Tail, true),
                (haversine_m(head, e), ChainEnd::Head, false),
                (haversine_m(head, s), ChainEnd::Head, true),
            ];
            for (gap, end, reverse) in options {
                if best.is_none_or(|(_, g, _, _)| gap < g) {
                    best = Some((i, gap, end, reverse));
                }
            }
        }

        let Some((index, _, end, reverse)) = best else {
            break;
        };
        let Some(mut next) = remaining.remove(index) else {
            break;
        };
        if reverse {
            next.0.reverse();
        }
        match end {
            ChainEnd::Head => chained.push_front(next),
            ChainEnd::Tail => chained.push_back(next),
        }
    }

    MultiLineString::new(chained.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Destination;

    /// A coordinate `metres` from `origin` along `bearing` degrees.
    fn offset(origin: Coordinate, bearing: f64, metres: f64) -> Coordinate {
        let p = Haversine.destination(Point::new(origin.lon, origin.lat), bearing, metres);
        Coordinate::new(p.y(), p.x())
    }

    fn line(coords: &[(f64, f64)]) -> LineString<f64> {
        // (lat, lon) pairs for readability
        LineString::from(coords.iter().map(|&(lat, lon)| (lon, lat)).collect::<Vec<_>>())
    }

    #[test]
    fn plane_roundtrip() {
        let plane = LocalTangentPlane::new(-74.0, 40.7);
        let (x, y) = plane.project(-73.99, 40.71);
        let (lon, lat) = plane.unproject(x, y);
        assert!((lon + 73.99).abs() < 1e-9);
        assert!((lat - 40.71).abs() < 1e-9);
    }

    #[test]
    fn distance_north_of_east_west_line() {
        let a = Coordinate::new(40.74, -74.00);
        let b = Coordinate::new(40.74, -73.98);
        let mls = MultiLineString::new(vec![line(&[(a.lat, a.lon), (b.lat, b.lon)])]);

        let mid = Coordinate::new(40.74, -73.99);
        let p = offset(mid, 0.0, 100.0);
        let d = distance_to_line(p, &mls).unwrap();
        assert!((d - 100.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_beyond_endpoint_uses_endpoint() {
        let mls = MultiLineString::new(vec![line(&[(40.74, -74.00), (40.74, -73.99)])]);
        let end = Coordinate::new(40.74, -73.99);
        let p = offset(end, 90.0, 50.0);
        let d = distance_to_line(p, &mls).unwrap();
        assert!((d - 50.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_to_empty_line_is_none() {
        let mls: MultiLineString<f64> = MultiLineString::new(vec![]);
        assert!(distance_to_line(Coordinate::new(0.0, 0.0), &mls).is_none());
        assert!(project_onto_line(Coordinate::new(0.0, 0.0), &mls).is_none());
    }

    #[test]
    fn projection_increases_along_line() {
        let mls = MultiLineString::new(vec![
            line(&[(40.74, -74.00), (40.74, -73.99)]),
            line(&[(40.74, -73.99), (40.74, -73.98)]),
        ]);
        let a = project_onto_line(Coordinate::new(40.7401, -73.998), &mls).unwrap();
        let b = project_onto_line(Coordinate::new(40.7399, -73.991), &mls).unwrap();
        let c = project_onto_line(Coordinate::new(40.7401, -73.985), &mls).unwrap();
        assert!(a < b && b < c, "{a} {b} {c}");
        assert!(c <= length_m(&mls));
    }

    #[test]
    fn chain_reorders_and_reverses_parts() {
        let west = line(&[(40.74, -74.00), (40.74, -73.99)]);
        let east_reversed = line(&[(40.74, -73.97), (40.74, -73.98)]);
        let middle = line(&[(40.74, -73.99), (40.74, -73.98)]);

        let chained = chain_parts(vec![west.clone(), east_reversed, middle.clone()]);
        assert_eq!(chained.0.len(), 3);
        assert_eq!(chained.0[0], west);
        assert_eq!(chained.0[1], middle);
        assert_eq!(chained.0[2], line(&[(40.74, -73.98), (40.74, -73.97)]));
    }

    #[test]
    fn chain_prepends_part_attached_to_start() {
        let first = line(&[(40.74, -73.99), (40.74, -74.00)]);
        let second = line(&[(40.74, -73.99), (40.74, -73.98)]);
        let chained = chain_parts(vec![first.clone(), second]);
        assert_eq!(chained.0[0], line(&[(40.74, -73.98), (40.74, -73.99)]));
        assert_eq!(chained.0[1], first);
    }

    #[test]
    fn chain_grows_from_a_middle_part() {
        let south = line(&[(40.70, -74.0), (40.72, -74.0)]);
        let middle = line(&[(40.72, -74.0), (40.74, -74.0)]);
        let north = line(&[(40.74, -74.0), (40.76, -74.0)]);

        let chained = chain_parts(vec![middle.clone(), south.clone(), north.clone()]);
        assert_eq!(chained.0, vec![south, middle, north]);

        let along: Vec<f64> = [40.71, 40.73, 40.75]
            .iter()
            .map(|&lat| project_onto_line(Coordinate::new(lat, -74.0), &chained).unwrap())
            .collect();
        assert!(along[0] < along[1] && along[1] < along[2], "{along:?}");
    }

    #[test]
    fn chain_drops_empty_parts() {
        let chained = chain_parts(vec![LineString::new(vec![]), line(&[(0.0, 0.0), (0.0, 1.0)])]);
        assert_eq!(chained.0.len(), 1);
        assert!(chain_parts(vec![]).0.is_empty());
    }
}
