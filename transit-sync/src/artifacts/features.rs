//! GeoJSON encoding of routes and stations.
//!
//! Coordinates are written in `[lon, lat]` order and rounded to the
//! published precision, so encoding a decoded collection is lossless.

use geo_types::{Coord, LineString, MultiLineString};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::domain::{CanonicalStation, Coordinate, LineId};

use super::error::ArtifactError;
use super::model::{RouteFeature, RouteGeometry};

#[derive(Debug, Serialize, Deserialize)]
struct RouteProperties {
    line: LineId,
    name: String,
    color: String,
    order: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct StationProperties {
    id: u64,
    name: String,
    #[serde(default)]
    alternate_names: Vec<String>,
    line: LineId,
    order: u32,
}

fn positions(ls: &LineString<f64>) -> Vec<Vec<f64>> {
    ls.0.iter()
        .map(|&c| Coordinate::from(c).rounded().to_position())
        .collect()
}

fn line_string(positions: &[Vec<f64>]) -> LineString<f64> {
    LineString::new(
        positions
            .iter()
            .filter_map(|p| Coordinate::from_position(p))
            .map(Coord::from)
            .collect(),
    )
}

fn properties<T: Serialize>(props: &T) -> Result<JsonObject, ArtifactError> {
    match serde_json::to_value(props)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(ArtifactError::invalid(
            "feature properties",
            format!("expected an object, got {other}"),
        )),
    }
}

fn read_properties<T: DeserializeOwned>(feature: &Feature, what: &'static str) -> Result<T, ArtifactError> {
    let props = feature
        .properties
        .clone()
        .ok_or_else(|| ArtifactError::invalid(what, "missing properties"))?;
    serde_json::from_value(JsonValue::Object(props))
        .map_err(|e| ArtifactError::invalid(what, e.to_string()))
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Wrap features in a collection.
pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn route_to_feature(route: &RouteFeature) -> Result<Feature, ArtifactError> {
    let value = match &route.geometry {
        RouteGeometry::LineString(ls) => Value::LineString(positions(ls)),
        RouteGeometry::MultiLineString(mls) => {
            Value::MultiLineString(mls.0.iter().map(positions).collect())
        }
    };
    let props = properties(&RouteProperties {
        line: route.line.clone(),
        name: route.name.clone(),
        color: route.color.clone(),
        order: route.order,
    })?;
    Ok(feature(value, props))
}

pub fn station_to_feature(station: &CanonicalStation) -> Result<Feature, ArtifactError> {
    let props = properties(&StationProperties {
        id: station.id,
        name: station.name.clone(),
        alternate_names: station.alternate_names.clone(),
        line: station.line.clone(),
        order: station.order,
    })?;
    Ok(feature(
        Value::Point(station.coordinate.rounded().to_position()),
        props,
    ))
}

fn geometry_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

pub fn route_from_feature(feature: &Feature) -> Result<RouteFeature, ArtifactError> {
    const WHAT: &str = "route feature";
    let props: RouteProperties = read_properties(feature, WHAT)?;
    let geometry = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::LineString(ps)) => RouteGeometry::LineString(line_string(ps)),
        Some(Value::MultiLineString(parts)) => RouteGeometry::MultiLineString(MultiLineString::new(
            parts.iter().map(|ps| line_string(ps)).collect(),
        )),
        Some(other) => {
            return Err(ArtifactError::invalid(
                WHAT,
                format!("unexpected {} geometry", geometry_name(other)),
            ));
        }
        None => return Err(ArtifactError::invalid(WHAT, "missing geometry")),
    };
    Ok(RouteFeature {
        line: props.line,
        name: props.name,
        color: props.color,
        order: props.order,
        geometry,
    })
}

pub fn station_from_feature(feature: &Feature) -> Result<CanonicalStation, ArtifactError> {
    const WHAT: &str = "station feature";
    let props: StationProperties = read_properties(feature, WHAT)?;
    let coordinate = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(position)) => Coordinate::from_position(position)
            .ok_or_else(|| ArtifactError::invalid(WHAT, "short position"))?,
        _ => return Err(ArtifactError::invalid(WHAT, "expected a Point geometry")),
    };
    Ok(CanonicalStation {
        id: props.id,
        name: props.name,
        alternate_names: props.alternate_names,
        line: props.line,
        order: props.order,
        coordinate,
    })
}

/// Parse a GeoJSON document that must be a FeatureCollection.
pub fn parse_collection(text: &str) -> Result<FeatureCollection, ArtifactError> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(ArtifactError::invalid(
            "feature collection",
            "document is not a FeatureCollection",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> CanonicalStation {
        CanonicalStation {
            id: 7,
            name: "Elm St".into(),
            alternate_names: vec!["Calle Olmo".into()],
            line: LineId::parse("L1").unwrap(),
            order: 2,
            coordinate: Coordinate::new(40.712_345_678_9, -74.000_000_01),
        }
    }

    #[test]
    fn station_feature_shape() {
        let feature = station_to_feature(&station()).unwrap();
        let json = serde_json::to_value(&feature).unwrap();

        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["geometry"]["coordinates"][0], -74.0);
        assert_eq!(json["geometry"]["coordinates"][1], 40.7123457);
        assert_eq!(json["properties"]["id"], 7);
        assert_eq!(json["properties"]["line"], "L1");
        assert_eq!(json["properties"]["order"], 2);
        assert_eq!(json["properties"]["alternate_names"][0], "Calle Olmo");
    }

    #[test]
    fn station_survives_reload_at_published_precision() {
        let original = station();
        let feature = station_to_feature(&original).unwrap();
        let text = serde_json::to_string(&collection(vec![feature])).unwrap();

        let fc = parse_collection(&text).unwrap();
        let reloaded = station_from_feature(&fc.features[0]).unwrap();
        assert_eq!(reloaded.id, 7);
        assert_eq!(reloaded.coordinate, original.coordinate.rounded());
    }

    #[test]
    fn route_feature_shape() {
        let route = RouteFeature {
            line: LineId::parse("L1").unwrap(),
            name: "Red Line".into(),
            color: "#EE352E".into(),
            order: 0,
            geometry: RouteGeometry::MultiLineString(MultiLineString::new(vec![
                LineString::from(vec![(-74.0, 40.7), (-74.0, 40.71)]),
                LineString::from(vec![(-74.0, 40.72), (-74.0, 40.73)]),
            ])),
        };
        let feature = route_to_feature(&route).unwrap();
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["geometry"]["type"], "MultiLineString");
        assert_eq!(json["properties"]["color"], "#EE352E");

        assert_eq!(route_from_feature(&feature).unwrap(), route);
    }

    #[test]
    fn wrong_geometry_is_rejected() {
        let feature = station_to_feature(&station()).unwrap();
        let err = route_from_feature(&feature).unwrap_err();
        assert!(err.to_string().contains("unexpected Point geometry"));
    }

    #[test]
    fn non_collection_is_rejected() {
        let err = parse_collection(r#"{"type": "Point", "coordinates": [0, 0]}"#).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid { .. }));
    }
}
