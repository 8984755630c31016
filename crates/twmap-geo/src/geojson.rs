//! GeoJSON feature collections.

use std::collections::BTreeMap;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};
use twmap_model::RegionGeometry;

use crate::error::{GeometryError, Result};

/// Decode every feature of a validated FeatureCollection.
pub(crate) fn read_feature_collection(
    collection: &Map<String, Value>,
    location: &str,
) -> Result<Vec<RegionGeometry>> {
    let features = collection
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(location, "FeatureCollection without a `features` array"))?;

    features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let properties = feature_properties(feature);
            let shape = match feature.get("geometry") {
                None | Some(Value::Null) => MultiPolygon(Vec::new()),
                Some(geometry) => parse_geometry(geometry, location)?,
            };
            Ok(RegionGeometry::new(index, properties, shape))
        })
        .collect()
}

/// Flatten a feature's `properties` (and `id`) to strings.
pub(crate) fn feature_properties(feature: &Value) -> BTreeMap<String, String> {
    let mut properties: BTreeMap<String, String> = feature
        .get("properties")
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(key, value)| property_text(value).map(|text| (key.clone(), text)))
                .collect()
        })
        .unwrap_or_default();
    if let Some(id) = feature.get("id").and_then(property_text) {
        properties.entry("id".to_string()).or_insert(id);
    }
    properties
}

fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Polygon or MultiPolygon geometry to a `MultiPolygon`.
///
/// Non-areal geometry types decode to an empty shape.
fn parse_geometry(geometry: &Value, location: &str) -> Result<MultiPolygon<f64>> {
    let kind = geometry.get("type").and_then(Value::as_str).unwrap_or("");
    let coordinates = geometry.get("coordinates").and_then(Value::as_array);
    match (kind, coordinates) {
        ("Polygon", Some(rings)) => Ok(MultiPolygon(vec![parse_polygon(rings, location)?])),
        ("MultiPolygon", Some(polygons)) => polygons
            .iter()
            .map(|polygon| {
                let rings = polygon
                    .as_array()
                    .ok_or_else(|| invalid(location, "MultiPolygon member is not an array"))?;
                parse_polygon(rings, location)
            })
            .collect::<Result<Vec<_>>>()
            .map(MultiPolygon),
        ("GeometryCollection", _) => {
            let mut polygons = Vec::new();
            for member in geometry
                .get("geometries")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                polygons.extend(parse_geometry(member, location)?.0);
            }
            Ok(MultiPolygon(polygons))
        }
        ("Polygon" | "MultiPolygon", None) => {
            Err(invalid(location, format!("{kind} without coordinates")))
        }
        _ => {
            tracing::debug!(location, kind, "ignoring non-areal geometry");
            Ok(MultiPolygon(Vec::new()))
        }
    }
}

/// GeoJSON polygon rings: first exterior, rest interiors.
fn parse_polygon(rings: &[Value], location: &str) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| invalid(location, "ring is not an array"))
            .and_then(|coords| parse_ring_coords(coords, location))
    });
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => LineString(Vec::new()),
    };
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse `[[x, y], ...]` into a closed ring.
fn parse_ring_coords(coords: &[Value], location: &str) -> Result<LineString<f64>> {
    let mut points = Vec::with_capacity(coords.len() + 1);
    for pair in coords {
        let pair = pair
            .as_array()
            .filter(|pair| pair.len() >= 2)
            .ok_or_else(|| invalid(location, "position needs two numbers"))?;
        let x = pair[0]
            .as_f64()
            .ok_or_else(|| invalid(location, "x must be a number"))?;
        let y = pair[1]
            .as_f64()
            .ok_or_else(|| invalid(location, "y must be a number"))?;
        points.push(Coord { x, y });
    }
    close_ring(&mut points);
    Ok(LineString(points))
}

pub(crate) fn close_ring(points: &mut Vec<Coord<f64>>) {
    if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied())
        && first != last
    {
        points.push(first);
    }
}

pub(crate) fn invalid(location: &str, message: impl Into<String>) -> GeometryError {
    GeometryError::InvalidGeometry {
        location: location.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_polygon_and_multipolygon_features() {
        let doc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "COUNTYNAME": "臺北市", "COUNTYCODE": 63000 },
                    "geometry": { "type": "Polygon", "coordinates": [[[121.0, 25.0], [121.1, 25.0], [121.1, 25.1]]] }
                },
                {
                    "type": "Feature",
                    "id": "penghu",
                    "properties": { "COUNTYNAME": "澎湖縣" },
                    "geometry": { "type": "MultiPolygon", "coordinates": [
                        [[[119.5, 23.5], [119.6, 23.5], [119.6, 23.6], [119.5, 23.5]]],
                        [[[119.4, 23.2], [119.45, 23.2], [119.45, 23.25]]]
                    ] }
                },
                { "type": "Feature", "properties": { "COUNTYNAME": "無界" }, "geometry": null }
            ]
        }));
        let geometries = read_feature_collection(&doc, "t.json").unwrap();

        assert_eq!(geometries.len(), 3);
        assert_eq!(geometries[0].property("COUNTYNAME"), Some("臺北市"));
        assert_eq!(geometries[0].property("COUNTYCODE"), Some("63000"));
        let ring = geometries[0].shape().0[0].exterior();
        assert_eq!(ring.0.first(), ring.0.last());
        assert_eq!(geometries[1].shape().0.len(), 2);
        assert_eq!(geometries[1].property("id"), Some("penghu"));
        assert!(geometries[2].is_empty());
        assert_eq!(geometries[2].index(), 2);
    }

    #[test]
    fn test_bad_coordinates_rejected() {
        let doc = collection(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Polygon", "coordinates": [[["a", 1.0]]] }
            }]
        }));
        assert!(matches!(
            read_feature_collection(&doc, "t.json"),
            Err(GeometryError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_missing_features_rejected() {
        let doc = collection(json!({ "type": "FeatureCollection" }));
        assert!(read_feature_collection(&doc, "t.json").is_err());
    }
}
