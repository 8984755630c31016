//! TopoJSON decoding.
//!
//! A topology stores each shared boundary once as an arc; polygons list arc
//! indices, with `!i` (bitwise complement, i.e. `-i - 1`) meaning arc `i`
//! reversed. Quantized topologies delta-encode arc positions and carry a
//! `transform` back to coordinates.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use twmap_model::RegionGeometry;

use crate::error::{GeometryError, Result};
use crate::geojson::{close_ring, feature_properties, invalid};

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

/// Arcs decoded to absolute coordinates.
#[derive(Debug, Clone)]
struct Arcs {
    arcs: Vec<Vec<Coord<f64>>>,
}

impl Arcs {
    fn decode(topology: &Map<String, Value>, location: &str) -> Result<Self> {
        let transform: Option<Transform> = match topology.get("transform") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                Transform::deserialize(value)
                    .map_err(|e| invalid(location, format!("bad transform: {e}")))?,
            ),
        };
        let raw = topology
            .get("arcs")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid(location, "Topology without an `arcs` array"))?;

        let mut arcs = Vec::with_capacity(raw.len());
        for arc in raw {
            let positions = arc
                .as_array()
                .ok_or_else(|| invalid(location, "arc is not an array"))?;
            let mut points = Vec::with_capacity(positions.len());
            let (mut x, mut y) = (0.0, 0.0);
            for position in positions {
                let (px, py) = position_pair(position)
                    .ok_or_else(|| invalid(location, "arc position needs two numbers"))?;
                let point = match transform {
                    Some(t) => {
                        x += px;
                        y += py;
                        Coord {
                            x: x * t.scale[0] + t.translate[0],
                            y: y * t.scale[1] + t.translate[1],
                        }
                    }
                    None => Coord { x: px, y: py },
                };
                points.push(point);
            }
            arcs.push(points);
        }
        Ok(Self { arcs })
    }

    /// Stitch arc references into one closed ring. Each arc after the first
    /// starts where the previous one ended, so its first point is dropped.
    fn ring(&self, refs: &[Value], location: &str) -> Result<LineString<f64>> {
        let mut points: Vec<Coord<f64>> = Vec::new();
        for reference in refs {
            let index = reference
                .as_i64()
                .ok_or_else(|| invalid(location, "arc reference is not an integer"))?;
            let (arc_idx, reversed) = if index < 0 { (!index, true) } else { (index, false) };
            let arc = usize::try_from(arc_idx)
                .ok()
                .and_then(|idx| self.arcs.get(idx))
                .ok_or_else(|| GeometryError::ArcIndex {
                    location: location.to_string(),
                    index,
                })?;
            let skip = usize::from(!points.is_empty());
            if reversed {
                points.extend(arc.iter().rev().skip(skip).copied());
            } else {
                points.extend(arc.iter().skip(skip).copied());
            }
        }
        close_ring(&mut points);
        Ok(LineString(points))
    }

    fn polygon(&self, rings: &[Value], location: &str) -> Result<Polygon<f64>> {
        let mut decoded = rings.iter().map(|ring| {
            ring.as_array()
                .ok_or_else(|| invalid(location, "polygon ring is not an array"))
                .and_then(|refs| self.ring(refs, location))
        });
        let exterior = match decoded.next() {
            Some(ring) => ring?,
            None => LineString(Vec::new()),
        };
        let interiors = decoded.collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }

    fn shape(&self, geometry: &Value, location: &str) -> Result<MultiPolygon<f64>> {
        let kind = geometry.get("type").and_then(Value::as_str).unwrap_or("");
        let arcs = geometry.get("arcs").and_then(Value::as_array);
        match (kind, arcs) {
            ("Polygon", Some(rings)) => Ok(MultiPolygon(vec![self.polygon(rings, location)?])),
            ("MultiPolygon", Some(polygons)) => polygons
                .iter()
                .map(|polygon| {
                    let rings = polygon
                        .as_array()
                        .ok_or_else(|| invalid(location, "MultiPolygon member is not an array"))?;
                    self.polygon(rings, location)
                })
                .collect::<Result<Vec<_>>>()
                .map(MultiPolygon),
            ("Polygon" | "MultiPolygon", None) => {
                Err(invalid(location, format!("{kind} without arcs")))
            }
            // Null geometries have no `type`; keep the feature with no shape.
            _ => Ok(MultiPolygon(Vec::new())),
        }
    }
}

fn position_pair(position: &Value) -> Option<(f64, f64)> {
    let pair = position.as_array()?;
    Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
}

/// Names of the topology's objects.
pub(crate) fn object_names(topology: &Map<String, Value>) -> Vec<String> {
    topology
        .get("objects")
        .and_then(Value::as_object)
        .map(|objects| objects.keys().cloned().collect())
        .unwrap_or_default()
}

/// The object to decode: `requested`, or the only object when none is named.
pub(crate) fn select_object(
    topology: &Map<String, Value>,
    requested: Option<&str>,
    location: &str,
) -> Result<String> {
    let available = object_names(topology);
    match requested {
        Some(name) if available.iter().any(|a| a == name) => Ok(name.to_string()),
        None if available.len() == 1 => Ok(available[0].clone()),
        _ => Err(GeometryError::UnknownObject {
            location: location.to_string(),
            object: requested.unwrap_or("<unspecified>").to_string(),
            available,
        }),
    }
}

/// Reconstruct one topology object into per-feature polygons.
pub(crate) fn read_topology_object(
    topology: &Map<String, Value>,
    object: &str,
    location: &str,
) -> Result<Vec<RegionGeometry>> {
    let value = topology
        .get("objects")
        .and_then(|objects| objects.get(object))
        .ok_or_else(|| GeometryError::UnknownObject {
            location: location.to_string(),
            object: object.to_string(),
            available: object_names(topology),
        })?;
    let arcs = Arcs::decode(topology, location)?;

    let members: Vec<&Value> = match value.get("type").and_then(Value::as_str) {
        Some("GeometryCollection") => value
            .get("geometries")
            .and_then(Value::as_array)
            .map(|geometries| geometries.iter().collect())
            .unwrap_or_default(),
        _ => vec![value],
    };

    members
        .into_iter()
        .enumerate()
        .map(|(index, geometry)| {
            let shape = arcs.shape(geometry, location)?;
            Ok(RegionGeometry::new(index, feature_properties(geometry), shape))
        })
        .collect()
}
