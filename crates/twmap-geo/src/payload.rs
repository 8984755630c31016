//! Structural validation of a fetched geometry payload.

use serde_json::{Map, Value};
use twmap_ingest::Fetched;

use crate::error::{GeometryError, Result};

/// A payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoPayload {
    FeatureCollection(Map<String, Value>),
    Topology(Map<String, Value>),
}

/// Check content type, JSON syntax and top-level `type` before any decoding.
///
/// A missing content type is accepted; a present one must mention JSON
/// (`application/json`, `application/geo+json`, `text/json`, ...).
pub fn validate_payload(fetched: &Fetched) -> Result<GeoPayload> {
    let location = fetched.location.to_string();
    if let Some(content_type) = &fetched.content_type
        && !content_type.to_ascii_lowercase().contains("json")
    {
        return Err(GeometryError::ContentType {
            location,
            content_type: content_type.clone(),
        });
    }

    let bytes = fetched
        .bytes
        .strip_prefix(b"\xEF\xBB\xBF")
        .unwrap_or(&fetched.bytes);
    let value: Value = serde_json::from_slice(bytes).map_err(|e| GeometryError::NotJson {
        location: location.clone(),
        message: e.to_string(),
    })?;
    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(GeometryError::NotGeometry {
                location,
                found: json_kind(&other).to_string(),
            });
        }
    };
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);
    match kind.as_deref() {
        Some("FeatureCollection") => Ok(GeoPayload::FeatureCollection(object)),
        Some("Topology") => Ok(GeoPayload::Topology(object)),
        Some(other) => Err(GeometryError::NotGeometry {
            location,
            found: other.to_string(),
        }),
        None => Err(GeometryError::NotGeometry {
            location,
            found: "object without `type`".to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twmap_ingest::SourceLocation;

    fn fetched(body: &str, content_type: Option<&str>) -> Fetched {
        Fetched {
            location: SourceLocation::parse("https://example.org/taiwan.json"),
            bytes: body.as_bytes().to_vec(),
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn test_topology_accepted() {
        let payload = validate_payload(&fetched(
            r#"{"type":"Topology","arcs":[],"objects":{}}"#,
            Some("application/json; charset=utf-8"),
        ))
        .unwrap();
        assert!(matches!(payload, GeoPayload::Topology(_)));
    }

    #[test]
    fn test_html_error_page_rejected_by_content_type() {
        let result = validate_payload(&fetched(
            "<html><body>404 Not Found</body></html>",
            Some("text/html"),
        ));
        assert!(matches!(result, Err(GeometryError::ContentType { .. })));
    }

    #[test]
    fn test_html_without_content_type_rejected_as_not_json() {
        let result = validate_payload(&fetched("<!DOCTYPE html><p>error</p>", None));
        assert!(matches!(result, Err(GeometryError::NotJson { .. })));
    }

    #[test]
    fn test_json_that_is_not_geometry_rejected() {
        let result = validate_payload(&fetched(r#"{"error":"quota exceeded"}"#, None));
        assert!(matches!(result, Err(GeometryError::NotGeometry { .. })));

        let result = validate_payload(&fetched(r#"{"type":"Feature"}"#, None));
        assert!(matches!(
            result,
            Err(GeometryError::NotGeometry { found, .. }) if found == "Feature"
        ));

        let result = validate_payload(&fetched("[1, 2]", None));
        assert!(matches!(result, Err(GeometryError::NotGeometry { .. })));
    }
}
