//! Geometry loading with a per-session topology cache.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use twmap_ingest::{Fetched, Fetcher, SourceLocation};
use twmap_model::RegionGeometry;

use crate::error::Result;
use crate::geojson::read_feature_collection;
use crate::name::NameField;
use crate::payload::{GeoPayload, validate_payload};
use crate::topology::{read_topology_object, select_object};

/// Where boundary geometry comes from and how to read its names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometrySource {
    pub location: SourceLocation,
    /// Topology object to decode; optional when the topology has exactly one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default)]
    pub name: NameField,
}

impl GeometrySource {
    pub fn new(location: impl Into<SourceLocation>) -> Self {
        Self {
            location: location.into(),
            object: None,
            name: NameField::default(),
        }
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: NameField) -> Self {
        self.name = name;
        self
    }
}

/// Cache key: payload digest plus the decoded object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopologyKey {
    pub digest: String,
    pub object: String,
}

/// Loads geometry sources, reconstructing each topology object once.
#[derive(Debug)]
pub struct GeometryResolver {
    fetcher: Fetcher,
    cache: HashMap<TopologyKey, Arc<[RegionGeometry]>>,
}

impl GeometryResolver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
        }
    }

    /// Fetch, validate and decode `source`.
    pub async fn load_geometry(&mut self, source: &GeometrySource) -> Result<Arc<[RegionGeometry]>> {
        let fetched = self.fetcher.fetch(&source.location).await?;
        self.resolve(source, &fetched)
    }

    /// Validate and decode an already fetched payload.
    pub fn resolve(
        &mut self,
        source: &GeometrySource,
        fetched: &Fetched,
    ) -> Result<Arc<[RegionGeometry]>> {
        let location = fetched.location.to_string();
        let payload = validate_payload(fetched)?;
        let (object, body) = match &payload {
            GeoPayload::FeatureCollection(body) => ("features".to_string(), body),
            GeoPayload::Topology(body) => (
                select_object(body, source.object.as_deref(), &location)?,
                body,
            ),
        };

        let key = TopologyKey {
            digest: sha256_hex(&fetched.bytes),
            object,
        };
        if let Some(cached) = self.cache.get(&key) {
            debug!(location = %location, object = %key.object, "geometry cache hit");
            return Ok(Arc::clone(cached));
        }

        let geometries: Arc<[RegionGeometry]> = match &payload {
            GeoPayload::FeatureCollection(_) => read_feature_collection(body, &location)?,
            GeoPayload::Topology(_) => read_topology_object(body, &key.object, &location)?,
        }
        .into();
        info!(
            location = %location,
            object = %key.object,
            features = geometries.len(),
            "geometry resolved"
        );
        self.cache.insert(key, Arc::clone(&geometries));
        Ok(geometries)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPOLOGY: &str = r#"{
        "type": "Topology",
        "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]],
        "objects": { "layer1": { "type": "GeometryCollection", "geometries": [
            { "type": "Polygon", "arcs": [[0]], "properties": { "COUNTYNAME": "金門縣" } }
        ] } }
    }"#;

    fn fetched(body: &str) -> Fetched {
        Fetched {
            location: SourceLocation::parse("taiwan.json"),
            bytes: body.as_bytes().to_vec(),
            content_type: Some("application/json".to_string()),
        }
    }

    #[test]
    fn test_topology_decoded_once() {
        let mut resolver = GeometryResolver::new(Fetcher::new().unwrap());
        let source = GeometrySource::new("taiwan.json").with_object("layer1");

        let first = resolver.resolve(&source, &fetched(TOPOLOGY)).unwrap();
        let second = resolver.resolve(&source, &fetched(TOPOLOGY)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cached(), 1);
        assert_eq!(first[0].property("COUNTYNAME"), Some("金門縣"));
    }

    #[test]
    fn test_source_from_toml() {
        let source: GeometrySource = toml::from_str(
            r#"
            location = "https://example.org/taiwan.json"
            object = "layer1"
            name = { property = "COUNTYNAME" }
            "#,
        )
        .unwrap();
        assert!(source.location.is_remote());
        assert_eq!(source.object.as_deref(), Some("layer1"));
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
