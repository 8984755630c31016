#![deny(unsafe_code)]

use std::collections::BTreeMap;

use geo::MultiPolygon;

/// Boundary of one feature from a geometry source.
///
/// Carries the source's own properties untouched; which property holds the
/// display name depends on the source and is decided by a name adapter at
/// join time.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    index: usize,
    properties: BTreeMap<String, String>,
    shape: MultiPolygon<f64>,
}

impl RegionGeometry {
    pub fn new(index: usize, properties: BTreeMap<String, String>, shape: MultiPolygon<f64>) -> Self {
        Self {
            index,
            properties,
            shape,
        }
    }

    /// Position of the feature within its source collection.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// True when the source supplied no polygon (null geometry).
    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty()
    }
}
