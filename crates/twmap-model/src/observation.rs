#![deny(unsafe_code)]

use serde::Serialize;

use crate::filter::FilterKey;
use crate::ids::CanonicalRegionId;

/// One fact: a value for a region under a filter key.
///
/// Built by ingestion and reshaping; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    region: CanonicalRegionId,
    key: FilterKey,
    value: f64,
}

impl Observation {
    pub fn new(region: CanonicalRegionId, key: FilterKey, value: f64) -> Self {
        Self { region, key, value }
    }

    pub fn region(&self) -> &CanonicalRegionId {
        &self.region
    }

    pub fn key(&self) -> &FilterKey {
        &self.key
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
