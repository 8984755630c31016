//! Display-name extraction, one adapter per geometry-source shape.

use serde::{Deserialize, Serialize};
use twmap_model::RegionGeometry;

/// Reads the display name a geometry source gives a feature.
pub trait DisplayNameAdapter: Send + Sync {
    /// The feature's name as the source spells it, unnormalized.
    fn display_name(&self, geometry: &RegionGeometry) -> Option<String>;
}

/// Name held in a single property (`COUNTYNAME`, `name`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyName {
    key: String,
}

impl PropertyName {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl DisplayNameAdapter for PropertyName {
    fn display_name(&self, geometry: &RegionGeometry) -> Option<String> {
        geometry
            .property(&self.key)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// Name split over several properties, e.g. county and town.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatName {
    keys: Vec<String>,
}

impl ConcatName {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }
}

impl DisplayNameAdapter for ConcatName {
    fn display_name(&self, geometry: &RegionGeometry) -> Option<String> {
        let name: String = self
            .keys
            .iter()
            .filter_map(|key| geometry.property(key))
            .map(str::trim)
            .collect();
        (!name.is_empty()).then_some(name)
    }
}

/// Which adapter a geometry source uses, chosen in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameField {
    Property(String),
    Concat(Vec<String>),
}

impl Default for NameField {
    fn default() -> Self {
        Self::Property("COUNTYNAME".to_string())
    }
}

impl NameField {
    pub fn adapter(&self) -> Box<dyn DisplayNameAdapter> {
        match self {
            Self::Property(key) => Box::new(PropertyName::new(key.clone())),
            Self::Concat(keys) => Box::new(ConcatName::new(keys.clone())),
        }
    }
}
