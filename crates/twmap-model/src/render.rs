//! Render-ready join results handed to the render sink.

#![deny(unsafe_code)]

use serde::Serialize;

use crate::filter::FilterSelection;
use crate::geometry::RegionGeometry;
use crate::ids::CanonicalRegionId;
use crate::stat::{ColorDomain, Summary};

/// Color assignment for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ColorKey {
    /// No observation backs this region under the current selection.
    NoData,
    /// Position on a sequential ramp, in `[0, 1]`.
    Ramp(f64),
    /// Class index on a stepped (threshold) scale.
    Class(usize),
}

impl ColorKey {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

/// One geometry joined with its value. Borrowed from the session; never stored.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFeature<'a> {
    #[serde(skip)]
    pub geometry: &'a RegionGeometry,
    pub index: usize,
    /// Display name as the geometry source spells it.
    pub name: String,
    pub region: CanonicalRegionId,
    pub value: Option<f64>,
    pub color: ColorKey,
}

/// Everything the render sink needs for one filter state.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame<'a> {
    pub selection: FilterSelection,
    pub domain: ColorDomain,
    pub summary: Summary,
    pub features: Vec<RenderFeature<'a>>,
}

impl RenderFrame<'_> {
    pub fn with_data(&self) -> usize {
        self.features
            .iter()
            .filter(|feature| feature.value.is_some())
            .count()
    }
}
