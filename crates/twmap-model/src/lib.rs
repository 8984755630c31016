//! Core data model for the choropleth pipeline.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - **ids**: [`CanonicalRegionId`], the normalized key shared by tabular and geometry sources
//! - **filter**: [`Dimension`], [`FilterKey`] and [`FilterSelection`]
//! - **observation**: [`Observation`], one immutable fact
//! - **stat**: [`Reducer`], [`AggregatedStat`], [`ColorDomain`] and [`Summary`]
//! - **geometry**: [`RegionGeometry`], boundary polygons plus source-native properties
//! - **render**: [`ColorKey`], [`RenderFeature`] and [`RenderFrame`]

pub mod error;
pub mod filter;
pub mod geometry;
pub mod ids;
pub mod observation;
pub mod render;
pub mod stat;

pub use error::{ModelError, Result};
pub use filter::{Dimension, FilterKey, FilterSelection};
pub use geometry::RegionGeometry;
pub use ids::CanonicalRegionId;
pub use observation::Observation;
pub use render::{ColorKey, RenderFeature, RenderFrame};
pub use stat::{AggregatedStat, ColorDomain, Reducer, Summary};
