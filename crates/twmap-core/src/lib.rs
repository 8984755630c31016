//! Choropleth pipeline for Taiwan administrative regions.
//!
//! Ties the component crates together: a [`PipelineConfig`] read from TOML
//! describes the geometry and tabular sources, a [`Session`] loads them
//! concurrently, and [`Session::on_filter_changed`] turns each filter
//! selection into a [`RenderFrame`](twmap_model::RenderFrame) for a
//! [`RenderSink`].
//!
//! # State machine
//!
//! `Uninitialized → Loading → Ready`. Loading tolerates any subset of tabular
//! sources failing but not the geometry. Each filter change is a synchronous
//! render pass over the `Ready` data and never changes the state.
//!
//! # Example
//!
//! ```ignore
//! use twmap_core::{PipelineConfig, Session};
//!
//! let config = PipelineConfig::from_path(Path::new("twmap.toml"))?;
//! let mut session = Session::new(config)?;
//! session.load().await?;
//! let selection = session.default_selection()?.unwrap_or_default();
//! let frame = session.on_filter_changed(&selection)?;
//! ```

mod binder;
mod color;
mod config;
mod error;
mod pivot;
mod session;
mod sink;

// === Error Types ===
pub use error::{PipelineError, Result};

// === Configuration ===
pub use color::ColorScale;
pub use config::{AggregateConfig, ColorConfig, PipelineConfig, SourceConfig, SourcePlan};

// === Session ===
pub use session::{Dataset, Session, SessionState, SourceSummary};

// === Binding and Output ===
pub use binder::ChoroplethBinder;
pub use pivot::{PivotSummary, PivotValue};
pub use sink::{JsonSink, RenderSink};

// Re-exported so callers need only this crate.
pub use twmap_aggregate::{DomainStrategy, FilterCatalog};
pub use twmap_ingest::SourceReport;
pub use twmap_model::{
    ColorDomain, ColorKey, Dimension, FilterKey, FilterSelection, Reducer, RenderFeature,
    RenderFrame, Summary,
};
