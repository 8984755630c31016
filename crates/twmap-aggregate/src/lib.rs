//! Aggregation of observations for one filter selection.
//!
//! [`AggregationEngine`] filters observations by exact [`FilterKey`] match,
//! groups them by region and reduces each group with a [`Reducer`]. Empty
//! groups produce no entry, never a zero. The same pass calibrates the color
//! domain over the selection's calibration scope.
//!
//! [`FilterCatalog`] lists the dimension values present in the data and
//! answers whether a selection is backed by any observation.
//!
//! [`FilterKey`]: twmap_model::FilterKey
//! [`Reducer`]: twmap_model::Reducer

mod catalog;
mod engine;
mod error;

pub use catalog::FilterCatalog;
pub use engine::{AggregationEngine, DomainStrategy, aggregate};
pub use error::{AggregateError, Result};
