//! Record-to-observation mapping.
//!
//! Turns ingested [`SourceTable`]s into [`Observation`]s:
//!
//! - **long**: one row per fact, with fallback columns and an optional roll-up
//! - **wide**: year and stratum encoded in column names, reshaped to long
//!
//! Region cells pass through the [`NameNormalizer`](twmap_normalize::NameNormalizer)
//! carried by the [`ObservationContext`].

mod context;
mod error;
mod long;
mod shape;
mod wide;

pub use context::ObservationContext;
pub use error::{Result, TransformError};
pub use long::observe_long;
pub use shape::{
    DEFAULT_MISSING_LABEL, DEFAULT_YEAR_PATTERN, LongShape, Rollup, SourceShape, Stratum,
    WideShape,
};
pub use wide::{ColumnPattern, WideColumn, reshape};

use twmap_ingest::SourceTable;
use twmap_model::Observation;

/// Observations of `table` under `shape`.
pub fn observe(
    table: &SourceTable,
    shape: &SourceShape,
    ctx: &ObservationContext<'_>,
) -> Result<Vec<Observation>> {
    let observations = match shape {
        SourceShape::Long(long) => observe_long(table, long, ctx)?,
        SourceShape::Wide(wide) => {
            let pattern = ColumnPattern::compile(wide)?;
            reshape(table, wide, &pattern, ctx)?
        }
    };
    tracing::debug!(
        source = %table.name,
        records = table.len(),
        observations = observations.len(),
        "mapped source"
    );
    Ok(observations)
}
