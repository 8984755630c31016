//! Concurrent loading of a configured source list.

use futures_util::future::join_all;
use tracing::{Instrument, info_span, warn};

use crate::descriptor::SourceDescriptor;
use crate::error::{IngestError, Result};
use crate::fetch::Fetcher;
use crate::location::SourceLocation;
use crate::reader::parse_table;
use crate::table::SourceTable;

/// Result of loading a single source.
#[derive(Debug)]
pub enum SourceOutcome {
    Loaded(SourceTable),
    Unavailable(IngestError),
}

/// Per-source outcome, kept in configuration order.
#[derive(Debug)]
pub struct SourceReport {
    pub name: String,
    pub location: SourceLocation,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn table(&self) -> Option<&SourceTable> {
        match &self.outcome {
            SourceOutcome::Loaded(table) => Some(table),
            SourceOutcome::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&IngestError> {
        match &self.outcome {
            SourceOutcome::Loaded(_) => None,
            SourceOutcome::Unavailable(error) => Some(error),
        }
    }

    pub fn into_table(self) -> Option<SourceTable> {
        match self.outcome {
            SourceOutcome::Loaded(table) => Some(table),
            SourceOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Loaded(_))
    }
}

/// Fetch and parse one source.
pub async fn load_source(fetcher: &Fetcher, descriptor: &SourceDescriptor) -> Result<SourceTable> {
    let location = descriptor.fetch_location()?;
    let fetched = fetcher.fetch(&location).await?;
    let table = parse_table(descriptor, &fetched.bytes)?;
    tracing::debug!(
        rows = table.len(),
        skipped = table.skipped.total(),
        malformed = table.skipped.malformed,
        "parsed source"
    );
    Ok(table)
}

/// Load every source concurrently.
///
/// All fetches are issued before any completes; the call returns once every
/// source has either loaded or failed. A failed source is logged and reported
/// but never aborts the others. `progress` is invoked as each source settles.
pub async fn load_sources(
    fetcher: &Fetcher,
    descriptors: &[SourceDescriptor],
    progress: &(dyn Fn(&SourceReport) + Sync),
) -> Vec<SourceReport> {
    let tasks = descriptors.iter().map(|descriptor| {
        let span = info_span!("source", name = %descriptor.name);
        async move {
            let outcome = match load_source(fetcher, descriptor).await {
                Ok(table) => SourceOutcome::Loaded(table),
                Err(error) => {
                    warn!(location = %descriptor.location, %error, "source unavailable, skipping");
                    SourceOutcome::Unavailable(error)
                }
            };
            let report = SourceReport {
                name: descriptor.name.clone(),
                location: descriptor.location.clone(),
                outcome,
            };
            progress(&report);
            report
        }
        .instrument(span)
    });
    join_all(tasks).await
}
