//! Tabular source ingestion.
//!
//! Loads delimited files (local paths or http(s) URLs) into homogeneous
//! [`SourceTable`]s of [`RawRecord`]s. Loading is forgiving of bad
//! data: a missing source yields an [`IngestError`] in its own
//! [`SourceReport`] without affecting siblings, and malformed rows are skipped
//! one at a time.
//!
//! # Features
//!
//! - **Locations**: [`SourceLocation`] parses paths and URLs, resolves relative
//!   paths, and appends cache-busting query parameters
//! - **Fetching**: [`Fetcher`] reads files with `tokio::fs` and URLs with `reqwest`
//! - **Row rules**: [`RowRules`] classifies header echoes, aggregate rows and
//!   section headers once, at ingestion
//! - **Fan-out**: [`load_sources`] loads every source concurrently and joins
//!
//! # Example
//!
//! ```ignore
//! use twmap_ingest::{Fetcher, SourceDescriptor, load_sources};
//!
//! let fetcher = Fetcher::new()?;
//! let reports = load_sources(&fetcher, &descriptors, &|_| {}).await;
//! let loaded = reports.iter().filter(|r| r.table().is_some()).count();
//! ```

mod descriptor;
mod error;
mod fetch;
mod load;
mod location;
mod reader;
mod rules;
mod table;

// === Error Types ===
pub use error::{IngestError, Result};

// === Source Configuration ===
pub use descriptor::SourceDescriptor;
pub use location::SourceLocation;

// === Fetching ===
pub use fetch::{Fetched, Fetcher};

// === Parsing ===
pub use reader::parse_table;
pub use rules::{RowKind, RowRule, RowRules};
pub use table::{RawRecord, SkipCounts, SourceTable};

// === Loading ===
pub use load::{SourceOutcome, SourceReport, load_source, load_sources};
