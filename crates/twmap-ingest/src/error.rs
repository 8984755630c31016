//! Error types for tabular ingestion.

use thiserror::Error;

/// Errors that can occur while loading one tabular source.
///
/// All of them are non-fatal to a session: the failing source contributes no
/// records and its siblings keep loading.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Transport Errors ===
    /// File missing, unreadable, or the network request failed.
    #[error("source unavailable: {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },

    /// Remote source answered with a non-success status.
    #[error("source {location} returned HTTP {status}")]
    HttpStatus { location: String, status: u16 },

    /// URL could not be parsed or extended with a query parameter.
    #[error("invalid source URL {location}: {reason}")]
    InvalidUrl { location: String, reason: String },

    /// HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    // === Parsing Errors ===
    /// The source has no rows at all, so no header could be read.
    #[error("source {location} is empty; no header row")]
    MissingHeader { location: String },

    /// Delimiter is not a single ASCII character.
    #[error("invalid delimiter {delimiter:?} for {location}")]
    InvalidDelimiter { location: String, delimiter: char },

    /// The CSV reader failed outside of a single row.
    #[error("failed to parse {location}: {message}")]
    Csv { location: String, message: String },
}

impl IngestError {
    /// True for errors that mean the source could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::HttpStatus { .. } | Self::InvalidUrl { .. }
        )
    }

    /// Location of the failing source, when known.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::SourceUnavailable { location, .. }
            | Self::HttpStatus { location, .. }
            | Self::InvalidUrl { location, .. }
            | Self::MissingHeader { location }
            | Self::InvalidDelimiter { location, .. }
            | Self::Csv { location, .. } => Some(location),
            Self::Client(_) => None,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
