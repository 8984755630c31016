use std::path::PathBuf;

use thiserror::Error;
use twmap_aggregate::AggregateError;
use twmap_geo::GeometryError;
use twmap_ingest::IngestError;
use twmap_model::FilterSelection;

/// Errors surfaced to callers of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Geometry could not be fetched or is not a geometry document. Fatal.
    #[error("malformed geometry payload: {0}")]
    MalformedGeometryPayload(#[source] GeometryError),

    /// The selection has no backing data; the filter control should revert it.
    #[error("no data for filter combination: {selection}")]
    UnrecognizedFilterCombination { selection: FilterSelection },

    #[error("pipeline is {state}, not ready")]
    NotReady { state: &'static str },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("render sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to write {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<GeometryError> for PipelineError {
    fn from(error: GeometryError) -> Self {
        Self::MalformedGeometryPayload(error)
    }
}

impl From<AggregateError> for PipelineError {
    fn from(error: AggregateError) -> Self {
        match error {
            AggregateError::UnrecognizedFilterCombination { selection } => {
                Self::UnrecognizedFilterCombination { selection }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
