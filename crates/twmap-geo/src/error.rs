use thiserror::Error;
use twmap_ingest::IngestError;

/// Why a geometry source could not be resolved.
///
/// Every variant is fatal to the session: without geometry there is nothing
/// to bind statistics to.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("geometry source {location} unavailable: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("geometry source {location} returned HTTP {status}")]
    HttpStatus { location: String, status: u16 },

    #[error("geometry source {location} has content type {content_type}, expected JSON")]
    ContentType {
        location: String,
        content_type: String,
    },

    #[error("geometry source {location} is not JSON: {message}")]
    NotJson { location: String, message: String },

    #[error("geometry source {location} is a {found}, not a FeatureCollection or Topology")]
    NotGeometry { location: String, found: String },

    #[error("topology {location} has no object `{object}` (available: {available:?})")]
    UnknownObject {
        location: String,
        object: String,
        available: Vec<String>,
    },

    #[error("topology {location} references missing arc {index}")]
    ArcIndex { location: String, index: i64 },

    #[error("geometry source {location}: {message}")]
    InvalidGeometry { location: String, message: String },
}

impl GeometryError {
    /// Whether the payload was never received, as opposed to received and rejected.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::HttpStatus { .. })
    }

    pub fn location(&self) -> &str {
        match self {
            Self::Unavailable { location, .. }
            | Self::HttpStatus { location, .. }
            | Self::ContentType { location, .. }
            | Self::NotJson { location, .. }
            | Self::NotGeometry { location, .. }
            | Self::UnknownObject { location, .. }
            | Self::ArcIndex { location, .. }
            | Self::InvalidGeometry { location, .. } => location,
        }
    }
}

impl From<IngestError> for GeometryError {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::HttpStatus { location, status } => Self::HttpStatus { location, status },
            other => Self::Unavailable {
                location: other.location().unwrap_or_default().to_string(),
                reason: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, GeometryError>;
