use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("invalid year pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("source {source_name}: none of the columns {candidates:?} exists")]
    MissingColumn {
        source_name: String,
        candidates: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, TransformError>;
