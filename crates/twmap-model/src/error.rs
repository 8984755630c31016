#![deny(unsafe_code)]

use thiserror::Error;

/// Errors raised while parsing model values from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown filter dimension: {0}")]
    UnknownDimension(String),
    #[error("unknown reducer: {0}")]
    UnknownReducer(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
