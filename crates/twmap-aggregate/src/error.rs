use thiserror::Error;
use twmap_model::FilterSelection;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// The selection names a dimension combination no observation carries.
    #[error("no data for filter combination: {selection}")]
    UnrecognizedFilterCombination { selection: FilterSelection },
}

pub type Result<T> = std::result::Result<T, AggregateError>;
