use twmap_ingest::{RawRecord, SourceTable};
use twmap_model::{CanonicalRegionId, Dimension, FilterKey};
use twmap_normalize::NameNormalizer;

use crate::error::{Result, TransformError};

/// Per-source settings shared by every record of a table.
#[derive(Debug, Clone)]
pub struct ObservationContext<'a> {
    /// Dimension values every observation of the source carries.
    pub fixed: FilterKey,
    /// Dimension filled from the record's section title, for stacked tables.
    pub section_dimension: Option<Dimension>,
    pub normalizer: &'a NameNormalizer,
}

impl<'a> ObservationContext<'a> {
    pub fn new(normalizer: &'a NameNormalizer) -> Self {
        Self {
            fixed: FilterKey::new(),
            section_dimension: None,
            normalizer,
        }
    }

    #[must_use]
    pub fn with_fixed(mut self, fixed: FilterKey) -> Self {
        self.fixed = fixed;
        self
    }

    #[must_use]
    pub fn with_section_dimension(mut self, dimension: Dimension) -> Self {
        self.section_dimension = Some(dimension);
        self
    }

    /// Starting key for `record`: the fixed values plus its section.
    pub fn base_key(&self, record: &RawRecord) -> FilterKey {
        let mut key = self.fixed.clone();
        if let (Some(dimension), Some(section)) = (self.section_dimension, &record.section) {
            key.set(dimension, Some(section.clone()));
        }
        key
    }

    /// Canonical id for a raw region cell, `None` when it normalizes to nothing usable.
    pub fn region(&self, raw: &str) -> Option<CanonicalRegionId> {
        self.normalizer.region_id(raw)
    }
}

/// Indices of the candidate columns present in `table`, in preference order.
pub(crate) fn resolve_columns(table: &SourceTable, candidates: &[String]) -> Result<Vec<usize>> {
    let found: Vec<usize> = candidates
        .iter()
        .filter_map(|column| table.column_index(column))
        .collect();
    if found.is_empty() {
        return Err(TransformError::MissingColumn {
            source_name: table.name.clone(),
            candidates: candidates.to_vec(),
        });
    }
    Ok(found)
}

/// First non-empty cell among `columns`.
pub(crate) fn first_filled<'r>(
    table: &SourceTable,
    record: &'r RawRecord,
    columns: &[usize],
) -> Option<&'r str> {
    columns
        .iter()
        .map(|idx| table.cell(record, *idx).trim())
        .find(|value| !value.is_empty())
}

/// Parse a statistic cell. Thousands separators and a trailing `%` are
/// accepted; placeholders such as `-` or `…` yield `None`.
pub(crate) fn parse_value(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches(['%', '％'])
        .chars()
        .filter(|ch| *ch != ',')
        .collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
