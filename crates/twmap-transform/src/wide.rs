//! Wide-to-long reshaping.
//!
//! Survey tables encode year and gender in column names
//! (`94年男性吸菸率`, `96年女性吸菸率`, ...). Year tokens are discovered from
//! the header by pattern, so each source may carry a different year set.

use std::collections::BTreeMap;

use regex::Regex;
use twmap_ingest::SourceTable;
use twmap_model::{Dimension, Observation};

use crate::context::{ObservationContext, parse_value, resolve_columns};
use crate::error::{Result, TransformError};
use crate::shape::{Stratum, WideShape};

/// Compiled column-name matcher for one [`WideShape`].
#[derive(Debug, Clone)]
pub struct ColumnPattern {
    year: Regex,
    measure: String,
    strata: Vec<Stratum>,
}

/// One value column: its year, its stratum (index into the pattern's strata)
/// and its position in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideColumn {
    pub year: String,
    pub stratum: Option<usize>,
    pub index: usize,
}

impl ColumnPattern {
    pub fn compile(shape: &WideShape) -> Result<Self> {
        let year = Regex::new(&shape.year_pattern).map_err(|e| TransformError::InvalidPattern {
            pattern: shape.year_pattern.clone(),
            message: e.to_string(),
        })?;
        if year.captures_len() < 2 {
            return Err(TransformError::InvalidPattern {
                pattern: shape.year_pattern.clone(),
                message: "pattern needs a capture group for the year".to_string(),
            });
        }
        Ok(Self {
            year,
            measure: shape.measure.trim().to_string(),
            strata: shape.strata.clone(),
        })
    }

    pub fn strata(&self) -> &[Stratum] {
        &self.strata
    }

    /// Year token in `header`, if the header is a value column for this pattern.
    fn year_of(&self, header: &str) -> Option<String> {
        if !header.contains(self.measure.as_str()) {
            return None;
        }
        let captures = self.year.captures(header)?;
        captures.get(1).map(|m| m.as_str().to_string())
    }

    /// Distinct year tokens in order of first appearance.
    pub fn discover_years(&self, headers: &[String]) -> Vec<String> {
        let mut years: Vec<String> = Vec::new();
        for header in headers {
            if let Some(year) = self.year_of(header)
                && !years.contains(&year)
            {
                years.push(year);
            }
        }
        years
    }

    /// Value columns of `headers`.
    ///
    /// With strata configured, a column belongs to the first stratum whose
    /// token it contains; columns matching no stratum are ignored. Only the
    /// first column per (year, stratum) is kept.
    pub fn columns(&self, headers: &[String]) -> Vec<WideColumn> {
        let mut seen: BTreeMap<(String, Option<usize>), usize> = BTreeMap::new();
        for (index, header) in headers.iter().enumerate() {
            let Some(year) = self.year_of(header) else {
                continue;
            };
            let stratum = if self.strata.is_empty() {
                None
            } else {
                match self
                    .strata
                    .iter()
                    .position(|stratum| header.contains(stratum.token.as_str()))
                {
                    Some(position) => Some(position),
                    None => continue,
                }
            };
            seen.entry((year, stratum)).or_insert(index);
        }
        let mut columns: Vec<WideColumn> = seen
            .into_iter()
            .map(|((year, stratum), index)| WideColumn {
                year,
                stratum,
                index,
            })
            .collect();
        columns.sort_by_key(|column| column.index);
        columns
    }
}

/// Reshape a wide table into observations.
///
/// Emits one observation per (record, year, stratum) whose cell holds a
/// number. Empty or placeholder cells are skipped for that year only, so a
/// region may carry some years and not others.
pub fn reshape(
    table: &SourceTable,
    shape: &WideShape,
    pattern: &ColumnPattern,
    ctx: &ObservationContext<'_>,
) -> Result<Vec<Observation>> {
    let region_columns = resolve_columns(table, std::slice::from_ref(&shape.region))?;
    let region_idx = region_columns[0];
    let columns = pattern.columns(&table.headers);
    if columns.is_empty() {
        tracing::warn!(
            source = %table.name,
            measure = %pattern.measure,
            "no value columns match the wide layout"
        );
        return Ok(Vec::new());
    }
    tracing::debug!(
        source = %table.name,
        years = ?pattern.discover_years(&table.headers),
        columns = columns.len(),
        "wide layout"
    );

    let mut observations = Vec::new();
    for record in &table.records {
        let Some(region) = ctx.region(table.cell(record, region_idx)) else {
            continue;
        };
        let base = ctx.base_key(record);
        for column in &columns {
            let Some(value) = parse_value(table.cell(record, column.index)) else {
                continue;
            };
            let mut key = base.clone().with(Dimension::Year, column.year.clone());
            if let Some(stratum) = column.stratum.and_then(|idx| pattern.strata.get(idx)) {
                key = key.with(Dimension::Gender, stratum.gender.clone());
            }
            observations.push(Observation::new(region.clone(), key, value));
        }
    }
    Ok(observations)
}
