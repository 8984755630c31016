//! Declarative description of how a source table encodes observations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use twmap_model::Dimension;

/// Label applied to empty dimension cells.
pub const DEFAULT_MISSING_LABEL: &str = "未知";

/// Default pattern for year tokens in compound column names, e.g. `94年男性吸菸率`.
pub const DEFAULT_YEAR_PATTERN: &str = r"(\d{2,4})年";

fn default_missing() -> String {
    DEFAULT_MISSING_LABEL.to_string()
}

fn default_year_pattern() -> String {
    DEFAULT_YEAR_PATTERN.to_string()
}

/// Layout of one source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceShape {
    /// One observation per row.
    Long(LongShape),
    /// Years and strata encoded in column names.
    Wide(WideShape),
}

/// Row-per-observation layout.
///
/// Every field is an ordered list of candidate columns; the first non-empty
/// cell wins, so sources that renamed a column over time share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongShape {
    pub region: Vec<String>,
    #[serde(default)]
    pub dimensions: BTreeMap<Dimension, Vec<String>>,
    /// Numeric column. Without one each row counts as a single occurrence (`1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default = "default_missing")]
    pub missing: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollup: Option<Rollup>,
}

impl LongShape {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: vec![region.into()],
            dimensions: BTreeMap::new(),
            value: None,
            missing: default_missing(),
            rollup: None,
        }
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: Dimension, columns: &[&str]) -> Self {
        self.dimensions
            .insert(dimension, columns.iter().map(|c| c.to_string()).collect());
        self
    }

    #[must_use]
    pub fn with_rollup(mut self, dimension: Dimension, label: impl Into<String>) -> Self {
        self.rollup = Some(Rollup {
            dimension,
            label: label.into(),
        });
        self
    }
}

/// Extra observation emitted per record under a catch-all label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
    pub dimension: Dimension,
    pub label: String,
}

/// Column-per-year layout, optionally split by stratum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WideShape {
    pub region: String,
    /// Regex whose first capture group is the year token.
    #[serde(default = "default_year_pattern")]
    pub year_pattern: String,
    /// Keyword a value column must contain.
    #[serde(default)]
    pub measure: String,
    #[serde(default)]
    pub strata: Vec<Stratum>,
}

/// Column-name token selecting a gender stratum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratum {
    pub token: String,
    pub gender: String,
}
