//! Aggregation results and the statistics derived from them.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::filter::FilterSelection;
use crate::ids::CanonicalRegionId;

/// How a group of matching observations collapses to one number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Number of matching observations, values ignored.
    #[default]
    Count,
    /// Arithmetic mean of the matching values.
    Mean,
}

impl Reducer {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Mean => "mean",
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reducer {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "mean" | "average" => Ok(Self::Mean),
            _ => Err(ModelError::UnknownReducer(s.to_string())),
        }
    }
}

/// Value range the color scale is calibrated against. `min` is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDomain {
    pub min: f64,
    pub max: f64,
}

impl ColorDomain {
    /// Domain `[0, max]`; falls back to `[0, 1]` when no positive maximum exists.
    pub fn from_max(max: Option<f64>) -> Self {
        let max = match max {
            Some(value) if value.is_finite() && value > 0.0 => value,
            _ => 1.0,
        };
        Self { min: 0.0, max }
    }

    /// Position of `value` inside the domain, clamped to `[0, 1]`.
    pub fn position(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if !value.is_finite() || span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

impl Default for ColorDomain {
    fn default() -> Self {
        Self::from_max(None)
    }
}

/// Legend statistics over the regions that have a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub regions: usize,
    pub total: f64,
    /// Absent when no region has a value.
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a f64>) -> Self {
        let mut summary = Self::default();
        for value in values {
            summary.regions += 1;
            summary.total += *value;
            summary.max = Some(summary.max.map_or(*value, |max| max.max(*value)));
        }
        if summary.regions > 0 {
            summary.mean = Some(summary.total / summary.regions as f64);
        }
        summary
    }
}

/// Per-region reduced values for one selection, plus color calibration.
///
/// Regions without a matching observation have no entry at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedStat {
    pub selection: FilterSelection,
    pub reducer: Reducer,
    pub values: BTreeMap<CanonicalRegionId, f64>,
    pub domain: ColorDomain,
    pub summary: Summary,
}

impl AggregatedStat {
    pub fn get(&self, region: &CanonicalRegionId) -> Option<f64> {
        self.values.get(region).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalRegionId, f64)> {
        self.values.iter().map(|(region, value)| (region, *value))
    }
}
