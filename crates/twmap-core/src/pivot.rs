//! Pivoted export: one column per value of a dimension.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Serializer};
use twmap_aggregate::{AggregationEngine, FilterCatalog};
use twmap_model::{Dimension, FilterSelection, Observation};

use crate::error::{PipelineError, Result};

/// `{"options": [...], "data": {region: {value: number}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotSummary {
    pub options: Vec<String>,
    pub data: BTreeMap<String, BTreeMap<String, PivotValue>>,
}

/// A number serialized as an integer when it has no fractional part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotValue(pub f64);

impl Serialize for PivotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let value = self.0;
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

impl PivotSummary {
    /// Aggregate `base` once per catalogued value of `dimension`.
    ///
    /// Values whose combination with `base` has no data are left out of
    /// `options`.
    pub fn build(
        observations: &[Observation],
        catalog: &FilterCatalog,
        engine: &AggregationEngine,
        base: &FilterSelection,
        dimension: Dimension,
    ) -> Self {
        let mut summary = Self::default();
        for value in catalog.values(dimension) {
            let selection = base.clone().with(dimension, value.clone());
            if !catalog.contains(selection.key()) {
                continue;
            }
            let stat = engine.aggregate(observations, &selection);
            for (region, reduced) in stat.iter() {
                summary
                    .data
                    .entry(region.to_string())
                    .or_default()
                    .insert(value.clone(), PivotValue(reduced));
            }
            summary.options.push(value.clone());
        }
        summary
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| PipelineError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|e| PipelineError::io(path, e))
    }
}
