//! Deployment configuration, read from one TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use twmap_aggregate::{AggregationEngine, DomainStrategy};
use twmap_geo::GeometrySource;
use twmap_ingest::{SourceDescriptor, SourceLocation};
use twmap_model::{Dimension, FilterKey, Reducer};
use twmap_normalize::NormalizerConfig;
use twmap_transform::SourceShape;

use crate::color::ColorScale;
use crate::error::{PipelineError, Result};

/// Placeholder replaced by the member number in source families.
const FAMILY_PLACEHOLDER: &str = "{n}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub normalize: NormalizerConfig,
    pub geometry: GeometrySource,
    #[serde(default)]
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub color: ColorConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    #[serde(default)]
    pub reducer: Reducer,
    /// Dimensions the color domain is held across.
    #[serde(default)]
    pub calibration_free: Vec<Dimension>,
    /// Defaults per reducer when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainStrategy>,
}

impl AggregateConfig {
    pub fn engine(&self) -> AggregationEngine {
        let engine = AggregationEngine::new(self.reducer)
            .with_calibration_free(self.calibration_free.clone());
        match self.domain {
            Some(strategy) => engine.with_strategy(strategy),
            None => engine,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default)]
    pub scale: ColorScale,
}

/// One configured tabular source, or a numbered family of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(flatten)]
    pub descriptor: SourceDescriptor,
    /// Family size; `{n}` in the name and location runs from 1 to `count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default)]
    pub fixed: FilterKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_dimension: Option<Dimension>,
    pub shape: SourceShape,
}

/// A single source ready to load and map.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePlan {
    pub descriptor: SourceDescriptor,
    pub shape: SourceShape,
    pub fixed: FilterKey,
    pub section_dimension: Option<Dimension>,
}

impl SourceConfig {
    /// Expand a family into its members; a plain source yields itself.
    pub fn expand(&self) -> Vec<SourcePlan> {
        let plan = |descriptor: SourceDescriptor| SourcePlan {
            descriptor,
            shape: self.shape.clone(),
            fixed: self.fixed.clone(),
            section_dimension: self.section_dimension,
        };
        let Some(count) = self.count else {
            return vec![plan(self.descriptor.clone())];
        };
        let location = self.descriptor.location.to_string();
        (1..=count)
            .map(|n| {
                let number = n.to_string();
                let mut descriptor = self.descriptor.clone();
                descriptor.name = if self.descriptor.name.contains(FAMILY_PLACEHOLDER) {
                    self.descriptor.name.replace(FAMILY_PLACEHOLDER, &number)
                } else {
                    format!("{}{number}", self.descriptor.name)
                };
                descriptor.location =
                    SourceLocation::parse(&location.replace(FAMILY_PLACEHOLDER, &number));
                plan(descriptor)
            })
            .collect()
    }
}

impl PipelineConfig {
    /// Read and parse `path`. Relative locations resolve against its directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: Self = toml::from_str(&contents).map_err(|e| PipelineError::Toml {
            path: path.to_path_buf(),
            source: e,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let config = config.resolve_against(base);
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn resolve_against(mut self, base: &Path) -> Self {
        self.geometry.location = self.geometry.location.resolve_against(base);
        for source in &mut self.sources {
            source.descriptor.location = source.descriptor.location.clone().resolve_against(base);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for source in &self.sources {
            if source.count == Some(0) {
                return Err(PipelineError::config(format!(
                    "source {} has count = 0",
                    source.descriptor.name
                )));
            }
            if source.count.is_some()
                && !source
                    .descriptor
                    .location
                    .to_string()
                    .contains(FAMILY_PLACEHOLDER)
            {
                return Err(PipelineError::config(format!(
                    "source {} has a count but its location has no {FAMILY_PLACEHOLDER}",
                    source.descriptor.name
                )));
            }
            source.descriptor.delimiter_byte()?;
        }
        if let ColorScale::Thresholds(breaks) = &self.color.scale
            && breaks.windows(2).any(|pair| pair[0] >= pair[1])
        {
            return Err(PipelineError::config(
                "color thresholds must be strictly increasing",
            ));
        }
        Ok(())
    }

    /// Every source to load, families expanded, in configuration order.
    pub fn plans(&self) -> Vec<SourcePlan> {
        self.sources.iter().flat_map(SourceConfig::expand).collect()
    }
}
