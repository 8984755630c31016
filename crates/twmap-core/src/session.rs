//! Per-session pipeline state machine.

use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};
use twmap_aggregate::{AggregationEngine, FilterCatalog};
use twmap_geo::{DisplayNameAdapter, GeometryResolver};
use twmap_ingest::{Fetcher, SourceDescriptor, SourceOutcome, SourceReport, load_sources};
use twmap_model::{
    AggregatedStat, Dimension, FilterSelection, Observation, RegionGeometry, RenderFrame,
};
use twmap_normalize::NameNormalizer;
use twmap_transform::{ObservationContext, SourceShape, observe};

use crate::binder::ChoroplethBinder;
use crate::color::ColorScale;
use crate::config::{PipelineConfig, SourcePlan};
use crate::error::{PipelineError, Result};
use crate::pivot::PivotSummary;
use crate::sink::RenderSink;

/// Outer pipeline state. Rendering is a pass over `Ready`, not a state.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Ready(Box<Dataset>),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// How one configured source fared during loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub rows: usize,
    pub skipped: usize,
    pub observations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceSummary {
    pub fn is_loaded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything resolved while loading. Never mutated afterwards.
#[derive(Debug)]
pub struct Dataset {
    pub observations: Arc<[Observation]>,
    pub geometries: Arc<[RegionGeometry]>,
    pub catalog: FilterCatalog,
    pub sources: Vec<SourceSummary>,
}

/// One data-load session: configuration, resolved data and the filter entry
/// point.
pub struct Session {
    config: PipelineConfig,
    normalizer: NameNormalizer,
    engine: AggregationEngine,
    names: Box<dyn DisplayNameAdapter>,
    scale: ColorScale,
    fetcher: Fetcher,
    resolver: GeometryResolver,
    state: SessionState,
}

impl Session {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let fetcher = Fetcher::new()?;
        Ok(Self {
            normalizer: NameNormalizer::new(&config.normalize),
            engine: config.aggregate.engine(),
            names: config.geometry.name.adapter(),
            scale: config.color.scale.clone(),
            resolver: GeometryResolver::new(fetcher.clone()),
            fetcher,
            config,
            state: SessionState::Uninitialized,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub async fn load(&mut self) -> Result<()> {
        self.load_with_progress(&|_: &SourceReport| {}).await
    }

    /// Fetch geometry and every tabular source concurrently, then map the
    /// tables to observations.
    ///
    /// Sources that fail are logged and skipped. A geometry failure is fatal:
    /// the session returns to `Uninitialized` and the error is returned as
    /// [`PipelineError::MalformedGeometryPayload`].
    pub async fn load_with_progress(
        &mut self,
        progress: &(dyn Fn(&SourceReport) + Sync),
    ) -> Result<()> {
        let plans = self.config.plans();
        let span = info_span!("load", sources = plans.len());
        self.load_plans(&plans, progress).instrument(span).await
    }

    async fn load_plans(
        &mut self,
        plans: &[SourcePlan],
        progress: &(dyn Fn(&SourceReport) + Sync),
    ) -> Result<()> {
        self.state = SessionState::Loading;
        let descriptors: Vec<SourceDescriptor> =
            plans.iter().map(|plan| plan.descriptor.clone()).collect();

        let (geometries, reports) = tokio::join!(
            self.resolver
                .load_geometry(&self.config.geometry)
                .instrument(info_span!("geometry")),
            load_sources(&self.fetcher, &descriptors, progress),
        );
        let geometries = match geometries {
            Ok(geometries) => geometries,
            Err(error) => {
                self.state = SessionState::Uninitialized;
                return Err(PipelineError::MalformedGeometryPayload(error));
            }
        };

        let mut observations = Vec::new();
        let mut sources = Vec::with_capacity(reports.len());
        for (plan, report) in plans.iter().zip(reports) {
            let summary = self.map_source(plan, report, &mut observations);
            sources.push(summary);
        }

        let catalog = FilterCatalog::from_observations(&observations, &rollup_labels(plans));
        let loaded = sources.iter().filter(|s| s.is_loaded()).count();
        info!(
            loaded,
            failed = sources.len() - loaded,
            observations = observations.len(),
            geometries = geometries.len(),
            "load complete"
        );
        self.state = SessionState::Ready(Box::new(Dataset {
            observations: observations.into(),
            geometries,
            catalog,
            sources,
        }));
        Ok(())
    }

    fn map_source(
        &self,
        plan: &SourcePlan,
        report: SourceReport,
        observations: &mut Vec<Observation>,
    ) -> SourceSummary {
        let mut summary = SourceSummary {
            name: report.name,
            rows: 0,
            skipped: 0,
            observations: 0,
            error: None,
        };
        let table = match report.outcome {
            SourceOutcome::Loaded(table) => table,
            SourceOutcome::Unavailable(error) => {
                summary.error = Some(error.to_string());
                return summary;
            }
        };
        summary.rows = table.len();
        summary.skipped = table.skipped.total();

        let mut ctx = ObservationContext::new(&self.normalizer).with_fixed(plan.fixed.clone());
        if let Some(dimension) = plan.section_dimension {
            ctx = ctx.with_section_dimension(dimension);
        }
        match observe(&table, &plan.shape, &ctx) {
            Ok(mapped) => {
                summary.observations = mapped.len();
                observations.extend(mapped);
            }
            Err(error) => {
                warn!(source = %summary.name, %error, "source could not be mapped, skipping");
                summary.error = Some(error.to_string());
            }
        }
        summary
    }

    pub fn dataset(&self) -> Result<&Dataset> {
        match &self.state {
            SessionState::Ready(dataset) => Ok(dataset),
            other => Err(PipelineError::NotReady {
                state: other.name(),
            }),
        }
    }

    pub fn catalog(&self) -> Result<&FilterCatalog> {
        Ok(&self.dataset()?.catalog)
    }

    pub fn default_selection(&self) -> Result<Option<FilterSelection>> {
        Ok(self.catalog()?.default_selection())
    }

    pub fn aggregate(&self, selection: &FilterSelection) -> Result<AggregatedStat> {
        let dataset = self.dataset()?;
        Ok(self
            .engine
            .run(&dataset.observations, &dataset.catalog, selection)?)
    }

    /// Aggregate and bind for `selection`.
    ///
    /// Runs synchronously over the resolved data; nothing is fetched. A
    /// selection without backing data fails with
    /// [`PipelineError::UnrecognizedFilterCombination`] and leaves the session
    /// untouched.
    pub fn on_filter_changed(&self, selection: &FilterSelection) -> Result<RenderFrame<'_>> {
        let dataset = self.dataset()?;
        let _span = info_span!("render", selection = %selection).entered();
        let stat = self
            .engine
            .run(&dataset.observations, &dataset.catalog, selection)?;
        let binder = ChoroplethBinder::new(&self.normalizer, self.names.as_ref(), &self.scale);
        let frame = binder.frame(&stat, &dataset.geometries);
        info!(
            regions = stat.len(),
            features = frame.features.len(),
            with_data = frame.with_data(),
            "render pass"
        );
        Ok(frame)
    }

    /// Render pass for `selection`, handed to `sink`.
    ///
    /// The frame is built before the sink sees anything, so a rejected
    /// selection leaves the sink untouched.
    pub fn render_into<S: RenderSink>(
        &self,
        selection: &FilterSelection,
        sink: &mut S,
    ) -> Result<()> {
        let frame = self.on_filter_changed(selection)?;
        sink.render(&frame)
            .map_err(|error| PipelineError::Sink(Box::new(error)))
    }

    /// Pivot over `dimension`, the other dimensions fixed by `base`.
    pub fn pivot(&self, base: &FilterSelection, dimension: Dimension) -> Result<PivotSummary> {
        let dataset = self.dataset()?;
        Ok(PivotSummary::build(
            &dataset.observations,
            &dataset.catalog,
            &self.engine,
            base,
            dimension,
        ))
    }
}

fn rollup_labels(plans: &[SourcePlan]) -> Vec<(Dimension, String)> {
    let mut labels: Vec<(Dimension, String)> = Vec::new();
    for plan in plans {
        if let SourceShape::Long(long) = &plan.shape
            && let Some(rollup) = &long.rollup
        {
            let label = (rollup.dimension, rollup.label.clone());
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        toml::from_str(
            r#"
            [geometry]
            location = "taiwan.json"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_not_ready_before_load() {
        let session = Session::new(config()).unwrap();
        assert_eq!(session.state().name(), "uninitialized");
        let err = session
            .on_filter_changed(&FilterSelection::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NotReady {
                state: "uninitialized"
            }
        ));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SessionState::default().name(), "uninitialized");
        assert_eq!(SessionState::Loading.name(), "loading");
        assert!(!SessionState::Loading.is_ready());
    }

    #[test]
    fn test_rollup_labels_deduplicated() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [geometry]
            location = "taiwan.json"

            [[sources]]
            name = "drug_data{n}"
            location = "drug_data{n}.csv"
            count = 2
            [sources.shape]
            kind = "long"
            region = ["oc_addr"]
            rollup = { dimension = "kind", label = "全部" }
            "#,
        )
        .unwrap();
        let labels = rollup_labels(&config.plans());
        assert_eq!(labels, vec![(Dimension::Kind, "全部".to_string())]);
    }
}
