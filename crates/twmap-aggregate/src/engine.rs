//! Exact-match grouping and reduction.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use twmap_model::{
    AggregatedStat, CanonicalRegionId, ColorDomain, Dimension, FilterKey, FilterSelection,
    Observation, Reducer, Summary,
};

use crate::catalog::FilterCatalog;
use crate::error::{AggregateError, Result};

/// How the color-domain maximum is derived from the calibration scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStrategy {
    /// Largest reduced value of any (region, key) group in scope.
    MaxOfGroups,
    /// Mean over keys in scope of each key's largest regional value.
    MeanOfMaxes,
}

impl DomainStrategy {
    pub const fn default_for(reducer: Reducer) -> Self {
        match reducer {
            Reducer::Count => Self::MaxOfGroups,
            Reducer::Mean => Self::MeanOfMaxes,
        }
    }
}

/// Running reduction for one group.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: usize,
    sum: f64,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    fn finish(self, reducer: Reducer) -> Option<f64> {
        match reducer {
            Reducer::Count => Some(self.count as f64),
            Reducer::Mean if self.count > 0 => Some(self.sum / self.count as f64),
            Reducer::Mean => None,
        }
    }
}

/// Reducer plus color-domain calibration settings.
///
/// The color domain is computed over every observation that agrees with the
/// selection on all dimensions except `calibration_free` ones, so switching
/// between values of a free dimension (typically the year) keeps colors
/// comparable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationEngine {
    reducer: Reducer,
    calibration_free: Vec<Dimension>,
    strategy: DomainStrategy,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new(Reducer::default())
    }
}

impl AggregationEngine {
    pub fn new(reducer: Reducer) -> Self {
        Self {
            reducer,
            calibration_free: Vec::new(),
            strategy: DomainStrategy::default_for(reducer),
        }
    }

    #[must_use]
    pub fn with_calibration_free(mut self, dimensions: Vec<Dimension>) -> Self {
        self.calibration_free = dimensions;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: DomainStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }

    pub fn strategy(&self) -> DomainStrategy {
        self.strategy
    }

    pub fn calibration_free(&self) -> &[Dimension] {
        &self.calibration_free
    }

    /// Aggregate after checking that `selection` names a key with data.
    pub fn run(
        &self,
        observations: &[Observation],
        catalog: &FilterCatalog,
        selection: &FilterSelection,
    ) -> Result<AggregatedStat> {
        if !catalog.contains(selection.key()) {
            return Err(AggregateError::UnrecognizedFilterCombination {
                selection: selection.clone(),
            });
        }
        Ok(self.aggregate(observations, selection))
    }

    /// Reduce the observations whose key equals the selection exactly.
    ///
    /// Regions without a matching observation get no entry.
    pub fn aggregate(
        &self,
        observations: &[Observation],
        selection: &FilterSelection,
    ) -> AggregatedStat {
        let mut groups: BTreeMap<&CanonicalRegionId, Accumulator> = BTreeMap::new();
        for observation in observations
            .iter()
            .filter(|observation| selection.matches(observation.key()))
        {
            groups
                .entry(observation.region())
                .or_default()
                .push(observation.value());
        }
        let values: BTreeMap<CanonicalRegionId, f64> = groups
            .into_iter()
            .filter_map(|(region, acc)| acc.finish(self.reducer).map(|v| (region.clone(), v)))
            .collect();

        let domain = ColorDomain::from_max(self.domain_max(observations, selection.key()));
        let summary = Summary::from_values(values.values());
        tracing::debug!(
            selection = %selection,
            reducer = %self.reducer,
            regions = values.len(),
            domain_max = domain.max,
            "aggregated"
        );
        AggregatedStat {
            selection: selection.clone(),
            reducer: self.reducer,
            values,
            domain,
            summary,
        }
    }

    fn domain_max(&self, observations: &[Observation], key: &FilterKey) -> Option<f64> {
        let mut groups: HashMap<(&FilterKey, &CanonicalRegionId), Accumulator> = HashMap::new();
        for observation in observations
            .iter()
            .filter(|observation| observation.key().matches_except(key, &self.calibration_free))
        {
            groups
                .entry((observation.key(), observation.region()))
                .or_default()
                .push(observation.value());
        }

        let mut per_key: HashMap<&FilterKey, f64> = HashMap::new();
        for ((group_key, _), acc) in groups {
            if let Some(value) = acc.finish(self.reducer) {
                per_key
                    .entry(group_key)
                    .and_modify(|max| *max = max.max(value))
                    .or_insert(value);
            }
        }
        if per_key.is_empty() {
            return None;
        }
        match self.strategy {
            DomainStrategy::MaxOfGroups => per_key.values().copied().reduce(f64::max),
            DomainStrategy::MeanOfMaxes => {
                Some(per_key.values().sum::<f64>() / per_key.len() as f64)
            }
        }
    }
}

/// Aggregate with no calibration-free dimensions: the domain spans the
/// selection alone.
pub fn aggregate(
    observations: &[Observation],
    selection: &FilterSelection,
    reducer: Reducer,
) -> AggregatedStat {
    AggregationEngine::new(reducer).aggregate(observations, selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> FilterKey {
        FilterKey::new().with(Dimension::Kind, "k")
    }

    fn obs(region: &str, key: FilterKey, value: f64) -> Observation {
        Observation::new(CanonicalRegionId::new(region), key, value)
    }

    fn region(id: &str) -> CanonicalRegionId {
        CanonicalRegionId::new(id)
    }

    #[test]
    fn test_count_reducer() {
        let observations = vec![obs("A", key(), 1.0), obs("A", key(), 1.0), obs("B", key(), 1.0)];
        let stat = aggregate(&observations, &key().into(), Reducer::Count);
        assert_eq!(stat.get(&region("A")), Some(2.0));
        assert_eq!(stat.get(&region("B")), Some(1.0));
        assert_eq!(stat.len(), 2);
    }

    #[test]
    fn test_count_ignores_values() {
        let observations = vec![obs("A", key(), 0.0), obs("A", key(), 57.0)];
        let stat = aggregate(&observations, &key().into(), Reducer::Count);
        assert_eq!(stat.get(&region("A")), Some(2.0));
    }

    #[test]
    fn test_mean_reducer_and_absence() {
        let observations = vec![obs("A", key(), 10.0), obs("A", key(), 20.0)];
        let stat = aggregate(&observations, &key().into(), Reducer::Mean);
        assert_eq!(stat.get(&region("A")), Some(15.0));
        assert_eq!(stat.get(&region("C")), None);
    }

    #[test]
    fn test_zero_is_kept_distinct_from_absent() {
        let observations = vec![obs("A", key(), 0.0)];
        let stat = aggregate(&observations, &key().into(), Reducer::Mean);
        assert_eq!(stat.get(&region("A")), Some(0.0));
    }

    #[test]
    fn test_exact_match_only() {
        let broader = key().with(Dimension::Year, "96");
        let observations = vec![obs("A", key(), 1.0), obs("A", broader, 1.0)];
        let stat = aggregate(&observations, &key().into(), Reducer::Count);
        assert_eq!(stat.get(&region("A")), Some(1.0));
    }

    #[test]
    fn test_domain_held_across_free_dimension() {
        let y94 = FilterKey::new().with(Dimension::Year, "94");
        let y96 = FilterKey::new().with(Dimension::Year, "96");
        let observations = vec![
            obs("A", y94.clone(), 10.0),
            obs("B", y94.clone(), 30.0),
            obs("A", y96.clone(), 50.0),
        ];
        let engine = AggregationEngine::new(Reducer::Mean)
            .with_calibration_free(vec![Dimension::Year])
            .with_strategy(DomainStrategy::MaxOfGroups);
        let first = engine.aggregate(&observations, &y94.into());
        let second = engine.aggregate(&observations, &y96.into());
        assert_eq!(first.domain.max, 50.0);
        assert_eq!(second.domain, first.domain);
        assert_eq!(first.summary.mean, Some(20.0));
    }

    #[test]
    fn test_mean_of_maxes_domain() {
        let y94 = FilterKey::new().with(Dimension::Year, "94");
        let y96 = FilterKey::new().with(Dimension::Year, "96");
        let observations = vec![
            obs("A", y94.clone(), 10.0),
            obs("B", y94.clone(), 30.0),
            obs("A", y96, 50.0),
        ];
        let engine = AggregationEngine::new(Reducer::Mean).with_calibration_free(vec![Dimension::Year]);
        assert_eq!(engine.strategy(), DomainStrategy::MeanOfMaxes);
        let stat = engine.aggregate(&observations, &y94.into());
        assert_eq!(stat.domain.max, 40.0);
    }

    #[test]
    fn test_domain_without_data_defaults_to_unit() {
        let stat = aggregate(&[], &key().into(), Reducer::Mean);
        assert!(stat.is_empty());
        assert_eq!(stat.domain, ColorDomain::from_max(None));
        assert_eq!(stat.summary.mean, None);
    }

    #[test]
    fn test_run_rejects_unknown_selection() {
        let observations = vec![obs("A", key(), 1.0)];
        let catalog = FilterCatalog::from_observations(&observations, &[]);
        let engine = AggregationEngine::default();

        assert!(engine.run(&observations, &catalog, &key().into()).is_ok());
        let unknown = FilterSelection::new(key().with(Dimension::Year, "200"));
        assert_eq!(
            engine.run(&observations, &catalog, &unknown),
            Err(AggregateError::UnrecognizedFilterCombination { selection: unknown.clone() })
        );
    }
}
