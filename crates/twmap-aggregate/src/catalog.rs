//! Distinct dimension values offered to the filter control.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;
use twmap_model::{Dimension, FilterKey, FilterSelection, Observation};

/// Every dimension value and every filter key present in a dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterCatalog {
    values: BTreeMap<Dimension, Vec<String>>,
    #[serde(skip)]
    keys: HashSet<FilterKey>,
}

impl FilterCatalog {
    /// Build the catalog. `leading` lists labels (roll-ups) shown ahead of
    /// the sorted values of their dimension.
    pub fn from_observations<'a>(
        observations: impl IntoIterator<Item = &'a Observation>,
        leading: &[(Dimension, String)],
    ) -> Self {
        let mut seen: BTreeMap<Dimension, BTreeSet<String>> = BTreeMap::new();
        let mut keys = HashSet::new();
        for observation in observations {
            let key = observation.key();
            if !keys.contains(key) {
                for (dimension, value) in key.dimensions() {
                    seen.entry(dimension).or_default().insert(value.to_string());
                }
                keys.insert(key.clone());
            }
        }

        let values = seen
            .into_iter()
            .map(|(dimension, set)| {
                let mut values: Vec<String> = set.into_iter().collect();
                values.sort_by(|a, b| compare_values(dimension, a, b));
                let mut front: Vec<String> = leading
                    .iter()
                    .filter(|(d, label)| *d == dimension && values.contains(label))
                    .map(|(_, label)| label.clone())
                    .collect();
                values.retain(|value| !front.contains(value));
                front.extend(values);
                (dimension, front)
            })
            .collect();
        Self { values, keys }
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.values.keys().copied()
    }

    /// Values of `dimension` in display order.
    pub fn values(&self, dimension: Dimension) -> &[String] {
        self.values.get(&dimension).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether some observation carries exactly this key.
    pub fn contains(&self, key: &FilterKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// A selection backed by data: for each dimension in turn, the first
    /// listed value still consistent with the choices made so far.
    pub fn default_selection(&self) -> Option<FilterSelection> {
        let mut remaining: Vec<&FilterKey> = self.keys.iter().collect();
        let mut key = FilterKey::new();
        for (dimension, values) in &self.values {
            let chosen = values.iter().find(|value| {
                remaining
                    .iter()
                    .any(|candidate| candidate.get(*dimension) == Some(value.as_str()))
            });
            match chosen {
                Some(value) => {
                    remaining.retain(|candidate| candidate.get(*dimension) == Some(value.as_str()));
                    key = key.with(*dimension, value.clone());
                }
                None => remaining.retain(|candidate| candidate.get(*dimension).is_none()),
            }
        }
        if !remaining.iter().any(|candidate| **candidate == key) {
            // Keys that omit a dimension other keys carry.
            key = (*remaining.first()?).clone();
        }
        Some(FilterSelection::new(key))
    }
}

/// Years newest first; other dimensions ascending. Numeric tokens compare
/// numerically so `100` sorts after `98`.
fn compare_values(dimension: Dimension, a: &str, b: &str) -> Ordering {
    let ordering = match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    };
    if dimension == Dimension::Year {
        ordering.reverse()
    } else {
        ordering
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twmap_model::CanonicalRegionId;

    fn obs(region: &str, key: FilterKey) -> Observation {
        Observation::new(CanonicalRegionId::new(region), key, 1.0)
    }

    #[test]
    fn test_rollup_first_then_sorted() {
        let observations = vec![
            obs("臺北市", FilterKey::new().with(Dimension::Kind, "大麻")),
            obs("臺北市", FilterKey::new().with(Dimension::Kind, "全部")),
            obs("臺中市", FilterKey::new().with(Dimension::Kind, "安非他命")),
            obs("臺中市", FilterKey::new().with(Dimension::Kind, "全部")),
        ];
        let catalog = FilterCatalog::from_observations(
            &observations,
            &[(Dimension::Kind, "全部".to_string())],
        );
        let kinds = catalog.values(Dimension::Kind);
        assert_eq!(kinds[0], "全部");
        assert_eq!(kinds.len(), 3);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_years_descending_numeric() {
        let observations: Vec<Observation> = ["94", "100", "98", "96"]
            .iter()
            .map(|year| obs("臺北市", FilterKey::new().with(Dimension::Year, *year)))
            .collect();
        let catalog = FilterCatalog::from_observations(&observations, &[]);
        assert_eq!(catalog.values(Dimension::Year), ["100", "98", "96", "94"]);
    }

    #[test]
    fn test_default_selection_is_backed_by_data() {
        let observations = vec![
            obs(
                "臺北市",
                FilterKey::new()
                    .with(Dimension::Segment, "adult")
                    .with(Dimension::Year, "98"),
            ),
            obs(
                "臺北市",
                FilterKey::new()
                    .with(Dimension::Segment, "junior")
                    .with(Dimension::Year, "99"),
            ),
        ];
        let catalog = FilterCatalog::from_observations(&observations, &[]);
        let selection = catalog.default_selection().unwrap();
        assert!(catalog.contains(selection.key()));
        assert_eq!(selection.key().get(Dimension::Segment), Some("adult"));
        assert_eq!(selection.key().get(Dimension::Year), Some("98"));
    }

    #[test]
    fn test_empty_catalog_has_no_default() {
        let catalog = FilterCatalog::from_observations(&[], &[]);
        assert!(catalog.is_empty());
        assert!(catalog.default_selection().is_none());
        assert!(catalog.values(Dimension::Kind).is_empty());
    }
}
