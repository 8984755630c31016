//! Join of aggregated statistics to geometry.

use twmap_geo::DisplayNameAdapter;
use twmap_model::{AggregatedStat, CanonicalRegionId, RegionGeometry, RenderFeature, RenderFrame};
use twmap_normalize::NameNormalizer;

use crate::color::ColorScale;

/// Binds an [`AggregatedStat`] to geometry by canonical region id.
///
/// Reads both inputs and mutates neither. Geometry names are normalized with
/// the same normalizer (and so the same granularity) that built the stat.
pub struct ChoroplethBinder<'a> {
    normalizer: &'a NameNormalizer,
    names: &'a dyn DisplayNameAdapter,
    scale: &'a ColorScale,
}

impl<'a> ChoroplethBinder<'a> {
    pub fn new(
        normalizer: &'a NameNormalizer,
        names: &'a dyn DisplayNameAdapter,
        scale: &'a ColorScale,
    ) -> Self {
        Self {
            normalizer,
            names,
            scale,
        }
    }

    /// One feature per geometry, in geometry order. Regions the stat does not
    /// cover carry no value and [`ColorKey::NoData`](twmap_model::ColorKey::NoData).
    pub fn bind<'g>(
        &self,
        stat: &AggregatedStat,
        geometries: &'g [RegionGeometry],
    ) -> Vec<RenderFeature<'g>> {
        geometries
            .iter()
            .map(|geometry| {
                let name = self.names.display_name(geometry).unwrap_or_default();
                let region = self
                    .normalizer
                    .region_id(&name)
                    .unwrap_or_else(|| CanonicalRegionId::new(""));
                let value = if region.is_empty() {
                    None
                } else {
                    stat.get(&region)
                };
                RenderFeature {
                    geometry,
                    index: geometry.index(),
                    name,
                    region,
                    value,
                    color: self.scale.classify(value, &stat.domain),
                }
            })
            .collect()
    }

    /// Features plus the domain and summary the render sink needs.
    pub fn frame<'g>(
        &self,
        stat: &AggregatedStat,
        geometries: &'g [RegionGeometry],
    ) -> RenderFrame<'g> {
        let features = self.bind(stat, geometries);
        let unmatched: Vec<&CanonicalRegionId> = stat
            .values
            .keys()
            .filter(|region| !features.iter().any(|feature| &feature.region == *region))
            .collect();
        if !unmatched.is_empty() {
            tracing::debug!(
                count = unmatched.len(),
                regions = ?unmatched,
                "aggregated regions without geometry"
            );
        }
        RenderFrame {
            selection: stat.selection.clone(),
            domain: stat.domain,
            summary: stat.summary,
            features,
        }
    }
}
