//! Region-name normalization.
//!
//! Tabular sources and geometry sources spell the same county differently:
//! `台北市` vs `臺北市`, `縣市=臺中市`, trailing spaces, or a full street
//! address where only the county matters. [`NameNormalizer`] folds all of them
//! into one [`CanonicalRegionId`](twmap_model::CanonicalRegionId) space.
//!
//! Steps, in order:
//!
//! 1. strip known field-label prefixes (`<label>=`), repeatedly
//! 2. collapse variant glyphs to their canonical glyph
//! 3. trim surrounding whitespace
//! 4. truncate to the caller's [`Granularity`]

mod config;
mod normalizer;

pub use config::{Granularity, NormalizerConfig, COUNTY_CHARS, TOWNSHIP_CHARS};
pub use normalizer::NameNormalizer;
