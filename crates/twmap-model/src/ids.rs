#![deny(unsafe_code)]

use std::fmt;

/// Normalized key identifying one administrative region.
///
/// Values are produced by the name normalizer; two source strings that denote
/// the same county (or county + township) carry the same id.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct CanonicalRegionId(String);

impl CanonicalRegionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters, not bytes. Region names are CJK text.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for CanonicalRegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalRegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
