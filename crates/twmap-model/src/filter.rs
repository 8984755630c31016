//! Filter dimensions, composite filter keys, and the consumer's selection.

#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A non-region dimension that observations are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Population segment (adult, junior high, senior high, ...).
    Segment,
    /// Substance or survey type.
    Kind,
    Year,
    Gender,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Segment,
        Dimension::Kind,
        Dimension::Year,
        Dimension::Gender,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::Kind => "kind",
            Self::Year => "year",
            Self::Gender => "gender",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segment" | "population" | "pop" => Ok(Self::Segment),
            "kind" | "substance" | "survey" => Ok(Self::Kind),
            "year" => Ok(Self::Year),
            "gender" | "sex" => Ok(Self::Gender),
            _ => Err(ModelError::UnknownDimension(s.to_string())),
        }
    }
}

/// Composite of the non-region dimensions of an observation.
///
/// Unset dimensions are part of the key: a key with only `kind` set never
/// equals a key with `kind` and `year` set.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FilterKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
}

impl FilterKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.slot(dimension).as_deref()
    }

    pub fn set(&mut self, dimension: Dimension, value: Option<String>) {
        *self.slot_mut(dimension) = value;
    }

    #[must_use]
    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.set(dimension, Some(value.into()));
        self
    }

    #[must_use]
    pub fn without(mut self, dimension: Dimension) -> Self {
        self.set(dimension, None);
        self
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|dim| self.get(*dim).is_none())
    }

    /// Set dimensions in canonical order.
    pub fn dimensions(&self) -> impl Iterator<Item = (Dimension, &str)> {
        Dimension::ALL
            .into_iter()
            .filter_map(|dim| self.get(dim).map(|value| (dim, value)))
    }

    /// Equality on every dimension except the `free` ones.
    pub fn matches_except(&self, other: &FilterKey, free: &[Dimension]) -> bool {
        Dimension::ALL
            .iter()
            .filter(|dim| !free.contains(*dim))
            .all(|dim| self.get(*dim) == other.get(*dim))
    }

    fn slot(&self, dimension: Dimension) -> &Option<String> {
        match dimension {
            Dimension::Segment => &self.segment,
            Dimension::Kind => &self.kind,
            Dimension::Year => &self.year,
            Dimension::Gender => &self.gender,
        }
    }

    fn slot_mut(&mut self, dimension: Dimension) -> &mut Option<String> {
        match dimension {
            Dimension::Segment => &mut self.segment,
            Dimension::Kind => &mut self.kind,
            Dimension::Year => &mut self.year,
            Dimension::Gender => &mut self.gender,
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(no dimensions)");
        }
        let mut first = true;
        for (dim, value) in self.dimensions() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{dim}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// The combination of dimension values currently chosen by the filter control.
///
/// Read-only to the pipeline; every change arrives as a fresh value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection {
    key: FilterKey,
}

impl FilterSelection {
    pub fn new(key: FilterKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &FilterKey {
        &self.key
    }

    #[must_use]
    pub fn with(self, dimension: Dimension, value: impl Into<String>) -> Self {
        Self {
            key: self.key.with(dimension, value),
        }
    }

    /// Exact match on every dimension, including unset ones.
    pub fn matches(&self, key: &FilterKey) -> bool {
        &self.key == key
    }
}

impl From<FilterKey> for FilterSelection {
    fn from(key: FilterKey) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}
