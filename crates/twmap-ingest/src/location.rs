use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Query parameter appended to defeat intermediary caches.
const CACHE_BUST_PARAM: &str = "t";

/// Where a source lives: a local path or an http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceLocation {
    Path(PathBuf),
    Url(String),
}

impl SourceLocation {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// Resolve a relative path against `base`; URLs and absolute paths are unchanged.
    #[must_use]
    pub fn resolve_against(self, base: &Path) -> Self {
        match self {
            Self::Path(path) if path.is_relative() => Self::Path(base.join(path)),
            other => other,
        }
    }

    /// URL with `t=<stamp>` appended. Local paths are returned unchanged.
    pub fn with_cache_bust(&self, stamp: i64) -> Result<Self> {
        match self {
            Self::Path(_) => Ok(self.clone()),
            Self::Url(raw) => {
                let mut url = reqwest::Url::parse(raw).map_err(|e| IngestError::InvalidUrl {
                    location: raw.clone(),
                    reason: e.to_string(),
                })?;
                url.query_pairs_mut()
                    .append_pair(CACHE_BUST_PARAM, &stamp.to_string());
                Ok(Self::Url(url.to_string()))
            }
        }
    }

    /// Lowercase file extension, for content-type inference on local files.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            Self::Path(path) => path.as_path(),
            Self::Url(raw) => {
                let without_query = raw.split(['?', '#']).next().unwrap_or(raw);
                Path::new(without_query)
            }
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

impl From<String> for SourceLocation {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for SourceLocation {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<SourceLocation> for String {
    fn from(value: SourceLocation) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}
