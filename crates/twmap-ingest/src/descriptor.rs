use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::location::SourceLocation;
use crate::rules::RowRules;

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

/// How to find and read one tabular source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Stable name used in logs and reports.
    pub name: String,
    pub location: SourceLocation,
    #[serde(default = "default_true")]
    pub has_header_row: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Append `t=<unix millis>` to remote locations.
    #[serde(default)]
    pub cache_bust: bool,
    /// Column names to use instead of (or in the absence of) a header row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Data rows to drop unconditionally after the header.
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default)]
    pub rules: RowRules,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, location: impl Into<SourceLocation>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            has_header_row: true,
            delimiter: default_delimiter(),
            cache_bust: false,
            columns: None,
            skip_rows: 0,
            rules: RowRules::default(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: RowRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn without_header(mut self, columns: Option<Vec<String>>) -> Self {
        self.has_header_row = false;
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_cache_bust(mut self, enable: bool) -> Self {
        self.cache_bust = enable;
        self
    }

    /// The delimiter as the single byte the CSV reader needs.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(IngestError::InvalidDelimiter {
                location: self.location.to_string(),
                delimiter: self.delimiter,
            })
        }
    }

    /// Location to fetch, with the cache-busting parameter applied when enabled.
    pub fn fetch_location(&self) -> Result<SourceLocation> {
        if self.cache_bust {
            self.location
                .with_cache_bust(chrono::Utc::now().timestamp_millis())
        } else {
            Ok(self.location.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_toml() {
        let text = r#"
            name = "drug_data1"
            location = "data/drug_data1.csv"
        "#;
        let descriptor: SourceDescriptor = toml::from_str(text).unwrap();
        assert!(descriptor.has_header_row);
        assert_eq!(descriptor.delimiter, ',');
        assert!(!descriptor.cache_bust);
        assert_eq!(descriptor.delimiter_byte().unwrap(), b',');
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let descriptor = SourceDescriptor::new("x", "x.csv").with_delimiter('，');
        assert!(matches!(
            descriptor.delimiter_byte(),
            Err(IngestError::InvalidDelimiter { .. })
        ));
    }

    #[test]
    fn test_fetch_location_busts_only_remote() {
        let remote = SourceDescriptor::new("r", "https://example.org/r.csv").with_cache_bust(true);
        let url = remote.fetch_location().unwrap().to_string();
        assert!(url.starts_with("https://example.org/r.csv?t="));

        let local = SourceDescriptor::new("l", "l.csv").with_cache_bust(true);
        assert_eq!(local.fetch_location().unwrap(), local.location);
    }
}
