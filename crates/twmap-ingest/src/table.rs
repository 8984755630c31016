#![deny(unsafe_code)]

use crate::location::SourceLocation;

/// One data row that survived row classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line number in the source.
    pub line: u64,
    /// Title of the enclosing section, for stacked tables.
    pub section: Option<String>,
    pub values: Vec<String>,
}

/// Rows dropped while reading a source, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub malformed: usize,
    pub blank: usize,
    pub header_echo: usize,
    pub aggregate: usize,
    pub sections: usize,
    /// Dropped by the source's fixed `skip_rows`.
    pub leading: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.malformed + self.blank + self.header_echo + self.aggregate + self.sections + self.leading
    }
}

/// Parsed contents of one tabular source.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub name: String,
    pub location: SourceLocation,
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
    pub skipped: SkipCounts,
}

impl SourceTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        let column = column.trim();
        self.headers.iter().position(|header| header == column)
    }

    /// Cell of `record` at `idx`, empty when out of range.
    pub fn cell<'a>(&self, record: &'a RawRecord, idx: usize) -> &'a str {
        record.values.get(idx).map(String::as_str).unwrap_or("")
    }

    /// Cell of `record` under `column`, `None` when the column does not exist.
    pub fn value<'a>(&self, record: &'a RawRecord, column: &str) -> Option<&'a str> {
        self.column_index(column).map(|idx| self.cell(record, idx))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
