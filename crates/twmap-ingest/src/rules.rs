//! Declarative row classification.
//!
//! Source tables mix data rows with rows that only look like data: a second
//! header row of descriptive labels, national totals, and section titles in
//! stacked tables. Each source declares [`RowRule`]s; they are compiled against
//! the header once and evaluated once per row during ingestion.

use serde::{Deserialize, Serialize};

/// One tagged predicate over a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowRule {
    /// The cell in `column` equals `token`: a label row repeated as data.
    HeaderEcho { column: String, token: String },
    /// The cell in `column` is one of `values`: an overall/total row.
    Aggregate { column: String, values: Vec<String> },
    /// The cell in `column` is one of the section `values` and nothing else
    /// is filled: the row titles the section that follows.
    Section { column: String, values: Vec<String> },
}

/// Classification of a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Data,
    Blank,
    HeaderEcho,
    Aggregate,
    Section(String),
}

/// Ordered rule set for one source; the first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRules {
    rules: Vec<RowRule>,
}

impl RowRules {
    pub fn new(rules: Vec<RowRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RowRule] {
        &self.rules
    }

    /// Bind column names to indices. Rules naming absent columns never match.
    pub fn compile<'a>(&'a self, headers: &'a [String]) -> CompiledRules<'a> {
        let index_of = |column: &str| headers.iter().position(|h| h == column.trim());
        let rules = self
            .rules
            .iter()
            .filter_map(|rule| {
                let column = match rule {
                    RowRule::HeaderEcho { column, .. }
                    | RowRule::Aggregate { column, .. }
                    | RowRule::Section { column, .. } => column,
                };
                match index_of(column) {
                    Some(idx) => Some((idx, rule)),
                    None => {
                        tracing::debug!(column = %column, "row rule names a missing column");
                        None
                    }
                }
            })
            .collect();
        CompiledRules { headers, rules }
    }

    /// Classify one row against `headers`.
    pub fn classify(&self, headers: &[String], values: &[String]) -> RowKind {
        self.compile(headers).classify(values)
    }
}

/// Rules bound to a concrete header.
#[derive(Debug)]
pub struct CompiledRules<'a> {
    headers: &'a [String],
    rules: Vec<(usize, &'a RowRule)>,
}

impl CompiledRules<'_> {
    pub fn classify(&self, values: &[String]) -> RowKind {
        if values.iter().all(|value| value.trim().is_empty()) {
            return RowKind::Blank;
        }
        if self.is_header_repeat(values) {
            return RowKind::HeaderEcho;
        }
        for (idx, rule) in &self.rules {
            let cell = values.get(*idx).map(String::as_str).unwrap_or("");
            match rule {
                RowRule::HeaderEcho { token, .. } if same_text(cell, token) => {
                    return RowKind::HeaderEcho;
                }
                RowRule::Aggregate { values: totals, .. }
                    if totals.iter().any(|total| same_text(cell, total)) =>
                {
                    return RowKind::Aggregate;
                }
                RowRule::Section { values: titles, .. }
                    if titles.iter().any(|title| same_text(cell, title))
                        && is_lone_cell(values, *idx) =>
                {
                    return RowKind::Section(cell.trim().to_string());
                }
                _ => {}
            }
        }
        RowKind::Data
    }

    /// The header row itself appearing again as data.
    fn is_header_repeat(&self, values: &[String]) -> bool {
        !self.headers.is_empty()
            && values.len() == self.headers.len()
            && values
                .iter()
                .zip(self.headers)
                .all(|(value, header)| same_text(value, header))
    }
}

/// Equality ignoring all whitespace, including full-width spaces.
fn same_text(left: &str, right: &str) -> bool {
    let strip = |s: &str| s.chars().filter(|ch| !ch.is_whitespace()).collect::<String>();
    let left = strip(left);
    !left.is_empty() && left == strip(right)
}

fn is_lone_cell(values: &[String], idx: usize) -> bool {
    values
        .iter()
        .enumerate()
        .all(|(i, value)| (i == idx) != value.trim().is_empty())
}
