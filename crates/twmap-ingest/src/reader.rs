//! Delimited-text parsing with row classification.

use csv::ReaderBuilder;

use crate::descriptor::SourceDescriptor;
use crate::error::{IngestError, Result};
use crate::rules::RowKind;
use crate::table::{RawRecord, SkipCounts, SourceTable};

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Parse a fetched payload into a [`SourceTable`].
///
/// Short rows are padded with empty cells, since exports routinely drop
/// trailing delimiters. Rows the CSV reader rejects, and rows with non-empty
/// cells past the header, are counted as malformed and skipped; the rest of
/// the file loads.
pub fn parse_table(descriptor: &SourceDescriptor, bytes: &[u8]) -> Result<SourceTable> {
    let location = descriptor.location.to_string();
    let delimiter = descriptor.delimiter_byte()?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut skipped = SkipCounts::default();
    let mut raw_rows: Vec<(u64, Vec<String>)> = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = record.position().map_or(0, csv::Position::line);
                raw_rows.push((line, record.iter().map(normalize_cell).collect()));
            }
            Err(error) => {
                if error.is_io_error() {
                    return Err(IngestError::Csv {
                        location,
                        message: error.to_string(),
                    });
                }
                skipped.malformed += 1;
                tracing::debug!(source = %descriptor.name, %error, "skipping malformed row");
            }
        }
    }

    let mut rows = raw_rows
        .into_iter()
        .skip_while(|(_, values)| values.iter().all(String::is_empty));
    let mut pending_first = None;
    let headers: Vec<String> = if descriptor.has_header_row {
        let (_, header_row) = rows
            .next()
            .ok_or_else(|| IngestError::MissingHeader {
                location: location.clone(),
            })?;
        match &descriptor.columns {
            Some(columns) => columns.clone(),
            None => header_row.iter().map(|value| normalize_header(value)).collect(),
        }
    } else if let Some(columns) = &descriptor.columns {
        columns.clone()
    } else {
        let first = rows.next().ok_or_else(|| IngestError::MissingHeader {
            location: location.clone(),
        })?;
        let width = first.1.len();
        pending_first = Some(first);
        (1..=width).map(|idx| format!("column_{idx}")).collect()
    };

    let rules = descriptor.rules.compile(&headers);
    let mut section: Option<String> = None;
    let mut records = Vec::new();
    let mut leading = descriptor.skip_rows;
    for (line, mut values) in pending_first.into_iter().chain(rows) {
        if leading > 0 {
            leading -= 1;
            skipped.leading += 1;
            continue;
        }
        if values.len() > headers.len() {
            if values[headers.len()..].iter().any(|value| !value.is_empty()) {
                skipped.malformed += 1;
                tracing::debug!(
                    source = %descriptor.name,
                    line,
                    expected = headers.len(),
                    found = values.len(),
                    "skipping row wider than the header"
                );
                continue;
            }
            values.truncate(headers.len());
        }
        values.resize(headers.len(), String::new());
        match rules.classify(&values) {
            RowKind::Data => records.push(RawRecord {
                line,
                section: section.clone(),
                values,
            }),
            RowKind::Blank => skipped.blank += 1,
            RowKind::HeaderEcho => skipped.header_echo += 1,
            RowKind::Aggregate => skipped.aggregate += 1,
            RowKind::Section(label) => {
                skipped.sections += 1;
                section = Some(label);
            }
        }
    }

    Ok(SourceTable {
        name: descriptor.name.clone(),
        location: descriptor.location.clone(),
        headers,
        records,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RowRule, RowRules};

    fn drug_descriptor() -> SourceDescriptor {
        SourceDescriptor::new("drug_data1", "drug_data1.csv").with_rules(RowRules::new(vec![
            RowRule::HeaderEcho {
                column: "oc_addr".to_string(),
                token: "發生地點".to_string(),
            },
        ]))
    }

    #[test]
    fn test_parse_with_label_row() {
        let csv = "\u{feff}oc_addr,kind\n發生地點,毒品品項\n台北市中正區,安非他命\n新北市板橋區,大麻\n";
        let table = parse_table(&drug_descriptor(), csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["oc_addr", "kind"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.skipped.header_echo, 1);
        assert_eq!(table.records[0].values, vec!["台北市中正區", "安非他命"]);
        assert_eq!(table.records[0].line, 3);
    }

    #[test]
    fn test_over_wide_rows_skipped_not_fatal() {
        let csv = "oc_addr,kind\n臺中市西區,海洛因\n高雄市苓雅區,大麻,多一欄\n臺南市東區,安非他命\n";
        let table = parse_table(&drug_descriptor(), csv.as_bytes()).unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.skipped.malformed, 1);
    }

    #[test]
    fn test_short_rows_padded() {
        let descriptor = SourceDescriptor::new("smoking", "smoking.csv");
        let csv = "縣市,94年吸菸率,96年吸菸率,98年吸菸率\n臺北市,30,28,25\n花蓮縣,40\n";
        let table = parse_table(&descriptor, csv.as_bytes()).unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.skipped.malformed, 0);
        assert_eq!(table.records[1].values, vec!["花蓮縣", "40", "", ""]);
    }

    #[test]
    fn test_trailing_empty_cells_tolerated() {
        let csv = "oc_addr,kind\n臺中市西區,海洛因,,\n";
        let table = parse_table(&drug_descriptor(), csv.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.skipped.malformed, 0);
    }

    #[test]
    fn test_invalid_utf8_row_skipped() {
        let mut bytes = b"oc_addr,kind\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe,bad\n");
        bytes.extend_from_slice("臺北市,大麻\n".as_bytes());
        let table = parse_table(&drug_descriptor(), &bytes).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.skipped.malformed, 1);
    }

    #[test]
    fn test_headerless_source_synthesizes_columns() {
        let descriptor = SourceDescriptor::new("t", "t.tsv")
            .with_delimiter('\t')
            .without_header(None);
        let table = parse_table(&descriptor, "臺北市\t1\n花蓮縣\t2\n".as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["column_1", "column_2"]);
        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn test_headerless_source_with_named_columns() {
        let descriptor = SourceDescriptor::new("t", "t.csv")
            .without_header(Some(vec!["county".to_string(), "rate".to_string()]));
        let table = parse_table(&descriptor, "臺北市,1\n".as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["county", "rate"]);
        assert_eq!(table.records.len(), 1);
    }

    #[test]
    fn test_empty_source_has_no_header() {
        let result = parse_table(&drug_descriptor(), b"\n\n");
        assert!(matches!(result, Err(IngestError::MissingHeader { .. })));
    }

    #[test]
    fn test_sections_tag_following_rows() {
        let descriptor = SourceDescriptor::new("s", "s.csv").with_rules(RowRules::new(vec![
            RowRule::Aggregate {
                column: "縣市".to_string(),
                values: vec!["總計".to_string()],
            },
            RowRule::Section {
                column: "縣市".to_string(),
                values: vec!["成人".to_string(), "國中".to_string()],
            },
        ]));
        let csv = "縣市,94年男性吸菸率\n成人,\n總計,30.1\n臺北市,25.0\n國中,\n臺北市,3.2\n";
        let table = parse_table(&descriptor, csv.as_bytes()).unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].section.as_deref(), Some("成人"));
        assert_eq!(table.records[1].section.as_deref(), Some("國中"));
        assert_eq!(table.skipped.aggregate, 1);
        assert_eq!(table.skipped.sections, 2);
    }

    #[test]
    fn test_section_titles_without_trailing_delimiters() {
        let descriptor = SourceDescriptor::new("s", "s.csv").with_rules(RowRules::new(vec![
            RowRule::Section {
                column: "縣市".to_string(),
                values: vec!["成人".to_string(), "國中".to_string()],
            },
        ]));
        let csv = "縣市,94年吸菸率,96年吸菸率\n成人\n臺北市,30,28\n國中\n臺北市,5,4\n";
        let table = parse_table(&descriptor, csv.as_bytes()).unwrap();

        assert_eq!(table.skipped.malformed, 0);
        let sections: Vec<Option<&str>> = table
            .records
            .iter()
            .map(|record| record.section.as_deref())
            .collect();
        assert_eq!(sections, vec![Some("成人"), Some("國中")]);
    }

    #[test]
    fn test_region_row_without_values_keeps_section() {
        let descriptor = SourceDescriptor::new("s", "s.csv").with_rules(RowRules::new(vec![
            RowRule::Section {
                column: "縣市".to_string(),
                values: vec!["成人".to_string()],
            },
        ]));
        let csv = "縣市,94年吸菸率,96年吸菸率\n成人,,\n臺北市,30,28\n連江縣,,\n臺中市,40,38\n";
        let table = parse_table(&descriptor, csv.as_bytes()).unwrap();

        assert_eq!(table.skipped.sections, 1);
        assert_eq!(table.records.len(), 3);
        assert!(
            table
                .records
                .iter()
                .all(|record| record.section.as_deref() == Some("成人"))
        );
    }

    #[test]
    fn test_skip_rows_drops_leading_rows() {
        let mut descriptor = drug_descriptor();
        descriptor.skip_rows = 1;
        let csv = "oc_addr,kind\n說明,說明\n臺北市,大麻\n";
        let table = parse_table(&descriptor, csv.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.skipped.leading, 1);
    }
}
