//! JSON and CSV export of product records
//!
//! CSV layout: fixed columns first, then every specification key seen across
//! the records in first-appearance order. Missing values are empty cells.

use crate::bulk::{BulkReport, ItemOutcome};
use psf_common::ProductRecord;
use std::collections::HashSet;

/// Fixed leading columns of the record CSV
pub const FIXED_COLUMNS: &[&str] = &[
    "brand",
    "model",
    "category",
    "price_range",
    "availability",
    "sources",
    "citations",
];

/// Separator for list-valued cells (sources, citations)
const LIST_SEPARATOR: &str = "; ";

/// Pretty-printed JSON array of records
pub fn records_to_json(records: &[ProductRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// CSV with one row per record
pub fn records_to_csv(records: &[ProductRecord]) -> String {
    let spec_keys = spec_columns(records.iter());

    let mut out = String::new();
    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(spec_headers(&spec_keys));
    write_row(&mut out, &header);

    for record in records {
        write_row(&mut out, &record_cells(Some(record), &spec_keys));
    }
    out
}

/// CSV for a bulk report: query and status columns, then the record columns
///
/// Failed items keep their query and error message; record cells stay empty.
pub fn bulk_to_csv(report: &BulkReport) -> String {
    let spec_keys = spec_columns(report.items.iter().filter_map(|i| i.record()));

    let mut out = String::new();
    let mut header = vec!["query".to_string(), "status".to_string(), "error".to_string()];
    header.extend(FIXED_COLUMNS.iter().map(|c| c.to_string()));
    header.extend(spec_headers(&spec_keys));
    write_row(&mut out, &header);

    for item in &report.items {
        let mut row = vec![item.query.clone()];
        match &item.outcome {
            ItemOutcome::Ok { record } => {
                row.push("ok".to_string());
                row.push(String::new());
                row.extend(record_cells(Some(record), &spec_keys));
            }
            ItemOutcome::Error { error } => {
                row.push("error".to_string());
                row.push(format!("{}: {}", error.code, error.message));
                row.extend(record_cells(None, &spec_keys));
            }
        }
        write_row(&mut out, &row);
    }
    out
}

/// Union of specification keys, first appearance wins the position
fn spec_columns<'a, I>(records: I) -> Vec<String>
where
    I: Iterator<Item = &'a ProductRecord>,
{
    let mut keys: Vec<String> = Vec::new();
    for record in records {
        for key in record.specifications.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

/// Header names for the spec columns
///
/// Keys that clash with a fixed column get a `spec.` prefix; any remaining
/// clash is broken with trailing underscores.
fn spec_headers(spec_keys: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = FIXED_COLUMNS
        .iter()
        .chain(["query", "status", "error"].iter())
        .map(|c| c.to_string())
        .collect();

    spec_keys
        .iter()
        .map(|key| {
            let mut name = if taken.contains(key) {
                format!("spec.{}", key)
            } else {
                key.clone()
            };
            while taken.contains(&name) {
                name.push('_');
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

fn record_cells(record: Option<&ProductRecord>, spec_keys: &[String]) -> Vec<String> {
    let Some(record) = record else {
        return vec![String::new(); FIXED_COLUMNS.len() + spec_keys.len()];
    };

    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let mut cells = vec![
        text(&record.brand),
        text(&record.model),
        text(&record.category),
        text(&record.price_range),
        text(&record.availability),
        record.sources.join(LIST_SEPARATOR),
        record.citations.join(LIST_SEPARATOR),
    ];
    cells.extend(
        spec_keys
            .iter()
            .map(|k| record.specifications.get(k).cloned().unwrap_or_default()),
    );
    cells
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Append one CSV row (RFC 4180 quoting) terminated by a newline
fn write_row(out: &mut String, row: &[String]) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if needs_quotes(cell) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::BulkItem;
    use crate::types::FailureInfo;
    use uuid::Uuid;

    fn record(brand: &str, specs: &[(&str, &str)]) -> ProductRecord {
        ProductRecord {
            brand: Some(brand.into()),
            specifications: specs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            sources: vec!["demo".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_header_is_union_of_spec_keys() {
        let records = vec![
            record("A", &[("x", "1"), ("y", "2")]),
            record("B", &[("y", "3"), ("z", "4")]),
        ];

        let csv = records_to_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "brand,model,category,price_range,availability,sources,citations,x,y,z"
        );
        assert_eq!(lines[1], "A,,,,,demo,,1,2,");
        assert_eq!(lines[2], "B,,,,,demo,,,3,4");
    }

    #[test]
    fn test_quoting() {
        let mut r = record("Dell", &[("screen_size", "24-inch (23.8\" viewable)")]);
        r.price_range = Some("$200 - $280, typical".into());
        r.sources = vec!["icecat".into(), "gemini".into()];

        let csv = records_to_csv(&[r]);
        let row = csv.lines().nth(1).unwrap();

        assert_eq!(
            row,
            "Dell,,,\"$200 - $280, typical\",,icecat; gemini,,\"24-inch (23.8\"\" viewable)\""
        );
    }

    #[test]
    fn test_colliding_spec_key_is_prefixed() {
        let csv = records_to_csv(&[record("Tesla", &[("model", "Long Range")])]);
        assert!(csv.lines().next().unwrap().ends_with(",citations,spec.model"));
    }

    #[test]
    fn test_prefixed_key_does_not_duplicate_literal_key() {
        let records = vec![
            record("A", &[("model", "Long Range")]),
            record("B", &[("spec.model", "Plaid")]),
        ];

        let csv = records_to_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();

        assert!(lines[0].ends_with(",citations,spec.model,spec.model_"));
        assert_eq!(lines[1], "A,,,,,demo,,Long Range,");
        assert_eq!(lines[2], "B,,,,,demo,,,Plaid");
    }

    #[test]
    fn test_empty_record_list_has_header_only() {
        let csv = records_to_csv(&[]);
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_bulk_csv_rows_follow_items() {
        let report = BulkReport {
            batch_id: Uuid::new_v4(),
            items: vec![
                BulkItem {
                    query: "Sony WH-1000XM5".into(),
                    outcome: ItemOutcome::Ok {
                        record: record("Sony", &[("weight", "250g")]),
                    },
                },
                BulkItem {
                    query: "   ".into(),
                    outcome: ItemOutcome::Error {
                        error: FailureInfo {
                            code: "INVALID_QUERY".into(),
                            message: "Invalid query: query is empty".into(),
                        },
                    },
                },
            ],
            succeeded: 1,
            failed: 1,
        };

        let csv = bulk_to_csv(&report);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "query,status,error,brand,model,category,price_range,availability,sources,citations,weight"
        );
        assert_eq!(lines[1], "Sony WH-1000XM5,ok,,Sony,,,,,demo,,250g");
        assert_eq!(lines[2], "   ,error,INVALID_QUERY: Invalid query: query is empty,,,,,,,,");
    }

    #[test]
    fn test_json_export_is_array() {
        let json = records_to_json(&[record("Apple", &[])]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["brand"], "Apple");
        assert!(parsed[0].get("price_range").is_none());
    }
}
