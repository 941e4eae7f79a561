//! CSV and TSV data files.
//!
//! Columns are typed the way tabular loaders usually do it: a column whose
//! non-empty cells all parse as integers becomes an integer column, then
//! floats, then booleans, and anything else stays a string. Empty cells are
//! null. Typed rows go through the JSON decoder. Repeated header names get a
//! `.1`, `.2`, ... suffix.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use csv::{ReaderBuilder, StringRecord};
use serde_json::{Map, Number, Value};

use crate::error::FetchError;

use super::io_json::rows_to_batches;
use super::read_error;

/// Inferred type of a CSV column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Integer,
    Float,
    Boolean,
    Text,
}

/// Read a `.csv` (comma) or `.tsv` (tab) file into record batches.
pub fn read_csv(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), FetchError> {
    let is_tsv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);

    let mut reader = ReaderBuilder::new()
        .delimiter(if is_tsv { b'\t' } else { b',' })
        .has_headers(true)
        .from_path(path)
        .map_err(|source| read_error(path, source))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| read_error(path, source))?
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name.to_string()
            }
        })
        .collect();
    let headers = dedupe_headers(headers);

    let records = reader
        .records()
        .collect::<Result<Vec<StringRecord>, _>>()
        .map_err(|source| read_error(path, source))?;

    if records.is_empty() {
        let fields: Vec<Field> = headers
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect();
        return Ok((Arc::new(Schema::new(fields)), Vec::new()));
    }

    let kinds: Vec<CellKind> = (0..headers.len())
        .map(|col| column_kind(records.iter().filter_map(|record| record.get(col))))
        .collect();

    // Every record has one cell per header; the reader rejects ragged rows.
    let rows: Vec<Value> = records
        .iter()
        .map(|record| {
            let row: Map<String, Value> = headers
                .iter()
                .zip(&kinds)
                .zip(record.iter())
                .map(|((name, kind), cell)| (name.clone(), typed_cell(cell, *kind)))
                .collect();
            Value::Object(row)
        })
        .collect();

    rows_to_batches(path, &rows)
}

/// Rename repeated headers to `name.1`, `name.2`, ... so no column is lost.
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = headers.iter().cloned().collect();
    let mut used: HashSet<String> = HashSet::with_capacity(headers.len());
    headers
        .into_iter()
        .map(|name| {
            if used.insert(name.clone()) {
                return name;
            }
            let mut suffix = 1;
            loop {
                let candidate = format!("{name}.{suffix}");
                if !seen.contains(&candidate) {
                    seen.insert(candidate.clone());
                    used.insert(candidate.clone());
                    return candidate;
                }
                suffix += 1;
            }
        })
        .collect()
}

/// Narrowest kind that fits every non-empty cell.
pub fn column_kind<'a>(cells: impl Iterator<Item = &'a str>) -> CellKind {
    let mut kind = None;
    for cell in cells.map(str::trim).filter(|cell| !cell.is_empty()) {
        let cell_kind = cell_kind(cell);
        kind = Some(match (kind, cell_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(CellKind::Integer), CellKind::Float) | (Some(CellKind::Float), CellKind::Integer) => {
                CellKind::Float
            }
            _ => CellKind::Text,
        });
        if kind == Some(CellKind::Text) {
            break;
        }
    }
    kind.unwrap_or(CellKind::Text)
}

fn cell_kind(cell: &str) -> CellKind {
    if cell.parse::<i64>().is_ok() {
        CellKind::Integer
    } else if cell
        .parse::<f64>()
        .map(|value| value.is_finite())
        .unwrap_or(false)
    {
        CellKind::Float
    } else if parse_bool(cell).is_some() {
        CellKind::Boolean
    } else {
        CellKind::Text
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Convert one cell to a JSON value of the column's kind.
pub fn typed_cell(cell: &str, kind: CellKind) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match kind {
        CellKind::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(cell.to_string())),
        CellKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        CellKind::Boolean => parse_bool(trimmed)
            .map(Value::Bool)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        CellKind::Text => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use arrow::datatypes::DataType;

    use super::*;

    #[test]
    fn column_kinds_widen() {
        assert_eq!(column_kind(["1", "2", ""].into_iter()), CellKind::Integer);
        assert_eq!(column_kind(["1", "2.5"].into_iter()), CellKind::Float);
        assert_eq!(column_kind(["true", "False"].into_iter()), CellKind::Boolean);
        assert_eq!(column_kind(["1", "yes"].into_iter()), CellKind::Text);
        assert_eq!(column_kind(["", " "].into_iter()), CellKind::Text);
    }

    #[test]
    fn empty_cells_are_null() {
        assert_eq!(typed_cell("  ", CellKind::Integer), Value::Null);
        assert_eq!(typed_cell("3", CellKind::Float), serde_json::json!(3.0));
    }

    #[test]
    fn csv_columns_keep_header_order_and_types() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("train.csv");
        fs::write(&path, "text,label,score\nhello,1,0.5\n\"a, b\",0,\n").expect("write");

        let (schema, batches) = read_csv(&path).expect("read csv");
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["text", "label", "score"]);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 2);
    }

    #[test]
    fn tsv_uses_tabs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("test.tsv");
        fs::write(&path, "a\tb\nx,y\t2\n").expect("write");

        let (schema, batches) = read_csv(&path).expect("read tsv");
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 1);
    }

    #[test]
    fn header_only_csv_keeps_its_columns() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("train.csv");
        fs::write(&path, "question,answer\n").expect("write");

        let (schema, batches) = read_csv(&path).expect("read csv");
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["question", "answer"]);
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert!(batches.is_empty());
    }

    #[test]
    fn repeated_headers_are_renamed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("train.csv");
        fs::write(&path, "a,a,b\n1,2,x\n").expect("write");

        let (schema, batches) = read_csv(&path).expect("read csv");
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["a", "a.1", "b"]);
        assert_eq!(batches[0].num_columns(), 3);
    }

    #[test]
    fn dedupe_skips_names_already_taken() {
        let headers = ["a", "a.1", "a"].map(str::to_string).to_vec();
        assert_eq!(dedupe_headers(headers), vec!["a", "a.1", "a.2"]);
    }
}
