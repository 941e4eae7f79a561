//! JSON and JSON Lines data files.
//!
//! A file may hold newline-delimited objects or a single top-level array of
//! objects. Rows are parsed with `serde_json`, the Arrow schema is inferred
//! from all rows, and the rows are then decoded in fixed-size batches.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::json::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use serde_json::Value;

use crate::error::FetchError;

use super::read_error;

/// Rows decoded per record batch.
pub const BATCH_SIZE: usize = 1024;

/// Read a `.json` or `.jsonl` file into record batches.
pub fn read_json(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), FetchError> {
    let rows = read_json_rows(path)?;
    rows_to_batches(path, &rows)
}

/// Parse every row of a JSON or JSON Lines file.
pub fn read_json_rows(path: &Path) -> Result<Vec<Value>, FetchError> {
    let file = File::open(path).map_err(FetchError::Io)?;
    let stream = serde_json::Deserializer::from_reader(BufReader::new(file)).into_iter::<Value>();

    let mut rows = Vec::new();
    for (idx, value) in stream.enumerate() {
        let value = value.map_err(|source| read_error(path, format!("value {}: {source}", idx + 1)))?;
        match value {
            Value::Array(items) if idx == 0 => rows.extend(items),
            other => rows.push(other),
        }
    }

    if let Some(pos) = rows.iter().position(|row| !row.is_object()) {
        return Err(read_error(
            path,
            format!("row {}: expected a JSON object", pos + 1),
        ));
    }

    Ok(rows)
}

/// Infer a schema for `rows` and decode them into record batches.
pub fn rows_to_batches(
    path: &Path,
    rows: &[Value],
) -> Result<(SchemaRef, Vec<RecordBatch>), FetchError> {
    let schema = infer_json_schema_from_iterator(rows.iter().map(Ok::<_, ArrowError>))
        .map_err(|source| read_error(path, source))?;
    let schema = Arc::new(schema);

    let mut decoder = ReaderBuilder::new(schema.clone())
        .with_batch_size(BATCH_SIZE)
        .with_coerce_primitive(true)
        .build_decoder()
        .map_err(|source| read_error(path, source))?;

    let mut batches = Vec::with_capacity(rows.len().div_ceil(BATCH_SIZE));
    for chunk in rows.chunks(BATCH_SIZE) {
        decoder
            .serialize(chunk)
            .map_err(|source| read_error(path, source))?;
        if let Some(batch) = decoder.flush().map_err(|source| read_error(path, source))? {
            batches.push(batch);
        }
    }

    Ok((schema, batches))
}
