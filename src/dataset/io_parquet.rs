//! Parquet data files.

use std::fs::File;
use std::path::Path;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::FetchError;

use super::read_error;

/// Decode every row group of a Parquet file into record batches.
pub fn read_parquet(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), FetchError> {
    let file = File::open(path).map_err(FetchError::Io)?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|source| read_error(path, source))?;
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(|source| read_error(path, source))?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| read_error(path, source))?;

    Ok((schema, batches))
}
