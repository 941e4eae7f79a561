#![allow(dead_code)]

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// JSON Lines file with `rows` objects of the form `{"id": n, "text": "row n"}`.
pub fn write_jsonl(path: &Path, rows: usize) {
    let body: String = (0..rows)
        .map(|i| format!("{{\"id\":{i},\"text\":\"row {i}\"}}\n"))
        .collect();
    write_file(path, &body);
}

/// Parquet file with `rows` rows of `(id: int64, text: utf8)`.
pub fn write_parquet(path: &Path, rows: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("text", DataType::Utf8, false),
    ]));
    let ids: Vec<i64> = (0..rows as i64).collect();
    let texts: Vec<String> = (0..rows).map(|i| format!("row {i}")).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(texts)),
        ],
    )
    .expect("build batch");

    let file = File::create(path).expect("create parquet file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("parquet writer");
    writer.write(&batch).expect("write batch");
    writer.close().expect("close parquet writer");
}

/// A small hub-style dataset: parquet train shards plus a JSONL test split.
pub fn create_local_dataset(root: &Path) {
    write_parquet(&root.join("data/train-00000-of-00002.parquet"), 3);
    write_parquet(&root.join("data/train-00001-of-00002.parquet"), 2);
    write_parquet(&root.join("data/test-00000-of-00001.parquet"), 4);
    write_file(&root.join(".gitattributes"), "*.parquet filter=lfs\n");
}

/// Every file below `root`, relative and sorted, with its bytes.
pub fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.expect("walk entry"))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("relative path")
                .to_string_lossy()
                .into_owned();
            (relative, fs::read(entry.path()).expect("read file"))
        })
        .collect();
    files.sort();
    files
}
