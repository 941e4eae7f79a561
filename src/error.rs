use std::path::PathBuf;
use thiserror::Error;

/// The main error type for dataset-fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset reference '{input}': {message}")]
    HfResolveError { input: String, message: String },

    #[error("Hugging Face API error for '{repo_id}': {message}")]
    HfApiError { repo_id: String, message: String },

    #[error("Failed to acquire files from '{repo_id}': {message}")]
    HfAcquireError { repo_id: String, message: String },

    #[error("Failed to parse dataset card {path}: {message}")]
    ReadmeParse { path: PathBuf, message: String },

    #[error("Config '{requested}' not found in '{repo_id}' (available: {available})")]
    ConfigNotFound {
        repo_id: String,
        requested: String,
        available: String,
    },

    #[error("Dataset '{repo_id}' has several configs, pick one with --name (available: {available})")]
    ConfigRequired { repo_id: String, available: String },

    #[error("Split '{requested}' not found in '{repo_id}' (available: {available})")]
    SplitNotFound {
        repo_id: String,
        requested: String,
        available: String,
    },

    #[error("Invalid split name '{name}': {message}")]
    InvalidSplit { name: String, message: String },

    #[error("No supported data files (parquet, arrow, jsonl, json, csv, tsv) found in '{repo_id}'")]
    NoDataFiles { repo_id: String },

    #[error("Failed to read data file {path}: {message}")]
    DataRead { path: PathBuf, message: String },

    #[error("Failed to write {path}: {message}")]
    DataWrite { path: PathBuf, message: String },
}
