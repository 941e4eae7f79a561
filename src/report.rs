//! Download summary and failure guidance.
//!
//! The summary renders as text (Display) for the terminal or serializes as
//! JSON for scripts.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::dataset::DatasetDict;

/// Generic hints printed after any failed download.
pub const TROUBLESHOOTING: &[&str] = &[
    "Check your internet connection",
    "Verify the repository ID is correct",
    "For private or gated datasets, set HF_TOKEN or pass --token",
    "Check that the save path and cache directory are writable",
];

/// Outcome of a successful download.
#[derive(Clone, Debug, Serialize)]
pub struct DownloadReport {
    /// Dataset that was fetched (repo id or local directory).
    pub dataset: String,
    /// Commit the files were listed at, for Hub datasets.
    pub revision: Option<String>,
    /// Config selected from the dataset card, if any.
    pub config: Option<String>,
    /// Directory the dataset was saved to.
    pub save_path: PathBuf,
    /// Per-split summaries in dataset order.
    pub splits: Vec<SplitSummary>,
}

/// Counts for one saved split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitSummary {
    pub name: String,
    pub num_rows: usize,
    pub num_columns: usize,
    pub num_shards: usize,
}

impl DownloadReport {
    pub fn new(dict: &DatasetDict, save_path: PathBuf) -> Self {
        let origin = dict.origin();
        Self {
            dataset: origin.name.clone(),
            revision: origin.revision.clone(),
            config: origin.config.clone(),
            save_path,
            splits: dict
                .splits()
                .iter()
                .map(|split| SplitSummary {
                    name: split.name.clone(),
                    num_rows: split.num_rows(),
                    num_columns: split.num_columns(),
                    num_shards: split.shards.len(),
                })
                .collect(),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.splits.iter().map(|split| split.num_rows).sum()
    }
}

impl fmt::Display for DownloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "✓ Dataset successfully downloaded to: {}",
            self.save_path.display()
        )?;
        writeln!(f)?;
        writeln!(f, "Dataset structure:")?;
        let keys: Vec<&str> = self.splits.iter().map(|split| split.name.as_str()).collect();
        writeln!(f, "  Keys: {:?}", keys)?;
        for split in &self.splits {
            writeln!(f, "  {}: {} examples", split.name, split.num_rows)?;
        }
        Ok(())
    }
}
