//! Hugging Face Hub orchestration helpers.
//!
//! This module owns remote-specific concerns (reference resolution, file
//! listing and acquisition, data-file selection). Decoding the acquired files
//! lives in `crate::dataset`.

pub mod acquire;
pub mod readme;
pub mod resolve;
pub mod splits;

use std::path::PathBuf;

/// Canonical reference to a Hugging Face dataset repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HfRepoRef {
    pub repo_id: String,
    pub revision: Option<String>,
    pub config: Option<String>,
    pub split: Option<String>,
}

/// Where a dataset is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetLocation {
    /// A dataset repository on the Hub.
    Hub(HfRepoRef),
    /// A directory on the local filesystem laid out like a dataset repository.
    Local {
        root: PathBuf,
        config: Option<String>,
        split: Option<String>,
    },
}

impl DatasetLocation {
    /// Human-readable name used in messages and errors.
    pub fn display_name(&self) -> String {
        match self {
            DatasetLocation::Hub(repo) => repo.repo_id.clone(),
            DatasetLocation::Local { root, .. } => root.display().to_string(),
        }
    }

    pub fn config(&self) -> Option<&str> {
        match self {
            DatasetLocation::Hub(repo) => repo.config.as_deref(),
            DatasetLocation::Local { config, .. } => config.as_deref(),
        }
    }

    pub fn split(&self) -> Option<&str> {
        match self {
            DatasetLocation::Hub(repo) => repo.split.as_deref(),
            DatasetLocation::Local { split, .. } => split.as_deref(),
        }
    }
}
