//! Data-file discovery and split inference for repositories without an
//! explicit `configs` block in their dataset card.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

/// Split every dataset falls back to when file names carry no split.
pub const DEFAULT_SPLIT: &str = "train";

/// Metadata written next to saved datasets; never treated as rows.
pub const METADATA_FILES: &[&str] = &[
    "dataset_dict.json",
    "dataset_info.json",
    "dataset_infos.json",
    "state.json",
];

/// Whether `name` is usable as a split name: word characters, optionally
/// joined by single dots (`train`, `test.v2`).
pub fn is_valid_split_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_')
        })
}

/// On-disk encoding of a data file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataFormat {
    Parquet,
    Arrow,
    Json,
    Csv,
}

impl DataFormat {
    /// Format of a repository path, or `None` when it is not a data file.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "parquet" => Some(DataFormat::Parquet),
            "arrow" => Some(DataFormat::Arrow),
            "jsonl" | "json" => Some(DataFormat::Json),
            "csv" | "tsv" => Some(DataFormat::Csv),
            _ => None,
        }
    }
}

/// A data file assigned to a split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFile {
    pub path: String,
    pub format: DataFormat,
}

impl DataFile {
    pub fn new(path: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let format = DataFormat::from_path(&path)?;
        Some(Self { path, format })
    }
}

/// Split name to data files, in resolution order.
pub type SplitFiles = Vec<(String, Vec<DataFile>)>;

/// Infer split assignment from repository file paths alone.
pub fn infer_data_files(paths: &[String]) -> SplitFiles {
    let candidates: Vec<DataFile> = paths
        .iter()
        .filter(|path| !is_hidden(path) && !is_metadata(path))
        .filter_map(|path| DataFile::new(path.clone()))
        .collect();

    let Some(format) = dominant_format(&candidates) else {
        return Vec::new();
    };

    let mut assigned: BTreeMap<String, Vec<DataFile>> = BTreeMap::new();
    let mut unassigned = Vec::new();
    for file in candidates.into_iter().filter(|file| file.format == format) {
        match infer_split_from_path(&file.path) {
            Some(split) => assigned.entry(split).or_default().push(file),
            None => unassigned.push(file),
        }
    }

    if assigned.is_empty() {
        unassigned.sort_by(|a, b| a.path.cmp(&b.path));
        return vec![(DEFAULT_SPLIT.to_string(), unassigned)];
    }

    for file in &unassigned {
        debug!("Ignoring '{}': no split in its path", file.path);
    }

    let mut splits: SplitFiles = assigned
        .into_iter()
        .map(|(split, mut files)| {
            files.sort_by(|a, b| a.path.cmp(&b.path));
            (split, files)
        })
        .collect();
    splits.sort_by(|(a, _), (b, _)| split_order_key(a).cmp(&split_order_key(b)));
    splits
}

/// Ordering used for split listings: train, validation, test, then the rest
/// alphabetically.
pub fn split_order_key(name: &str) -> (u8, &str) {
    let rank = match name {
        "train" => 0,
        "validation" => 1,
        "test" => 2,
        _ => 3,
    };
    (rank, name)
}

fn dominant_format(files: &[DataFile]) -> Option<DataFormat> {
    let mut counts: BTreeMap<DataFormat, usize> = BTreeMap::new();
    for file in files {
        *counts.entry(file.format).or_default() += 1;
    }
    // BTreeMap iterates in enum order, so ties keep the earlier format.
    counts
        .into_iter()
        .fold(None, |best: Option<(DataFormat, usize)>, (format, count)| {
            match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((format, count)),
            }
        })
        .map(|(format, _)| format)
}

fn is_hidden(path: &str) -> bool {
    path.split('/')
        .any(|component| component.starts_with('.') || component.starts_with("__"))
}

fn is_metadata(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    METADATA_FILES.contains(&file_name)
}

/// Infer the split a repository path belongs to.
pub fn infer_split_from_path(path: &str) -> Option<String> {
    let parsed = Path::new(path);
    let file_name = parsed.file_name().and_then(|name| name.to_str())?;

    if let Some(split) = sharded_split_name(path, file_name) {
        return Some(split);
    }

    let stem = parsed
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name);
    if let Some(split) = split_from_component(stem) {
        return Some(split.to_string());
    }

    parsed
        .parent()
        .into_iter()
        .flat_map(|parent| parent.components().rev())
        .filter_map(|component| component.as_os_str().to_str())
        .find_map(split_from_component)
        .map(str::to_string)
}

/// `data/<split>-00000-of-00003.parquet`, the layout written by `push_to_hub`.
fn sharded_split_name(path: &str, file_name: &str) -> Option<String> {
    if !path.starts_with("data/") && !path.contains("/data/") {
        return None;
    }
    let stem = file_name.rsplit_once('.').map(|(stem, _)| stem)?;
    let (prefix, total) = stem.rsplit_once("-of-")?;
    let (split, index) = prefix.rsplit_once('-')?;
    let is_index = |value: &str| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
    if !is_valid_split_name(split) || !is_index(index) || !is_index(total) {
        return None;
    }
    Some(normalize_split_name(split).unwrap_or(split).to_string())
}

fn split_from_component(component: &str) -> Option<&'static str> {
    component
        .split(|c: char| matches!(c, '-' | '_' | '.' | ' ') || c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .find_map(normalize_split_name)
}

/// Map split keywords to canonical split names.
pub fn normalize_split_name(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "train" | "training" => Some("train"),
        "validation" | "valid" | "val" | "dev" => Some("validation"),
        "test" | "testing" | "eval" | "evaluation" => Some("test"),
        _ => None,
    }
}
