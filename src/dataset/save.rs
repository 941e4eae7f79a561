//! Persist a [`DatasetDict`] in the directory layout `datasets` reads back
//! with `load_from_disk`.
//!
//! ```text
//! <dir>/dataset_dict.json
//! <dir>/<split>/data-00000-of-00001.arrow
//! <dir>/<split>/dataset_info.json
//! <dir>/<split>/state.json
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use arrow::ipc::writer::StreamWriter;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;
use crate::hf::acquire::DataSource;
use crate::hf::splits::{is_valid_split_name, DataFile, DataFormat, SplitFiles};

use super::features::schema_features;
use super::{DatasetDict, DatasetOrigin, Shard, Split};

pub const DATASET_DICT_FILE: &str = "dataset_dict.json";
pub const DATASET_INFO_FILE: &str = "dataset_info.json";
pub const STATE_FILE: &str = "state.json";

#[derive(Debug, Serialize, Deserialize)]
struct DatasetDictFile {
    splits: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DataFileEntry {
    filename: String,
}

#[derive(Debug, Serialize)]
struct StateFile {
    #[serde(rename = "_data_files")]
    data_files: Vec<DataFileEntry>,
    #[serde(rename = "_fingerprint")]
    fingerprint: String,
    #[serde(rename = "_format_columns")]
    format_columns: Option<Vec<String>>,
    #[serde(rename = "_format_kwargs")]
    format_kwargs: serde_json::Map<String, Value>,
    #[serde(rename = "_format_type")]
    format_type: Option<String>,
    #[serde(rename = "_output_all_columns")]
    output_all_columns: bool,
    #[serde(rename = "_split")]
    split: String,
}

/// The part of `state.json` needed to find a saved split's shards.
#[derive(Debug, Deserialize)]
struct SavedState {
    #[serde(rename = "_data_files")]
    data_files: Vec<DataFileEntry>,
}

#[derive(Debug, Serialize)]
struct DatasetInfoFile {
    citation: String,
    description: String,
    features: Value,
    homepage: String,
    license: String,
    config_name: Option<String>,
    splits: Value,
}

/// Write `dict` below `dir`, replacing splits already saved there.
pub fn save_to_disk(dict: &DatasetDict, dir: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(dir).map_err(|source| FetchError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    remove_stale_splits(dict, dir)?;

    for split in dict.splits() {
        save_split(dict.origin(), split, &split_dir(dir, &split.name)?)?;
    }

    let manifest = DatasetDictFile {
        splits: dict.keys().map(str::to_string).collect(),
    };
    write_json(&dir.join(DATASET_DICT_FILE), &manifest)?;

    info!("Saved {} split(s) to {}", dict.splits().len(), dir.display());
    Ok(())
}

fn remove_stale_splits(dict: &DatasetDict, dir: &Path) -> Result<(), FetchError> {
    let manifest_path = dir.join(DATASET_DICT_FILE);
    if !manifest_path.is_file() {
        return Ok(());
    }

    let previous: DatasetDictFile = match fs::read_to_string(&manifest_path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
    {
        Some(previous) => previous,
        None => {
            warn!(
                "Ignoring unreadable {}; leaving existing files in place",
                manifest_path.display()
            );
            return Ok(());
        }
    };

    for stale in previous
        .splits
        .iter()
        .filter(|name| dict.split(name).is_none())
    {
        let Ok(stale_dir) = split_dir(dir, stale) else {
            warn!("Ignoring split '{}' in {}", stale, manifest_path.display());
            continue;
        };
        if stale_dir.is_dir() {
            debug!("Removing stale split directory {}", stale_dir.display());
            fs::remove_dir_all(&stale_dir)?;
        }
    }
    Ok(())
}

/// `dir/<name>`, refusing names that would leave `dir` or replace it.
fn split_dir(dir: &Path, name: &str) -> Result<PathBuf, FetchError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name && !name.starts_with('.') => {
            Ok(dir.join(name))
        }
        _ => Err(FetchError::InvalidSplit {
            name: name.to_string(),
            message: format!("not a directory name inside {}", dir.display()),
        }),
    }
}

fn save_split(origin: &DatasetOrigin, split: &Split, split_dir: &Path) -> Result<(), FetchError> {
    if split_dir.exists() {
        fs::remove_dir_all(split_dir)?;
    }
    fs::create_dir_all(split_dir).map_err(|source| FetchError::CreateDir {
        path: split_dir.to_path_buf(),
        source,
    })?;

    let total = split.shards.len();
    let mut data_files = Vec::with_capacity(total);
    for (idx, shard) in split.shards.iter().enumerate() {
        let filename = shard_file_name(idx, total);
        write_shard(shard, &split_dir.join(&filename))?;
        data_files.push(DataFileEntry { filename });
    }

    let features = split
        .schema()
        .map(|schema| schema_features(schema))
        .unwrap_or_else(|| Value::Object(Default::default()));
    let mut split_infos = serde_json::Map::new();
    split_infos.insert(
        split.name.clone(),
        serde_json::json!({
            "name": split.name,
            "num_examples": split.num_rows(),
            "dataset_name": origin.name,
        }),
    );
    let info = DatasetInfoFile {
        citation: String::new(),
        description: String::new(),
        features,
        homepage: String::new(),
        license: String::new(),
        config_name: origin.config.clone(),
        splits: Value::Object(split_infos),
    };
    write_json(&split_dir.join(DATASET_INFO_FILE), &info)?;

    let state = StateFile {
        data_files,
        fingerprint: fingerprint(origin, split),
        format_columns: None,
        format_kwargs: Default::default(),
        format_type: None,
        output_all_columns: false,
        split: split.name.clone(),
    };
    write_json(&split_dir.join(STATE_FILE), &state)
}

/// Data files of a directory written by [`save_to_disk`], or `None` when the
/// listing has no top-level `dataset_dict.json`.
pub fn resolve_saved_files(
    source: &dyn DataSource,
    files: &[String],
) -> Result<Option<SplitFiles>, FetchError> {
    if !files.iter().any(|path| path == DATASET_DICT_FILE) {
        return Ok(None);
    }

    let manifest_path = source.fetch(DATASET_DICT_FILE)?;
    let manifest: DatasetDictFile = read_json(&manifest_path)?;

    let mut resolved = Vec::with_capacity(manifest.splits.len());
    for split in manifest.splits {
        if !is_valid_split_name(&split) {
            return Err(FetchError::InvalidSplit {
                name: split,
                message: format!("listed in {}", manifest_path.display()),
            });
        }
        let state_path = format!("{split}/{STATE_FILE}");
        if !files.contains(&state_path) {
            return Err(FetchError::DataRead {
                path: PathBuf::from(&state_path),
                message: "saved split has no state file".to_string(),
            });
        }
        let state: SavedState = read_json(&source.fetch(&state_path)?)?;

        let mut data_files = Vec::with_capacity(state.data_files.len());
        for entry in state.data_files {
            let path = format!("{split}/{}", entry.filename);
            if entry.filename.contains('/') || !files.contains(&path) {
                return Err(FetchError::DataRead {
                    path: PathBuf::from(&state_path),
                    message: format!("data file '{}' is not in the dataset", entry.filename),
                });
            }
            data_files.push(DataFile {
                path,
                format: DataFormat::Arrow,
            });
        }
        resolved.push((split, data_files));
    }
    Ok(Some(resolved))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FetchError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| FetchError::DataRead {
        path: path.to_path_buf(),
        message: source.to_string(),
    })
}

/// `data-00000-of-00003.arrow`
pub fn shard_file_name(index: usize, total: usize) -> String {
    format!("data-{:05}-of-{:05}.arrow", index, total.max(1))
}

fn write_shard(shard: &Shard, path: &Path) -> Result<(), FetchError> {
    let write_error = |source: arrow::error::ArrowError| FetchError::DataWrite {
        path: path.to_path_buf(),
        message: source.to_string(),
    };

    let file = File::create(path)?;
    let mut writer =
        StreamWriter::try_new(BufWriter::new(file), &shard.schema).map_err(write_error)?;
    for batch in &shard.batches {
        writer.write(batch).map_err(write_error)?;
    }
    writer.finish().map_err(write_error)?;
    writer.into_inner().map_err(write_error)?.flush()?;

    debug!("Wrote {} rows to {}", shard.num_rows(), path.display());
    Ok(())
}

/// Deterministic fingerprint of a split's provenance.
pub fn fingerprint(origin: &DatasetOrigin, split: &Split) -> String {
    let mut crc = 0u32;
    let mut feed = |part: &str| {
        crc = crc32c::crc32c_append(crc, part.as_bytes());
        crc = crc32c::crc32c_append(crc, &[0]);
    };

    feed(&origin.name);
    feed(origin.revision.as_deref().unwrap_or(""));
    feed(origin.config.as_deref().unwrap_or(""));
    feed(&split.name);
    for shard in &split.shards {
        feed(&shard.source);
    }
    let rows = split.num_rows().to_string();
    feed(&rows);

    format!("{crc:08x}")
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FetchError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| FetchError::DataWrite {
        path: PathBuf::from(path),
        message: source.to_string(),
    })?;
    fs::write(path, text)?;
    Ok(())
}
