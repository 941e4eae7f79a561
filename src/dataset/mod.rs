//! In-memory dataset handle and the load pipeline that fills it.
//!
//! A [`DatasetDict`] maps split names to [`Split`]s. Each split keeps one
//! [`Shard`] per source data file so that persisted shards line up with what
//! the repository ships.

pub mod features;
pub mod io_arrow;
pub mod io_csv;
pub mod io_json;
pub mod io_parquet;
pub mod save;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{new_null_array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use log::{info, warn};

use crate::error::FetchError;
use crate::hf::acquire::{DataSource, HubOptions, HubSource, LocalSource};
use crate::hf::readme::{parse_card_configs, resolve_config_files, select_config};
use crate::hf::splits::{infer_data_files, is_valid_split_name, DataFile, DataFormat, SplitFiles};
use crate::hf::DatasetLocation;

/// Name of the dataset card at the repository root.
pub const README_FILE: &str = "README.md";

/// Decoded contents of one source data file.
#[derive(Clone, Debug)]
pub struct Shard {
    /// Repository-relative path of the source file.
    pub source: String,
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

impl Shard {
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

/// A named partition of a dataset.
#[derive(Clone, Debug)]
pub struct Split {
    pub name: String,
    pub shards: Vec<Shard>,
}

impl Split {
    pub fn num_rows(&self) -> usize {
        self.shards.iter().map(Shard::num_rows).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema().map(|schema| schema.fields().len()).unwrap_or(0)
    }

    /// Schema of the first shard; all shards are expected to agree.
    pub fn schema(&self) -> Option<&SchemaRef> {
        self.shards.first().map(|shard| &shard.schema)
    }
}

/// Where a [`DatasetDict`] came from, used for fingerprints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetOrigin {
    pub name: String,
    pub revision: Option<String>,
    pub config: Option<String>,
}

/// Dataset handle: ordered splits, immutable once loaded.
#[derive(Clone, Debug)]
pub struct DatasetDict {
    origin: DatasetOrigin,
    splits: Vec<Split>,
}

impl DatasetDict {
    /// Build a dict from splits. Split names must be unique and usable as
    /// directory names.
    pub fn new(origin: DatasetOrigin, splits: Vec<Split>) -> Result<Self, FetchError> {
        for (idx, split) in splits.iter().enumerate() {
            if !is_valid_split_name(&split.name) {
                return Err(FetchError::InvalidSplit {
                    name: split.name.clone(),
                    message: "expected word characters separated by '.'".to_string(),
                });
            }
            if splits[..idx].iter().any(|other| other.name == split.name) {
                return Err(FetchError::InvalidSplit {
                    name: split.name.clone(),
                    message: "split appears more than once".to_string(),
                });
            }
        }
        Ok(Self { origin, splits })
    }

    pub fn origin(&self) -> &DatasetOrigin {
        &self.origin
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn split(&self, name: &str) -> Option<&Split> {
        self.splits.iter().find(|split| split.name == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.splits.iter().map(|split| split.name.as_str())
    }

    pub fn num_rows(&self) -> usize {
        self.splits.iter().map(Split::num_rows).sum()
    }
}

/// Fetch a dataset from the Hub or a local directory and decode it.
pub fn load_dataset(
    location: &DatasetLocation,
    hub: &HubOptions,
) -> Result<DatasetDict, FetchError> {
    match location {
        DatasetLocation::Hub(repo_ref) => {
            let source = HubSource::connect(repo_ref, hub)?;
            load_from_source(&source, location.config(), location.split())
        }
        DatasetLocation::Local { root, .. } => {
            let source = LocalSource::new(root);
            load_from_source(&source, location.config(), location.split())
        }
    }
}

/// Load a dataset through any [`DataSource`].
pub fn load_from_source(
    source: &dyn DataSource,
    config: Option<&str>,
    split: Option<&str>,
) -> Result<DatasetDict, FetchError> {
    let listing = source.list_files()?;
    let (mut split_files, config) = resolve_data_files(source, &listing.files, config)?;

    if split_files.is_empty() {
        return Err(FetchError::NoDataFiles {
            repo_id: source.name().to_string(),
        });
    }

    if let Some(requested) = split {
        let available = split_files
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        split_files.retain(|(name, _)| name == requested);
        if split_files.is_empty() {
            return Err(FetchError::SplitNotFound {
                repo_id: source.name().to_string(),
                requested: requested.to_string(),
                available,
            });
        }
    }

    let mut splits = Vec::with_capacity(split_files.len());
    for (name, files) in split_files {
        info!("Loading split '{}' from {} file(s)", name, files.len());
        let mut shards = Vec::with_capacity(files.len());
        for file in files {
            let local = source.fetch(&file.path)?;
            shards.push(read_shard(&file, &local)?);
        }
        let shards = unify_schemas(&name, shards)?;
        splits.push(Split { name, shards });
    }

    DatasetDict::new(
        DatasetOrigin {
            name: source.name().to_string(),
            revision: listing.revision,
            config,
        },
        splits,
    )
}

fn resolve_data_files(
    source: &dyn DataSource,
    files: &[String],
    config: Option<&str>,
) -> Result<(SplitFiles, Option<String>), FetchError> {
    let has_card = files.iter().any(|path| path == README_FILE);
    if has_card {
        let card_path = source.fetch(README_FILE)?;
        let card = std::fs::read_to_string(&card_path)?;
        let configs = parse_card_configs(&card, &card_path)?;
        if !configs.is_empty() {
            let selected = select_config(&configs, config, source.name())?;
            info!("Using dataset card config '{}'", selected.name);
            let split_files = if selected.data_files.is_empty() {
                infer_data_files(files)
            } else {
                resolve_config_files(selected, files, source.name())?
            };
            return Ok((split_files, Some(selected.name.clone())));
        }
    }

    if let Some(config) = config {
        return Err(FetchError::ConfigNotFound {
            repo_id: source.name().to_string(),
            requested: config.to_string(),
            available: String::new(),
        });
    }

    if let Some(split_files) = save::resolve_saved_files(source, files)? {
        info!("'{}' is a saved dataset; loading its Arrow shards", source.name());
        return Ok((split_files, None));
    }

    Ok((infer_data_files(files), None))
}

fn read_shard(file: &DataFile, local: &Path) -> Result<Shard, FetchError> {
    let (schema, batches) = match file.format {
        DataFormat::Parquet => io_parquet::read_parquet(local)?,
        DataFormat::Arrow => io_arrow::read_arrow(local)?,
        DataFormat::Json => io_json::read_json(local)?,
        DataFormat::Csv => io_csv::read_csv(local)?,
    };
    Ok(Shard {
        source: file.path.clone(),
        schema,
        batches,
    })
}

/// Give every shard of a split the same schema. Columns missing from a shard
/// are filled with nulls; incompatible column types are an error.
fn unify_schemas(split: &str, shards: Vec<Shard>) -> Result<Vec<Shard>, FetchError> {
    if shards
        .iter()
        .all(|shard| shard.schema.fields() == shards[0].schema.fields())
    {
        return Ok(shards);
    }

    warn!(
        "Split '{}': shards have different columns, merging their schemas",
        split
    );

    let mut merged = Schema::empty();
    for shard in &shards {
        let fields = Schema::new(shard.schema.fields().clone());
        merged = Schema::try_merge([merged, fields])
            .map_err(|source| read_error(Path::new(&shard.source), source))?;
    }
    let merged: SchemaRef = Arc::new(Schema::new(
        merged
            .fields()
            .iter()
            .map(|field| field.as_ref().clone().with_nullable(true))
            .collect::<Vec<_>>(),
    ));

    shards
        .into_iter()
        .map(|shard| {
            let path = PathBuf::from(&shard.source);
            let batches = shard
                .batches
                .iter()
                .map(|batch| conform_batch(batch, &merged))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| read_error(&path, source))?;
            Ok(Shard {
                source: shard.source,
                schema: merged.clone(),
                batches,
            })
        })
        .collect()
}

fn conform_batch(
    batch: &RecordBatch,
    schema: &SchemaRef,
) -> Result<RecordBatch, arrow::error::ArrowError> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(column) if column.data_type() == field.data_type() => Ok(column.clone()),
            Some(column) => cast(column, field.data_type()),
            None => Ok(new_null_array(field.data_type(), batch.num_rows())),
        })
        .collect::<Result<Vec<ArrayRef>, _>>()?;
    RecordBatch::try_new(schema.clone(), columns)
}

/// Map a decoder error for `path` into [`FetchError::DataRead`].
pub(crate) fn read_error(path: &Path, source: impl std::fmt::Display) -> FetchError {
    FetchError::DataRead {
        path: PathBuf::from(path),
        message: source.to_string(),
    }
}
