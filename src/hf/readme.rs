//! Dataset card (`README.md`) front matter: explicit `configs` with
//! per-split `data_files` patterns.

use std::path::Path;

use glob::{MatchOptions, Pattern};
use serde_yaml::Value;

use crate::error::FetchError;

use super::splits::{is_valid_split_name, split_order_key, DataFile, SplitFiles, DEFAULT_SPLIT};

/// One entry of the card's `configs` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardConfig {
    pub name: String,
    pub default: bool,
    /// Split name to glob patterns, in card order. Empty when the card leaves
    /// file discovery to path inference.
    pub data_files: Vec<(String, Vec<String>)>,
}

/// Extract the YAML block between the leading `---` fences, if any.
pub fn front_matter(card: &str) -> Option<&str> {
    let card = card.strip_prefix('\u{feff}').unwrap_or(card);
    let rest = card
        .strip_prefix("---\n")
        .or_else(|| card.strip_prefix("---\r\n"))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// Parse the `configs` list of a dataset card. Cards without front matter or
/// without `configs` yield an empty list.
pub fn parse_card_configs(card: &str, path: &Path) -> Result<Vec<CardConfig>, FetchError> {
    let Some(yaml) = front_matter(card) else {
        return Ok(Vec::new());
    };

    let parse_error = |message: String| FetchError::ReadmeParse {
        path: path.to_path_buf(),
        message,
    };

    let root: Value = serde_yaml::from_str(yaml).map_err(|source| parse_error(source.to_string()))?;
    let Some(configs) = root.get("configs") else {
        return Ok(Vec::new());
    };
    let configs = configs
        .as_sequence()
        .ok_or_else(|| parse_error("'configs' must be a list".to_string()))?;

    let mut parsed = Vec::with_capacity(configs.len());
    for (idx, entry) in configs.iter().enumerate() {
        let name = entry
            .get("config_name")
            .and_then(Value::as_str)
            .ok_or_else(|| parse_error(format!("configs[{idx}] is missing 'config_name'")))?
            .to_string();
        let default = entry
            .get("default")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let data_files = match entry.get("data_files") {
            Some(value) => parse_data_files(value)
                .map_err(|message| parse_error(format!("config '{name}': {message}")))?,
            None => Vec::new(),
        };
        parsed.push(CardConfig {
            name,
            default,
            data_files,
        });
    }

    Ok(parsed)
}

fn parse_data_files(value: &Value) -> Result<Vec<(String, Vec<String>)>, String> {
    if let Some(pattern) = value.as_str() {
        return Ok(vec![(DEFAULT_SPLIT.to_string(), vec![pattern.to_string()])]);
    }

    let items = value
        .as_sequence()
        .ok_or_else(|| "'data_files' must be a string or a list".to_string())?;

    if items.iter().all(|item| item.is_string()) {
        let patterns = items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        return Ok(vec![(DEFAULT_SPLIT.to_string(), patterns)]);
    }

    let mut splits: Vec<(String, Vec<String>)> = Vec::new();
    for item in items {
        let split = item
            .get("split")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SPLIT)
            .to_string();
        if !is_valid_split_name(&split) {
            return Err(format!(
                "invalid split name '{split}' (expected word characters separated by '.')"
            ));
        }
        let patterns = match item.get("path") {
            Some(Value::String(pattern)) => vec![pattern.clone()],
            Some(Value::Sequence(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => return Err(format!("split '{split}' has no 'path'")),
        };
        match splits.iter_mut().find(|(name, _)| *name == split) {
            Some((_, existing)) => existing.extend(patterns),
            None => splits.push((split, patterns)),
        }
    }
    Ok(splits)
}

/// Choose the config to load: the requested one, else the card's default.
pub fn select_config<'a>(
    configs: &'a [CardConfig],
    requested: Option<&str>,
    repo_id: &str,
) -> Result<&'a CardConfig, FetchError> {
    let available = || {
        configs
            .iter()
            .map(|config| config.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    if let Some(requested) = requested {
        return configs
            .iter()
            .find(|config| config.name == requested)
            .ok_or_else(|| FetchError::ConfigNotFound {
                repo_id: repo_id.to_string(),
                requested: requested.to_string(),
                available: available(),
            });
    }

    configs
        .iter()
        .find(|config| config.default)
        .or_else(|| configs.iter().find(|config| config.name == "default"))
        .or_else(|| if configs.len() == 1 { configs.first() } else { None })
        .ok_or_else(|| FetchError::ConfigRequired {
            repo_id: repo_id.to_string(),
            available: available(),
        })
}

/// Resolve a config's patterns against the repository listing.
pub fn resolve_config_files(
    config: &CardConfig,
    paths: &[String],
    repo_id: &str,
) -> Result<SplitFiles, FetchError> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut resolved = Vec::with_capacity(config.data_files.len());
    for (split, patterns) in &config.data_files {
        let mut files: Vec<DataFile> = Vec::new();
        for raw in patterns {
            let pattern = Pattern::new(raw.trim_start_matches("./")).map_err(|source| {
                FetchError::HfResolveError {
                    input: repo_id.to_string(),
                    message: format!("invalid data_files pattern '{raw}': {source}"),
                }
            })?;
            let mut matched: Vec<&String> = paths
                .iter()
                .filter(|path| pattern.matches_with(path, options))
                .collect();
            matched.sort();
            for path in matched {
                if files.iter().any(|file| &file.path == path) {
                    continue;
                }
                if let Some(file) = DataFile::new(path.clone()) {
                    files.push(file);
                }
            }
        }
        if !files.is_empty() {
            resolved.push((split.clone(), files));
        }
    }

    // Card order is kept for custom split names; canonical ones go first.
    resolved.sort_by(|(a, _), (b, _)| split_order_key(a).0.cmp(&split_order_key(b).0));
    Ok(resolved)
}
