use std::path::Path;

use crate::error::FetchError;

use super::{DatasetLocation, HfRepoRef};

const MAX_REPO_ID_LEN: usize = 96;

/// Parse a user-supplied dataset reference (local directory, repo ID or
/// dataset URL).
pub fn parse_dataset_input(
    input: &str,
    revision: Option<&str>,
    config: Option<&str>,
    split: Option<&str>,
) -> Result<DatasetLocation, FetchError> {
    let path = Path::new(input);
    if path.is_dir() {
        return Ok(DatasetLocation::Local {
            root: path.to_path_buf(),
            config: config.map(str::to_string),
            split: split.map(str::to_string),
        });
    }
    if looks_like_path(input) {
        return Err(FetchError::HfResolveError {
            input: input.to_string(),
            message: "local dataset directory does not exist".to_string(),
        });
    }

    parse_hf_input(input, revision, config, split).map(DatasetLocation::Hub)
}

/// Parse a user-supplied HF dataset reference (repo ID or dataset URL).
pub fn parse_hf_input(
    input: &str,
    revision: Option<&str>,
    config: Option<&str>,
    split: Option<&str>,
) -> Result<HfRepoRef, FetchError> {
    let (repo_id, revision_from_url) =
        if input.starts_with("http://") || input.starts_with("https://") {
            parse_repo_id_from_url(input)?
        } else {
            (validate_repo_id(input)?, None)
        };

    let merged_revision = match (revision, revision_from_url) {
        (Some(arg), Some(url_rev)) if arg != url_rev => {
            return Err(FetchError::HfResolveError {
                input: input.to_string(),
                message: format!(
                    "conflicting revisions: --revision='{}' but URL encodes revision='{}'",
                    arg, url_rev
                ),
            });
        }
        (Some(arg), _) => Some(arg.to_string()),
        (None, Some(url_rev)) => Some(url_rev),
        (None, None) => None,
    };

    Ok(HfRepoRef {
        repo_id,
        revision: merged_revision,
        config: config.map(str::to_string),
        split: split.map(str::to_string),
    })
}

fn looks_like_path(input: &str) -> bool {
    input.starts_with('/')
        || input.starts_with("./")
        || input.starts_with("../")
        || input == "."
        || input == ".."
        || input.contains('\\')
}

fn parse_repo_id_from_url(input: &str) -> Result<(String, Option<String>), FetchError> {
    let url = url::Url::parse(input).map_err(|source| FetchError::HfResolveError {
        input: input.to_string(),
        message: format!("invalid URL: {source}"),
    })?;

    let host = url
        .host_str()
        .ok_or_else(|| FetchError::HfResolveError {
            input: input.to_string(),
            message: "URL is missing a host".to_string(),
        })?
        .to_ascii_lowercase();

    if host != "huggingface.co" {
        return Err(FetchError::HfResolveError {
            input: input.to_string(),
            message: format!("expected host 'huggingface.co', found '{}'", host),
        });
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|iter| iter.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 3 || segments[0] != "datasets" {
        return Err(FetchError::HfResolveError {
            input: input.to_string(),
            message:
                "expected dataset URL like https://huggingface.co/datasets/<namespace>/<dataset>"
                    .to_string(),
        });
    }

    let repo_id = validate_repo_id(&format!("{}/{}", segments[1], segments[2]))?;

    let revision = if segments.get(3) == Some(&"tree") {
        segments.get(4).map(|value| (*value).to_string())
    } else {
        None
    };

    Ok((repo_id, revision))
}

/// Validate a Hub repo id: `<dataset>` or `<namespace>/<dataset>`.
pub fn validate_repo_id(repo_id: &str) -> Result<String, FetchError> {
    let trimmed = repo_id.trim();
    let invalid = |message: &str| FetchError::HfResolveError {
        input: repo_id.to_string(),
        message: message.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("repo id is empty"));
    }
    if trimmed.len() > MAX_REPO_ID_LEN {
        return Err(invalid("repo id is longer than 96 characters"));
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() > 2 || parts.iter().any(|part| part.is_empty()) {
        return Err(invalid(
            "expected repo id in '<dataset>' or '<namespace>/<dataset>' form",
        ));
    }

    for part in &parts {
        if !part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid(
                "repo id may only contain ASCII letters, digits, '-', '_' and '.'",
            ));
        }
        if part.starts_with(['-', '.']) || part.ends_with(['-', '.']) {
            return Err(invalid("repo id segments cannot start or end with '-' or '.'"));
        }
    }

    if trimmed.contains("--") || trimmed.contains("..") {
        return Err(invalid("repo id cannot contain '--' or '..'"));
    }

    Ok(trimmed.to_string())
}
