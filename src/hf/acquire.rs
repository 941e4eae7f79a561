use std::path::{Path, PathBuf};

use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use log::{debug, info};
use walkdir::WalkDir;

use crate::error::FetchError;

use super::HfRepoRef;

/// Connection settings for the Hub client.
#[derive(Clone, Debug, Default)]
pub struct HubOptions {
    pub cache_dir: Option<PathBuf>,
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub progress: bool,
}

/// Files of a dataset repository and the revision they were listed at.
#[derive(Clone, Debug, Default)]
pub struct RepoListing {
    pub files: Vec<String>,
    pub revision: Option<String>,
}

/// A place dataset files can be listed and fetched from.
pub trait DataSource {
    /// Identifier used in messages, errors and fingerprints.
    fn name(&self) -> &str;

    /// List every file, as `/`-separated paths relative to the dataset root.
    fn list_files(&self) -> Result<RepoListing, FetchError>;

    /// Make a listed file available locally and return its path.
    fn fetch(&self, path: &str) -> Result<PathBuf, FetchError>;
}

/// Dataset repository on the Hugging Face Hub, fetched through the local
/// `hf-hub` cache.
pub struct HubSource {
    repo_id: String,
    repo: ApiRepo,
}

impl HubSource {
    pub fn connect(repo_ref: &HfRepoRef, options: &HubOptions) -> Result<Self, FetchError> {
        let mut builder = ApiBuilder::new().with_progress(options.progress);

        if let Some(cache_dir) = options.cache_dir.as_ref() {
            builder = builder.with_cache_dir(cache_dir.clone());
        }
        if let Some(endpoint) = options.endpoint.as_ref() {
            builder = builder.with_endpoint(endpoint.clone());
        }
        if options.token.is_some() {
            builder = builder.with_token(options.token.clone());
        }

        let api = builder.build().map_err(|source| FetchError::HfApiError {
            repo_id: repo_ref.repo_id.clone(),
            message: source.to_string(),
        })?;

        let repo = if let Some(revision) = repo_ref.revision.as_ref() {
            api.repo(Repo::with_revision(
                repo_ref.repo_id.clone(),
                RepoType::Dataset,
                revision.clone(),
            ))
        } else {
            api.dataset(repo_ref.repo_id.clone())
        };

        Ok(Self {
            repo_id: repo_ref.repo_id.clone(),
            repo,
        })
    }
}

impl DataSource for HubSource {
    fn name(&self) -> &str {
        &self.repo_id
    }

    fn list_files(&self) -> Result<RepoListing, FetchError> {
        let repo_info = self.repo.info().map_err(|source| FetchError::HfApiError {
            repo_id: self.repo_id.clone(),
            message: source.to_string(),
        })?;

        info!(
            "Listed {} files in '{}' at {}",
            repo_info.siblings.len(),
            self.repo_id,
            repo_info.sha
        );

        Ok(RepoListing {
            files: repo_info
                .siblings
                .into_iter()
                .map(|sibling| sibling.rfilename)
                .collect(),
            revision: Some(repo_info.sha),
        })
    }

    fn fetch(&self, path: &str) -> Result<PathBuf, FetchError> {
        debug!("Fetching '{}' from '{}'", path, self.repo_id);
        self.repo
            .get(path)
            .map_err(|source| FetchError::HfAcquireError {
                repo_id: self.repo_id.clone(),
                message: format!("failed downloading '{}': {}", path, source),
            })
    }
}

/// Dataset laid out in a local directory.
pub struct LocalSource {
    name: String,
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: &Path) -> Self {
        Self {
            name: root.display().to_string(),
            root: root.to_path_buf(),
        }
    }
}

impl DataSource for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_files(&self) -> Result<RepoListing, FetchError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|source| FetchError::HfAcquireError {
                repo_id: self.name.clone(),
                message: source.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let components: Vec<String> = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(components.join("/"));
        }
        files.sort();

        Ok(RepoListing {
            files,
            revision: None,
        })
    }

    fn fetch(&self, path: &str) -> Result<PathBuf, FetchError> {
        let local = self.root.join(path);
        if local.is_file() {
            Ok(local)
        } else {
            Err(FetchError::HfAcquireError {
                repo_id: self.name.clone(),
                message: format!("'{}' is not a file", local.display()),
            })
        }
    }
}
