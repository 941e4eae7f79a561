//! dataset-fetch: download a Hugging Face Hub dataset and save it to disk.
//!
//! The crate resolves a dataset reference, fetches its data files through the
//! `hf-hub` cache, decodes them into Arrow record batches and writes them in
//! the directory layout the Python `datasets` library loads with
//! `load_from_disk`.
//!
//! # Modules
//!
//! - [`hf`]: Hub references, file listing/acquisition and split resolution
//! - [`dataset`]: In-memory dataset handle, decoders and persistence
//! - [`report`]: Download summaries
//! - [`error`]: Error types for dataset-fetch operations

pub mod dataset;
pub mod error;
pub mod hf;
pub mod report;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::info;

pub use error::FetchError;

use crate::dataset::{load_dataset, save::save_to_disk};
use crate::hf::acquire::HubOptions;
use crate::hf::resolve::parse_dataset_input;
use crate::report::{DownloadReport, TROUBLESHOOTING};

/// Dataset fetched when `--repo_id` is not given.
pub const DEFAULT_REPO_ID: &str = "AgentGym/AgentGym-RL-Data-ID";

/// Save directory used when `--save_path` is not given.
pub const DEFAULT_SAVE_PATH: &str = "/workspace/dataset";

/// The download-dataset CLI application.
#[derive(Parser, Debug)]
#[command(name = "download-dataset")]
#[command(version, about = "Download a Hugging Face dataset and save it to a local directory")]
struct Cli {
    /// Hugging Face repository ID, dataset URL, or local dataset directory.
    #[arg(long = "repo_id", alias = "repo-id", default_value = DEFAULT_REPO_ID)]
    repo_id: String,

    /// Local directory to save the dataset to.
    #[arg(long = "save_path", alias = "save-path", default_value = DEFAULT_SAVE_PATH)]
    save_path: PathBuf,

    /// Cache directory for downloaded files (defaults to the hf-hub cache).
    #[arg(long = "cache_dir", alias = "cache-dir")]
    cache_dir: Option<PathBuf>,

    /// Branch, tag or commit to download.
    #[arg(long)]
    revision: Option<String>,

    /// Dataset config name from the dataset card.
    #[arg(long, alias = "config")]
    name: Option<String>,

    /// Only download this split.
    #[arg(long)]
    split: Option<String>,

    /// Hugging Face access token.
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Hub endpoint, for mirrors or self-hosted hubs.
    #[arg(long, env = "HF_ENDPOINT")]
    endpoint: Option<String>,

    /// Hide download progress bars.
    #[arg(long, short)]
    quiet: bool,

    /// Output format for the summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Summary output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Everything needed for one download.
#[derive(Clone, Debug)]
pub struct DownloadRequest {
    pub repo_id: String,
    pub save_path: PathBuf,
    pub cache_dir: Option<PathBuf>,
    pub revision: Option<String>,
    pub config: Option<String>,
    pub split: Option<String>,
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub progress: bool,
}

impl DownloadRequest {
    /// Request for `repo_id` saved to `save_path`, with library defaults for
    /// everything else.
    pub fn new(repo_id: impl Into<String>, save_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_id: repo_id.into(),
            save_path: save_path.into(),
            cache_dir: None,
            revision: None,
            config: None,
            split: None,
            token: None,
            endpoint: None,
            progress: false,
        }
    }
}

impl Cli {
    fn request(&self) -> DownloadRequest {
        DownloadRequest {
            repo_id: self.repo_id.clone(),
            save_path: self.save_path.clone(),
            cache_dir: self.cache_dir.clone(),
            revision: self.revision.clone(),
            config: self.name.clone(),
            split: self.split.clone(),
            token: self.token.clone().filter(|token| !token.is_empty()),
            endpoint: self.endpoint.clone().filter(|endpoint| !endpoint.is_empty()),
            progress: !self.quiet && self.output == OutputFormat::Text,
        }
    }
}

/// Run the download-dataset CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), FetchError> {
    let cli = Cli::parse();
    run_download(&cli.request(), cli.output)
}

/// Execute one download and print its outcome.
fn run_download(request: &DownloadRequest, output: OutputFormat) -> Result<(), FetchError> {
    std::fs::create_dir_all(&request.save_path).map_err(|source| FetchError::CreateDir {
        path: request.save_path.clone(),
        source,
    })?;

    if output == OutputFormat::Text {
        println!("Downloading dataset from: {}", request.repo_id);
        println!("Saving to: {}", request.save_path.display());
        println!("This may take a while depending on your internet connection...");
    }

    match download(request) {
        Ok(report) => {
            match output {
                OutputFormat::Text => {
                    println!();
                    print!("{}", report);
                }
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&report).map_err(|source| {
                        FetchError::DataWrite {
                            path: PathBuf::from("<stdout>"),
                            message: source.to_string(),
                        }
                    })?;
                    println!("{json}");
                }
            }
            Ok(())
        }
        Err(err) => {
            eprintln!();
            eprintln!("✗ Error downloading dataset: {err}");
            eprintln!();
            eprintln!("Troubleshooting:");
            for (idx, hint) in TROUBLESHOOTING.iter().enumerate() {
                eprintln!("{}. {}", idx + 1, hint);
            }
            Err(err)
        }
    }
}

/// Fetch the requested dataset and save it to `request.save_path`.
pub fn download(request: &DownloadRequest) -> Result<DownloadReport, FetchError> {
    let location = parse_dataset_input(
        &request.repo_id,
        request.revision.as_deref(),
        request.config.as_deref(),
        request.split.as_deref(),
    )?;
    info!("Loading dataset '{}'", location.display_name());

    let hub = HubOptions {
        cache_dir: request.cache_dir.clone(),
        token: request.token.clone(),
        endpoint: request.endpoint.clone(),
        progress: request.progress,
    };
    let dict = load_dataset(&location, &hub)?;
    save_to_disk(&dict, &request.save_path)?;

    Ok(DownloadReport::new(&dict, request.save_path.clone()))
}
