//! Command-line interface parsing for the triples CLI
//!
//! This module handles parsing of CLI arguments using clap and resolves them,
//! together with the API key from the environment, into a [`StartupConfig`].

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::{default_snapshot_path, DEFAULT_VIDEO_TTL_SECS};
use crate::youtube::http::DEFAULT_REQUEST_TIMEOUT;
use crate::youtube::{DEFAULT_MIN_INTERVAL, YOUTUBE_API_BASE_URL};

/// Environment variable holding the YouTube Data API key
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Channel looked up when no handle is given
pub const DEFAULT_CHANNEL: &str = "triplescosmos";

/// Error types for CLI argument resolution
#[derive(Debug, Error)]
pub enum CliError {
    /// No API key in the environment
    #[error("YOUTUBE_API_KEY is not set")]
    MissingApiKey,

    /// The channel handle is blank
    #[error("Channel handle must not be empty")]
    EmptyChannel,
}

/// triples - print the latest upload of a YouTube channel
#[derive(Parser, Debug)]
#[command(name = "triples")]
#[command(about = "Print the latest upload of a YouTube channel")]
#[command(version)]
pub struct Cli {
    /// YouTube channel handle to look up
    #[arg(long = "ch", visible_alias = "channel", value_name = "HANDLE", default_value = DEFAULT_CHANNEL)]
    pub channel: String,

    /// Cache snapshot file (defaults to triples_cache.json in the temp directory)
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Check the API key, cache directory and API reachability, then exit
    #[arg(long)]
    pub health: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything needed to build the client chain
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Channel handle to look up
    pub channel: String,
    /// YouTube Data API key
    pub api_key: String,
    /// Where the cache snapshot is stored
    pub cache_file: PathBuf,
    /// Root of the YouTube Data API
    pub api_base_url: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Minimum spacing between API calls
    pub min_interval: Duration,
    /// How long a latest-video lookup is cached
    pub video_ttl: chrono::Duration,
}

/// Reads the API key from [`API_KEY_ENV`], treating an empty value as unset
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

impl StartupConfig {
    /// Creates a configuration with default paths, timeouts and intervals
    pub fn new(channel: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            api_key: api_key.into(),
            cache_file: default_snapshot_path(),
            api_base_url: YOUTUBE_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            min_interval: DEFAULT_MIN_INTERVAL,
            video_ttl: chrono::Duration::seconds(DEFAULT_VIDEO_TTL_SECS),
        }
    }

    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    /// * `api_key` - The API key, usually from [`api_key_from_env`]
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the key is missing or the handle is blank
    pub fn from_cli(cli: &Cli, api_key: Option<String>) -> Result<Self, CliError> {
        let channel = cli.channel.trim();
        if channel.is_empty() {
            return Err(CliError::EmptyChannel);
        }

        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(CliError::MissingApiKey)?;

        let mut config = Self::new(channel, api_key);
        if let Some(cache_file) = &cli.cache_file {
            config.cache_file = cache_file.clone();
        }

        Ok(config)
    }
}
