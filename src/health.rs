//! `--health` self check
//!
//! Verifies that an API key is configured, that the cache directory (and the
//! directory of an explicit `--cache-file`) can be written, and that the
//! YouTube API answers at all. Checks run in order and
//! stop at the first failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::youtube::YOUTUBE_API_BASE_URL;

/// How long the reachability probe waits for any answer
const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(2);

/// File written and removed to prove the cache directory is writable
const PROBE_FILE_NAME: &str = ".health_probe";

/// Reasons the health check can fail
#[derive(Debug, Error)]
pub enum HealthError {
    /// No API key configured
    #[error("YOUTUBE_API_KEY is not set")]
    MissingApiKey,

    /// No home directory to derive a cache directory from
    #[error("Cannot resolve cache directory")]
    NoCacheDir,

    /// The cache directory cannot be created or written
    #[error("Cannot write cache directory {}: {source}", .path.display())]
    CacheDirNotWritable {
        /// Directory that was checked
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// The API did not answer
    #[error("Cannot reach YouTube API: {0}")]
    Unreachable(#[from] reqwest::Error),
}

/// The checks behind `--health`
#[derive(Debug, Clone)]
pub struct HealthCheck {
    api_key: Option<String>,
    cache_dir: Option<PathBuf>,
    /// Directory of a snapshot file given on the command line
    snapshot_dir: Option<PathBuf>,
    api_url: String,
}

impl HealthCheck {
    /// Creates a check using the platform cache directory and the real API
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            cache_dir: default_cache_dir(),
            snapshot_dir: None,
            api_url: format!("{}/", YOUTUBE_API_BASE_URL),
        }
    }

    /// Checks `cache_dir` instead of the platform cache directory
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Also checks that the directory holding `cache_file` is writable
    pub fn with_snapshot_file(mut self, cache_file: &Path) -> Self {
        let dir = match cache_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.snapshot_dir = Some(dir);
        self
    }

    /// Probes `api_url` instead of the YouTube API root
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Runs every check, passing a line to `report` for each one that passes
    pub async fn run(&self, mut report: impl FnMut(&str)) -> Result<(), HealthError> {
        check_api_key(self.api_key.as_deref())?;
        report("YouTube Data API v3 key present");

        let cache_dir = self.cache_dir.as_deref().ok_or(HealthError::NoCacheDir)?;
        check_cache_dir(cache_dir)?;
        report(&format!("Cache directory writable: {}", cache_dir.display()));

        if let Some(snapshot_dir) = &self.snapshot_dir {
            check_cache_dir(snapshot_dir)?;
            report(&format!("Cache file directory writable: {}", snapshot_dir.display()));
        }

        check_api_reachable(&self.api_url).await?;
        report("YouTube API reachable");

        report("Health check passed");
        Ok(())
    }
}

/// Platform cache directory for this tool (`~/.cache/triples` on Linux)
pub fn default_cache_dir() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "triples")?;
    Some(project_dirs.cache_dir().to_path_buf())
}

/// Fails unless a non-blank API key is present
pub fn check_api_key(api_key: Option<&str>) -> Result<(), HealthError> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(HealthError::MissingApiKey),
    }
}

/// Creates `dir` if needed and writes then removes a probe file in it
pub fn check_cache_dir(dir: &Path) -> Result<(), HealthError> {
    let not_writable = |source| HealthError::CacheDirNotWritable {
        path: dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(not_writable)?;
    let probe = dir.join(PROBE_FILE_NAME);
    fs::write(&probe, b"ok").map_err(not_writable)?;
    fs::remove_file(&probe).map_err(not_writable)?;
    Ok(())
}

/// Succeeds if `url` answers with any HTTP response within two seconds
pub async fn check_api_reachable(url: &str) -> Result<(), HealthError> {
    let client = Client::builder().timeout(REACHABILITY_TIMEOUT).build()?;
    let response = client.get(url).send().await?;
    debug!(status = %response.status(), "YouTube API answered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_api_key() {
        assert!(check_api_key(Some("key")).is_ok());
        assert!(matches!(check_api_key(None), Err(HealthError::MissingApiKey)));
        assert!(matches!(check_api_key(Some("")), Err(HealthError::MissingApiKey)));
    }

    #[test]
    fn test_check_cache_dir_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("nested").join("triples");

        check_cache_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert!(!dir.join(PROBE_FILE_NAME).exists(), "probe file should be removed");
    }

    #[test]
    fn test_check_cache_dir_fails_under_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = check_cache_dir(&blocker.join("triples")).unwrap_err();

        assert!(matches!(err, HealthError::CacheDirNotWritable { .. }));
        assert!(err.to_string().contains("blocker"));
    }

    #[test]
    fn test_default_cache_dir_names_tool() {
        if let Some(dir) = default_cache_dir() {
            assert!(dir.to_string_lossy().contains("triples"));
        }
        // Test passes if there is no home directory (e.g. in CI)
    }

    #[tokio::test]
    async fn test_run_passes_all_checks() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut server = mockito::Server::new_async().await;
        // Any status counts as reachable
        let _mock = server.mock("GET", "/").with_status(404).create_async().await;

        let mut lines = Vec::new();
        HealthCheck::new(Some("key".to_string()))
            .with_cache_dir(temp_dir.path().join("triples"))
            .with_api_url(format!("{}/", server.url()))
            .run(|line| lines.push(line.to_string()))
            .await
            .unwrap();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "YouTube Data API v3 key present");
        assert!(lines[1].starts_with("Cache directory writable"));
        assert_eq!(lines[2], "YouTube API reachable");
        assert_eq!(lines[3], "Health check passed");
    }

    #[test]
    fn test_snapshot_file_directory() {
        let check = HealthCheck::new(None).with_snapshot_file(Path::new("/tmp/x/cache.json"));
        assert_eq!(check.snapshot_dir, Some(PathBuf::from("/tmp/x")));

        let check = HealthCheck::new(None).with_snapshot_file(Path::new("cache.json"));
        assert_eq!(check.snapshot_dir, Some(PathBuf::from(".")));
    }

    #[tokio::test]
    async fn test_run_checks_snapshot_file_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(200).create_async().await;
        let snapshot_dir = temp_dir.path().join("snapshots");

        let mut lines = Vec::new();
        HealthCheck::new(Some("key".to_string()))
            .with_cache_dir(temp_dir.path().join("triples"))
            .with_snapshot_file(&snapshot_dir.join("cache.json"))
            .with_api_url(format!("{}/", server.url()))
            .run(|line| lines.push(line.to_string()))
            .await
            .unwrap();

        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("Cache file directory writable"));
        assert!(snapshot_dir.is_dir());
    }

    #[tokio::test]
    async fn test_run_fails_on_unwritable_snapshot_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut lines = Vec::new();
        let err = HealthCheck::new(Some("key".to_string()))
            .with_cache_dir(temp_dir.path().join("triples"))
            .with_snapshot_file(&blocker.join("cache.json"))
            .with_api_url("http://127.0.0.1:1/")
            .run(|line| lines.push(line.to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, HealthError::CacheDirNotWritable { .. }));
        assert_eq!(lines.len(), 2, "API check should not run");
    }

    #[tokio::test]
    async fn test_run_stops_at_missing_key() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache_dir = temp_dir.path().join("triples");

        let mut lines = Vec::new();
        let err = HealthCheck::new(None)
            .with_cache_dir(&cache_dir)
            .run(|line| lines.push(line.to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, HealthError::MissingApiKey));
        assert!(lines.is_empty());
        assert!(!cache_dir.exists(), "later checks should not run");
    }

    #[tokio::test]
    async fn test_run_reports_unreachable_api() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut lines = Vec::new();
        let err = HealthCheck::new(Some("key".to_string()))
            .with_cache_dir(temp_dir.path())
            .with_api_url("http://127.0.0.1:1/")
            .run(|line| lines.push(line.to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, HealthError::Unreachable(_)));
        assert_eq!(lines.len(), 2);
    }
}
