//! On-disk form of the lookup cache
//!
//! Both cache maps are written together as one pretty-printed JSON document.
//! Entries keep their expiry timestamp on disk; freshness is decided by the
//! reader, so an expired entry may still be present in the file.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::youtube::Video;

/// File name of the snapshot inside the temp directory
const SNAPSHOT_FILE_NAME: &str = "triples_cache.json";

/// Errors while reading or writing the snapshot file
///
/// These never reach the caller of a lookup; the cache logs them and carries
/// on in memory.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File system failure
    #[error("cache file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The file does not hold a valid snapshot
    #[error("cache file is not a valid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// A cached latest video and when it stops being served
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedVideo {
    /// The cached video
    pub video: Video,
    /// When the entry expires
    pub expires_at: DateTime<Utc>,
}

impl CachedVideo {
    /// Whether the entry may still be served at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Both cache maps, as held in memory and as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Channel handle to uploads playlist id, never expires
    #[serde(default, deserialize_with = "null_as_empty")]
    pub playlist_cache: HashMap<String, String>,
    /// Playlist id to its latest video
    #[serde(default, deserialize_with = "null_as_empty")]
    pub video_cache: HashMap<String, CachedVideo>,
}

/// Reads a `null` map the same as a missing one
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Snapshot {
    /// Reads a snapshot from `path`
    ///
    /// # Returns
    /// * `Ok(Some(Snapshot))` if the file exists and parses
    /// * `Ok(None)` if there is no file yet
    /// * `Err(SnapshotError)` if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Serializes the snapshot as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Writes serialized snapshot data to `path`, creating parent directories
///
/// The data goes to a `.tmp` sibling first and is renamed over `path`, so a
/// reader sees either the previous snapshot or the new one in full. Callers
/// sharing a path must not write concurrently.
pub fn write_snapshot(path: &Path, json: &str) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_sibling(path);
    fs::write(&temp_path, json)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

/// `cache.json` -> `cache.json.tmp` in the same directory
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(SNAPSHOT_FILE_NAME));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Default snapshot location: a file named for this tool in the temp directory
pub fn default_snapshot_path() -> PathBuf {
    std::env::temp_dir().join(SNAPSHOT_FILE_NAME)
}
