//! Caching wrapper around any [`YouTubeClient`]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::snapshot::{write_snapshot, CachedVideo, Snapshot};
use crate::youtube::{Video, YouTubeClient, YouTubeError};

/// How long a latest-video lookup is served from cache, in seconds
pub const DEFAULT_VIDEO_TTL_SECS: i64 = 30;

/// Source of the current time for expiry checks
pub trait Clock: Send + Sync {
    /// The current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Memoizes playlist ids and latest videos in front of another client
///
/// Both maps sit behind a single mutex. The lock only covers map access: it
/// is released before the inner client is called and before the snapshot is
/// written. Two concurrent misses on the same key therefore both reach the
/// inner client, and the later insert wins.
///
/// Every change gets a revision number under the map lock. Saves take a
/// separate file lock and skip any snapshot older than the one already on
/// disk.
pub struct CachedClient<C> {
    inner: C,
    state: Mutex<Snapshot>,
    /// Bumped under `state` on every insert
    revision: AtomicU64,
    /// Revision of the snapshot last written to `path`
    saved: Mutex<u64>,
    /// Where the snapshot is persisted, `None` for a memory-only cache
    path: Option<PathBuf>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<C: YouTubeClient> CachedClient<C> {
    /// Creates a cache persisted at `path`, hydrated from it if possible
    ///
    /// A missing or unreadable snapshot is not an error: the cache starts
    /// empty and the file is rewritten on the next insert.
    pub fn new(inner: C, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load_or_empty(&path);
        Self {
            inner,
            state: Mutex::new(state),
            revision: AtomicU64::new(0),
            saved: Mutex::new(0),
            path: Some(path),
            ttl: Duration::seconds(DEFAULT_VIDEO_TTL_SECS),
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a cache that is never written to disk
    pub fn in_memory(inner: C) -> Self {
        Self {
            inner,
            state: Mutex::new(Snapshot::default()),
            revision: AtomicU64::new(0),
            saved: Mutex::new(0),
            path: None,
            ttl: Duration::seconds(DEFAULT_VIDEO_TTL_SECS),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets how long latest-video lookups stay fresh
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Replaces the time source used for expiry
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The snapshot file, if this cache persists
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A copy of the current cache contents, expired entries included
    pub fn snapshot(&self) -> Snapshot {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, Snapshot> {
        // The maps stay consistent even if a holder panicked mid-insert
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `update` under the lock and returns the serialized snapshot
    fn update(&self, update: impl FnOnce(&mut Snapshot)) -> Option<PendingSave> {
        let mut state = self.state();
        update(&mut *state);
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;

        if self.path.is_none() {
            return None;
        }
        match state.to_json() {
            Ok(json) => Some(PendingSave { revision, json }),
            Err(e) => {
                warn!(error = %e, "failed to serialize cache snapshot");
                None
            }
        }
    }

    /// Writes serialized state to disk; failures are only logged
    fn persist(&self, pending: Option<PendingSave>) {
        let (Some(path), Some(pending)) = (self.path.as_deref(), pending) else {
            return;
        };

        let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.revision <= *saved {
            debug!(revision = pending.revision, saved = *saved, "newer snapshot already saved");
            return;
        }

        match write_snapshot(path, &pending.json) {
            Ok(()) => *saved = pending.revision,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to save cache snapshot");
            }
        }
    }
}

#[async_trait]
impl<C: YouTubeClient> YouTubeClient for CachedClient<C> {
    async fn uploads_playlist_id(&self, handle: &str) -> Result<String, YouTubeError> {
        let cached = self.state().playlist_cache.get(handle).cloned();
        if let Some(playlist_id) = cached {
            debug!(handle, "playlist cache hit");
            return Ok(playlist_id);
        }

        debug!(handle, "playlist cache miss");
        let playlist_id = self.inner.uploads_playlist_id(handle).await?;

        let json = self.update(|state| {
            state
                .playlist_cache
                .insert(handle.to_string(), playlist_id.clone());
        });
        self.persist(json);

        Ok(playlist_id)
    }

    async fn latest_playlist_item(&self, playlist_id: &str) -> Result<Video, YouTubeError> {
        let now = self.clock.now();
        let cached = self
            .state()
            .video_cache
            .get(playlist_id)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.video.clone());
        if let Some(video) = cached {
            debug!(playlist_id, "video cache hit");
            return Ok(video);
        }

        debug!(playlist_id, "video cache miss or expired");
        let video = self.inner.latest_playlist_item(playlist_id).await?;

        let expires_at = self.clock.now() + self.ttl;
        let json = self.update(|state| {
            state.video_cache.insert(
                playlist_id.to_string(),
                CachedVideo {
                    video: video.clone(),
                    expires_at,
                },
            );
        });
        self.persist(json);

        Ok(video)
    }
}

/// Serialized state waiting to be written
struct PendingSave {
    revision: u64,
    json: String,
}

/// Reads the snapshot at `path`, falling back to an empty cache
fn load_or_empty(path: &Path) -> Snapshot {
    match Snapshot::load(path) {
        Ok(Some(snapshot)) => {
            debug!(
                path = %path.display(),
                playlists = snapshot.playlist_cache.len(),
                videos = snapshot.video_cache.len(),
                "loaded cache snapshot"
            );
            snapshot
        }
        Ok(None) => {
            debug!(path = %path.display(), "no cache snapshot, starting empty");
            Snapshot::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable cache snapshot");
            Snapshot::default()
        }
    }
}
