//! Cache layer for YouTube lookups
//!
//! [`CachedClient`] memoizes both lookups of the chain in memory and mirrors
//! the maps to a JSON snapshot on disk, so a later run starts warm. Playlist
//! ids are kept forever; latest videos are served for a short TTL.

mod client;
mod snapshot;

pub use client::{CachedClient, Clock, SystemClock, DEFAULT_VIDEO_TTL_SECS};
pub use snapshot::{default_snapshot_path, CachedVideo, Snapshot, SnapshotError};
