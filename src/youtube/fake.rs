//! In-memory client used by the decorator tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Video, YouTubeClient, YouTubeError};

/// Answers lookups from fixed maps and counts every call it receives
#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    channels: HashMap<String, String>,
    videos: HashMap<String, Video>,
    /// Time every answer takes, `None` for an immediate answer
    delay: Option<Duration>,
    playlist_calls: AtomicUsize,
    video_calls: AtomicUsize,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_channel(mut self, handle: &str, playlist_id: &str) -> Self {
        self.channels
            .insert(handle.to_string(), playlist_id.to_string());
        self
    }

    pub(crate) fn with_video(mut self, playlist_id: &str, raw_title: &str, video_id: &str) -> Self {
        self.videos
            .insert(playlist_id.to_string(), Video::new(raw_title, video_id));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn respond(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub(crate) fn playlist_calls(&self) -> usize {
        self.playlist_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn video_calls(&self) -> usize {
        self.video_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl YouTubeClient for FakeClient {
    async fn uploads_playlist_id(&self, handle: &str) -> Result<String, YouTubeError> {
        self.playlist_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await;
        self.channels
            .get(handle)
            .cloned()
            .ok_or_else(|| YouTubeError::EmptyResult {
                resource: "channel",
                key: handle.to_string(),
            })
    }

    async fn latest_playlist_item(&self, playlist_id: &str) -> Result<Video, YouTubeError> {
        self.video_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await;
        self.videos
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| YouTubeError::EmptyResult {
                resource: "playlist item",
                key: playlist_id.to_string(),
            })
    }
}
