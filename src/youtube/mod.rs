//! YouTube client capability and its decorators
//!
//! Every client in the lookup chain implements [`YouTubeClient`], so the raw
//! [`HttpClient`], the [`RateLimitedClient`] and the cache wrapper in
//! [`crate::cache`] can be stacked in any order.

pub mod http;
pub mod rate_limited;

#[cfg(test)]
pub(crate) mod fake;

pub use http::{HttpClient, YOUTUBE_API_BASE_URL};
pub use rate_limited::{RateLimitedClient, DEFAULT_MIN_INTERVAL};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::clean_title;

/// Base URL used to build links to a video
const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// The newest upload of a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Title with hashtags removed
    pub title: String,
    /// YouTube video id
    pub video_id: String,
}

impl Video {
    /// Creates a video from a raw API title, cleaning the title first
    pub fn new(raw_title: &str, video_id: impl Into<String>) -> Self {
        Self {
            title: clean_title(raw_title),
            video_id: video_id.into(),
        }
    }

    /// Link to the video on youtube.com
    pub fn watch_url(&self) -> String {
        format!("{}{}", WATCH_URL_BASE, self.video_id)
    }
}

/// Errors that can occur when looking up a channel's latest upload
#[derive(Debug, Error)]
pub enum YouTubeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered with no items for the requested key
    #[error("No {resource} found for '{key}'")]
    EmptyResult {
        /// What was looked up ("channel", "playlist item")
        resource: &'static str,
        /// The handle or playlist id that was looked up
        key: String,
    },
}

/// The two lookups needed to find a channel's latest upload
#[async_trait]
pub trait YouTubeClient: Send + Sync {
    /// Resolves a channel handle to the id of its uploads playlist
    async fn uploads_playlist_id(&self, handle: &str) -> Result<String, YouTubeError>;

    /// Returns the newest item of a playlist
    async fn latest_playlist_item(&self, playlist_id: &str) -> Result<Video, YouTubeError>;
}

#[async_trait]
impl<T: YouTubeClient + ?Sized> YouTubeClient for Arc<T> {
    async fn uploads_playlist_id(&self, handle: &str) -> Result<String, YouTubeError> {
        (**self).uploads_playlist_id(handle).await
    }

    async fn latest_playlist_item(&self, playlist_id: &str) -> Result<Video, YouTubeError> {
        (**self).latest_playlist_item(playlist_id).await
    }
}
