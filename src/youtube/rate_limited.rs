//! Minimum spacing between outbound calls
//!
//! [`RateLimitedClient`] only remembers when the previous call started. A call
//! arriving sooner than `min_interval` after it waits out the remainder; there
//! is no window or burst budget.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::{Video, YouTubeClient, YouTubeError};

/// Spacing used by the CLI between two API calls
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(200);

/// Wraps a client so consecutive calls start at least `min_interval` apart
#[derive(Debug)]
pub struct RateLimitedClient<C> {
    inner: C,
    min_interval: Duration,
    /// Start of the most recent delegated call, `None` before the first one
    last_call: Mutex<Option<Instant>>,
}

impl<C: YouTubeClient> RateLimitedClient<C> {
    /// Creates a limiter around `inner`
    pub fn new(inner: C, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// The configured spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next call is allowed and records it as started
    ///
    /// The lock is held through the sleep, so calls sharing this limiter are
    /// admitted one at a time in no particular order.
    async fn wait_turn(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate limit: delaying call");
                sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

#[async_trait]
impl<C: YouTubeClient> YouTubeClient for RateLimitedClient<C> {
    async fn uploads_playlist_id(&self, handle: &str) -> Result<String, YouTubeError> {
        self.wait_turn().await;
        self.inner.uploads_playlist_id(handle).await
    }

    async fn latest_playlist_item(&self, playlist_id: &str) -> Result<Video, YouTubeError> {
        self.wait_turn().await;
        self.inner.latest_playlist_item(playlist_id).await
    }
}
