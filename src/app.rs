//! Latest-upload lookup for a channel
//!
//! [`App`] owns the composed client chain and runs the two-step lookup:
//! channel handle to uploads playlist, then playlist to its newest video.

use crate::cache::CachedClient;
use crate::cli::StartupConfig;
use crate::youtube::{HttpClient, RateLimitedClient, Video, YouTubeClient, YouTubeError};

/// The chain used by the CLI: cache in front of the rate limiter in front of HTTP
///
/// Cache hits return before the rate limiter is consulted.
pub type DefaultClient = CachedClient<RateLimitedClient<HttpClient>>;

/// Runs lookups against a composed client
pub struct App<C> {
    client: C,
}

impl<C: YouTubeClient> App<C> {
    /// Creates an app over an already composed client
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The composed client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the newest upload of `channel_handle`
    ///
    /// Fails without a second call if the handle cannot be resolved. There is
    /// no retry at this level.
    pub async fn latest_video(&self, channel_handle: &str) -> Result<Video, YouTubeError> {
        let playlist_id = self.client.uploads_playlist_id(channel_handle).await?;
        self.client.latest_playlist_item(&playlist_id).await
    }
}

impl App<DefaultClient> {
    /// Builds the standard chain from startup configuration
    ///
    /// # Returns
    /// * `Ok(App)` wired with HTTP client, rate limiter and persistent cache
    /// * `Err(YouTubeError)` if the HTTP client cannot be built
    pub fn from_config(config: &StartupConfig) -> Result<Self, YouTubeError> {
        let http = HttpClient::with_timeout(&config.api_key, config.request_timeout)?
            .with_base_url(&config.api_base_url);
        let limited = RateLimitedClient::new(http, config.min_interval);
        let cached = CachedClient::new(limited, &config.cache_file).with_ttl(config.video_ttl);

        Ok(Self::new(cached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Snapshot;
    use crate::youtube::fake::FakeClient;
    use std::sync::Arc;
    use std::time::Duration;

    fn fake() -> Arc<FakeClient> {
        Arc::new(
            FakeClient::new()
                .with_channel("triplescosmos", "UUxyz")
                .with_video("UUxyz", "New Clip #fun", "abc123"),
        )
    }

    #[tokio::test]
    async fn test_latest_video_resolves_both_steps() {
        let inner = fake();
        let app = App::new(inner.clone());

        let video = app.latest_video("triplescosmos").await.unwrap();

        assert_eq!(video.title, "New Clip");
        assert_eq!(video.video_id, "abc123");
        assert_eq!(inner.playlist_calls(), 1);
        assert_eq!(inner.video_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_handle_stops_after_first_step() {
        let inner = fake();
        let app = App::new(inner.clone());

        let err = app.latest_video("nobody").await.unwrap_err();

        assert!(matches!(err, YouTubeError::EmptyResult { resource: "channel", .. }));
        assert_eq!(inner.video_calls(), 0);
    }

    #[tokio::test]
    async fn test_second_lookup_through_cache_makes_no_calls() {
        let inner = fake();
        let chain = CachedClient::in_memory(RateLimitedClient::new(
            inner.clone(),
            Duration::from_millis(200),
        ));
        let app = App::new(chain);

        let first = app.latest_video("triplescosmos").await.unwrap();
        let start = std::time::Instant::now();
        let second = app.latest_video("triplescosmos").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.playlist_calls(), 1);
        assert_eq!(inner.video_calls(), 1);
        // Cache hits never wait on the rate limiter
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_timeout_cancels_through_every_layer() {
        let inner = Arc::new(
            FakeClient::new()
                .with_channel("triplescosmos", "UUxyz")
                .with_video("UUxyz", "New Clip #fun", "abc123")
                .with_delay(Duration::from_secs(5)),
        );
        let chain = CachedClient::in_memory(RateLimitedClient::new(
            inner.clone(),
            Duration::from_secs(2),
        ));
        let app = App::new(chain);

        // Dropped while the inner client is still answering
        let result =
            tokio::time::timeout(Duration::from_secs(1), app.latest_video("triplescosmos")).await;
        assert!(result.is_err(), "lookup should have timed out");
        assert_eq!(inner.playlist_calls(), 1);
        assert_eq!(app.client().snapshot(), Snapshot::default(), "nothing cached");

        // Dropped while waiting on the rate limiter
        let result =
            tokio::time::timeout(Duration::from_millis(500), app.latest_video("triplescosmos"))
                .await;
        assert!(result.is_err(), "lookup should have timed out");
        assert_eq!(inner.playlist_calls(), 1, "inner client not reached");

        // The limiter still admits the next call once the interval is over
        let start = tokio::time::Instant::now();
        let video = tokio::time::timeout(Duration::from_secs(30), app.latest_video("triplescosmos"))
            .await
            .expect("lookup should finish")
            .unwrap();

        assert_eq!(video.video_id, "abc123");
        assert_eq!(inner.playlist_calls(), 2);
        assert_eq!(inner.video_calls(), 1);
        // 0.5s left of the interval, then two 5s answers
        assert!(start.elapsed() >= Duration::from_millis(10_500));
        assert_eq!(app.client().snapshot().playlist_cache["triplescosmos"], "UUxyz");
    }

    #[tokio::test]
    async fn test_from_config_uses_cache_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = StartupConfig {
            cache_file: temp_dir.path().join("cache.json"),
            ..StartupConfig::new("triplescosmos", "test-key")
        };

        let app = App::from_config(&config).unwrap();

        assert_eq!(
            app.client().snapshot_path(),
            Some(temp_dir.path().join("cache.json").as_path())
        );
    }
}
