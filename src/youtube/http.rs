//! YouTube Data API v3 client
//!
//! This module performs the two raw lookups of the chain: channel handle to
//! uploads playlist, and playlist to its newest item. Each call is exactly one
//! HTTP request; caching and pacing are left to the wrappers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Video, YouTubeClient, YouTubeError};

/// Base URL for the YouTube Data API
pub const YOUTUBE_API_BASE_URL: &str = "https://youtube.googleapis.com/youtube/v3";

/// Timeout applied to every request made by [`HttpClient::new`]
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Client for the `channels` and `playlistItems` endpoints
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpClient {
    /// Creates a client with the default request timeout
    pub fn new(api_key: impl Into<String>) -> Result<Self, YouTubeError> {
        Self::with_timeout(api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client whose requests give up after `timeout`
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, YouTubeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_key))
    }

    /// Creates a client around an existing HTTP client
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: YOUTUBE_API_BASE_URL.to_string(),
        }
    }

    /// Points the client at another API root (used against mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The API root requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a GET to `endpoint` and decodes the JSON body
    ///
    /// A non-success status is only logged: the body is still decoded, so an
    /// error payload ends up as a response with no items.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, "requesting YouTube API");

        // The query string carries the API key, keep it out of error messages
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let text = response.text().await.map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            let message = api_error_message(&text).unwrap_or_default();
            warn!(endpoint, %status, api_message = %message, "YouTube API not available");
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl YouTubeClient for HttpClient {
    async fn uploads_playlist_id(&self, handle: &str) -> Result<String, YouTubeError> {
        let response: ChannelListResponse = self
            .get_json(
                "channels",
                &[
                    ("part", "contentDetails"),
                    ("forHandle", handle),
                    ("maxResults", "5"),
                ],
            )
            .await?;

        parse_uploads_playlist(response, handle)
    }

    async fn latest_playlist_item(&self, playlist_id: &str) -> Result<Video, YouTubeError> {
        let response: PlaylistItemListResponse = self
            .get_json(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("playlistId", playlist_id),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        parse_latest_item(response, playlist_id)
    }
}

/// Picks the uploads playlist of the first channel in the response
fn parse_uploads_playlist(response: ChannelListResponse, handle: &str) -> Result<String, YouTubeError> {
    response
        .items
        .into_iter()
        .next()
        .map(|channel| channel.content_details.related_playlists.uploads)
        .ok_or_else(|| YouTubeError::EmptyResult {
            resource: "channel",
            key: handle.to_string(),
        })
}

/// Builds a [`Video`] from the first playlist item in the response
fn parse_latest_item(response: PlaylistItemListResponse, playlist_id: &str) -> Result<Video, YouTubeError> {
    response
        .items
        .into_iter()
        .next()
        .map(|item| Video::new(&item.snippet.title, item.snippet.resource_id.video_id))
        .ok_or_else(|| YouTubeError::EmptyResult {
            resource: "playlist item",
            key: playlist_id.to_string(),
        })
}

/// Extracts `error.message` from an API error body, if there is one
fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .map(|response| response.error.message)
}

// YouTube API response structures

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}
