//! Catalog proxy client.

use crate::error::{ClientError, Result};
use crate::types::{
    into_tracks, AddHistoryRequest, ClientConfig, LyricsResponse, MediaSourceResponse,
    PlaybackHistoryResponse, RecommendSheetsResponse, RecommendTagsResponse, SearchResponse,
    SheetInfoResponse, TopListDetail, TopListGroup,
};
use async_trait::async_trait;
use cadence_core::{CoreError, HistoryApi, HistoryEntry, MediaSourceApi, Quality, Track};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

/// Client for the catalog proxy.
///
/// Stateless apart from the connection pool; cheap to share behind an `Arc`.
///
/// # Example
///
/// ```ignore
/// use cadence_client::{CatalogClient, ClientConfig};
///
/// let client = CatalogClient::new(ClientConfig::new("http://localhost:4000"))?;
/// let page = client.search("sunny day", 1).await?;
/// println!("{} tracks", page.tracks.len());
/// ```
pub struct CatalogClient {
    http: Client,
    base: Url,
}

/// One page of tracks plus whether more pages exist.
#[derive(Debug, Clone)]
pub struct TrackPage {
    pub tracks: Vec<Track>,
    pub is_end: bool,
}

impl CatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.base_url.trim_end_matches('/');
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        let base = Url::parse(url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(format!("Cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Build an endpoint URL from path segments (each percent-encoded).
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request.send().await.map_err(ClientError::from_send)?;
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ClientError::ParseError(format!("Failed to parse {what}: {e}")))
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "GET {what}");

        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        self.send_json(request, what).await
    }

    /// Test the connection to the proxy.
    pub async fn health(&self) -> Result<()> {
        let _: serde_json::Value = self.get_json(&["api", "health"], &[], "health").await?;
        Ok(())
    }

    // =========================================================================
    // Media
    // =========================================================================

    /// Resolve a streamable URL for `track_id`.
    ///
    /// An empty or missing `url` in the response is `SourceUnavailable`.
    pub async fn media_source_url(&self, track_id: &str, quality: Quality) -> Result<String> {
        let response: MediaSourceResponse = self
            .get_json(
                &["api", "media-source", track_id],
                &[("quality", quality.as_str().to_string())],
                "media source",
            )
            .await?;

        match response.url.filter(|url| !url.is_empty()) {
            Some(url) => Ok(url),
            None => Err(ClientError::SourceUnavailable(track_id.to_string())),
        }
    }

    /// Fetch raw LRC lyrics (and translation) for `track_id`.
    pub async fn lyrics(&self, track_id: &str) -> Result<LyricsResponse> {
        self.get_json(&["api", "lyrics", track_id], &[], "lyrics")
            .await
    }

    // =========================================================================
    // Search and browse
    // =========================================================================

    /// Search tracks by keyword (pages start at 1).
    pub async fn search(&self, keyword: &str, page: u32) -> Result<TrackPage> {
        let response: SearchResponse = self
            .get_json(
                &["api", "search"],
                &[
                    ("keyword", keyword.to_string()),
                    ("page", page.max(1).to_string()),
                    ("type", "music".to_string()),
                ],
                "search results",
            )
            .await?;

        debug!(keyword, page, results = response.data.len(), "Search finished");
        Ok(TrackPage {
            tracks: into_tracks(response.data),
            is_end: response.is_end,
        })
    }

    /// All chart groups.
    pub async fn top_lists(&self) -> Result<Vec<TopListGroup>> {
        self.get_json(&["api", "top-lists"], &[], "top lists").await
    }

    /// One chart with its tracks, optionally for a given period.
    pub async fn top_list_detail(&self, id: &str, period: Option<&str>) -> Result<TopListDetail> {
        let query: Vec<(&str, String)> = period
            .map(|period| ("period", period.to_string()))
            .into_iter()
            .collect();
        self.get_json(&["api", "top-lists", id], &query, "top list detail")
            .await
    }

    /// Playlist categories.
    pub async fn recommended_tags(&self) -> Result<RecommendTagsResponse> {
        self.get_json(&["api", "recommend", "tags"], &[], "recommended tags")
            .await
    }

    /// Recommended playlists, optionally filtered by category.
    pub async fn recommended_sheets(
        &self,
        category_id: Option<&str>,
        page: u32,
    ) -> Result<RecommendSheetsResponse> {
        let mut query = Vec::new();
        if let Some(category_id) = category_id {
            query.push(("categoryId", category_id.to_string()));
        }
        query.push(("page", page.max(1).to_string()));

        self.get_json(&["api", "recommend", "sheets"], &query, "recommended sheets")
            .await
    }

    /// Tracks of a playlist.
    pub async fn sheet_info(&self, id: &str) -> Result<TrackPage> {
        let response: SheetInfoResponse = self
            .get_json(&["api", "music-sheets", id], &[], "sheet info")
            .await?;
        Ok(TrackPage {
            tracks: into_tracks(response.music_list),
            is_end: response.is_end,
        })
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Playback history of `user_id`.
    pub async fn playback_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>> {
        let response: PlaybackHistoryResponse = self
            .get_json(
                &["api", "users", user_id, "playback-history"],
                &[],
                "playback history",
            )
            .await?;
        Ok(response.playback_history)
    }

    /// Append `entry` to the history of `user_id`, returning the updated history.
    pub async fn add_playback_history(
        &self,
        user_id: &str,
        entry: &HistoryEntry,
    ) -> Result<Vec<HistoryEntry>> {
        let url = self.endpoint(&["api", "users", user_id, "playback-history"])?;
        debug!(url = %url, track_id = %entry.track_id, "Reporting playback");

        let request = self.http.post(url).json(&AddHistoryRequest { entry });
        let response: PlaybackHistoryResponse = self.send_json(request, "playback history").await?;

        info!(
            track_id = %entry.track_id,
            entries = response.playback_history.len(),
            "Playback recorded"
        );
        Ok(response.playback_history)
    }
}

#[async_trait]
impl MediaSourceApi for CatalogClient {
    async fn resolve_media_source(&self, track_id: &str, quality: Quality) -> cadence_core::Result<String> {
        self.media_source_url(track_id, quality)
            .await
            .map_err(|err| match err {
                ClientError::ServerError { status: 404, .. } => CoreError::source_unavailable(track_id),
                other => other.into(),
            })
    }
}

#[async_trait]
impl HistoryApi for CatalogClient {
    async fn report_history(
        &self,
        user_id: &str,
        entry: HistoryEntry,
    ) -> cadence_core::Result<Vec<HistoryEntry>> {
        Ok(self.add_playback_history(user_id, &entry).await?)
    }
}
