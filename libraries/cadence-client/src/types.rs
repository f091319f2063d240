//! Types for catalog proxy requests and responses.

use cadence_core::{HistoryEntry, Track};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Default proxy address
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Configuration for connecting to the catalog proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the proxy (e.g., "http://localhost:4000")
    pub base_url: String,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl ClientConfig {
    /// Create a config with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Accepts `"123"` or `123` and yields a string.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

fn optional_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(value)| value))
}

// =============================================================================
// Tracks
// =============================================================================

/// Track as returned by the proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicItem {
    /// Numeric catalog id (not used for playback)
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// Media identifier used for sources, lyrics, and history
    #[serde(default)]
    pub songmid: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub lrc: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub albumid: Option<String>,
    #[serde(default)]
    pub albummid: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
}

impl From<MusicItem> for Track {
    fn from(item: MusicItem) -> Self {
        let id = if item.songmid.is_empty() {
            item.id
        } else {
            item.songmid
        };

        Self {
            id,
            title: item.title,
            artist: item.artist,
            artwork: item.artwork.filter(|url| !url.is_empty()),
            album: item.album.filter(|album| !album.is_empty()),
            duration: item.duration,
            lyric: item.lrc,
        }
    }
}

/// Convert a list of wire tracks.
pub fn into_tracks(items: Vec<MusicItem>) -> Vec<Track> {
    items.into_iter().map(Track::from).collect()
}

// =============================================================================
// Media and lyrics
// =============================================================================

/// Response from the media-source endpoint.
#[derive(Debug, Deserialize)]
pub struct MediaSourceResponse {
    #[serde(default)]
    pub url: Option<String>,
}

/// Lyrics for one track.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsResponse {
    /// LRC-formatted lyric text
    #[serde(default)]
    pub raw_lrc: String,
    /// LRC-formatted translation, when available
    #[serde(default)]
    pub translation: Option<String>,
}

// =============================================================================
// Search and browse
// =============================================================================

/// One page of search results.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<MusicItem>,
    #[serde(default)]
    pub is_end: bool,
}

/// A chart, without its tracks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopListSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub cover_img: Option<String>,
}

/// Charts grouped under a heading.
#[derive(Debug, Clone, Deserialize)]
pub struct TopListGroup {
    pub title: String,
    #[serde(default)]
    pub data: Vec<TopListSummary>,
}

/// A chart with its tracks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopListDetail {
    #[serde(flatten)]
    pub summary: TopListSummary,
    #[serde(default)]
    pub music_list: Vec<MusicItem>,
}

/// A playlist category.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendTag {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
}

/// Categories grouped under a heading.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendTagGroup {
    pub title: String,
    #[serde(default)]
    pub data: Vec<RecommendTag>,
}

/// All playlist categories.
#[derive(Debug, Deserialize)]
pub struct RecommendTagsResponse {
    #[serde(default)]
    pub pinned: Vec<RecommendTag>,
    #[serde(default)]
    pub data: Vec<RecommendTagGroup>,
}

/// A recommended playlist.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendSheet {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub create_time: Option<String>,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub play_count: Option<u64>,
    #[serde(default)]
    pub artist: Option<String>,
}

/// One page of recommended playlists.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendSheetsResponse {
    #[serde(default)]
    pub is_end: bool,
    #[serde(default)]
    pub data: Vec<RecommendSheet>,
}

/// Tracks of one playlist.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfoResponse {
    #[serde(default)]
    pub music_list: Vec<MusicItem>,
    #[serde(default)]
    pub is_end: bool,
}

// =============================================================================
// History
// =============================================================================

/// Request body for appending to the history.
#[derive(Debug, Serialize)]
pub struct AddHistoryRequest<'a> {
    pub entry: &'a HistoryEntry,
}

/// A user's playback history.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackHistoryResponse {
    #[serde(default)]
    pub playback_history: Vec<HistoryEntry>,
}
