/// Playback history entries reported to the catalog backend
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Track;

/// A completed play, as stored in the user's playback history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Catalog media identifier (`songmid` on the wire)
    #[serde(rename = "songmid", alias = "trackId")]
    pub track_id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub played_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Build an entry for a track that started playing at `played_at`
    pub fn from_track(track: &Track, played_at: DateTime<Utc>) -> Self {
        Self {
            track_id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            artwork: track.artwork.clone(),
            album: track.album.clone(),
            played_at,
        }
    }
}
