/// Track type as obtained from the catalog
use serde::{Deserialize, Serialize};

/// A playable track
///
/// Tracks are immutable once obtained from the catalog. The identifier is the
/// key used for media source resolution, caching, and resume points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Catalog media identifier
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Artwork URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,

    /// Album name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Raw LRC lyric text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyric: Option<String>,
}

impl Track {
    /// Create a track with only the required fields set
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            artwork: None,
            album: None,
            duration: None,
            lyric: None,
        }
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}
