//! Core types for playback control

use cadence_core::{Quality, Track};
use serde::{Deserialize, Serialize};

/// Playback status
///
/// Exactly one value holds at any time. Status is never persisted; a restored
/// controller always starts `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing loaded or requested
    #[default]
    Idle,

    /// Source resolution or load in flight
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track (or start failed)
    Paused,
}

impl PlaybackStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 0.8)
    pub volume: f32,

    /// Initial loop modifier (default: false)
    pub loop_enabled: bool,

    /// Initial shuffle modifier (default: false)
    pub shuffle: bool,

    /// Stream quality requested from the backend (default: standard)
    pub quality: Quality,

    /// Maximum number of resolved URLs kept in memory (default: 512)
    pub source_cache_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.8,
            loop_enabled: false,
            shuffle: false,
            quality: Quality::Standard,
            source_cache_capacity: 512,
        }
    }
}

/// Read-only view of the observable player fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub status: PlaybackStatus,
    pub current_song: Option<Track>,
    pub current_index: Option<usize>,
    pub queue_len: usize,
    pub volume: f32,
    pub loop_enabled: bool,
    pub shuffle: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.volume, 0.8);
        assert!(!config.loop_enabled);
        assert!(!config.shuffle);
        assert_eq!(config.quality, Quality::Standard);
        assert_eq!(config.source_cache_capacity, 512);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PlaybackConfig = serde_json::from_str(r#"{"shuffle": true}"#).unwrap();
        assert!(config.shuffle);
        assert_eq!(config.volume, 0.8);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PlaybackStatus::Loading).unwrap();
        assert_eq!(json, "\"loading\"");
        assert_eq!(PlaybackStatus::default(), PlaybackStatus::Idle);
    }
}
