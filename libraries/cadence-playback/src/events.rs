//! Playback Events
//!
//! Two directions of traffic:
//! - [`TransportEvent`]: what the output device observed (host → controller)
//! - [`PlaybackEvent`]: what the controller changed (controller → UI)
//!
//! Transport events are edge-triggered. The host either forwards them over an
//! mpsc channel (see `PlaybackController::run_transport_events`) or calls
//! `handle_transport_event` directly.

use crate::types::PlaybackStatus;
use cadence_core::Track;
use serde::{Deserialize, Serialize};

/// State change observed on the output device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransportEvent {
    /// Device started producing audio
    Started,

    /// Device paused (by the user or the platform)
    Paused,

    /// Source played through to its end
    NaturallyEnded,

    /// Source metadata became available
    MetadataLoaded {
        /// Duration in seconds
        duration: f64,
    },

    /// Periodic play head update
    TimeUpdate {
        /// Position in seconds
        position: f64,
    },
}

/// Events emitted by the controller for UI synchronization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Status changed (idle, loading, playing, paused)
    StatusChanged {
        status: PlaybackStatus,
    },

    /// Current track or position changed
    TrackChanged {
        track: Option<Track>,
        index: Option<usize>,
    },

    /// Volume changed (0.0-1.0)
    VolumeChanged {
        level: f32,
    },

    /// Loop or shuffle toggled
    ModifiersChanged {
        loop_enabled: bool,
        shuffle: bool,
    },

    /// Queue contents replaced
    QueueChanged {
        length: usize,
    },
}

impl PlaybackEvent {
    pub fn status(status: PlaybackStatus) -> Self {
        Self::StatusChanged { status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_event_wire_format() {
        let json = serde_json::to_string(&TransportEvent::MetadataLoaded { duration: 201.5 }).unwrap();
        assert_eq!(json, r#"{"type":"metadataLoaded","duration":201.5}"#);

        let event: TransportEvent = serde_json::from_str(r#"{"type":"naturallyEnded"}"#).unwrap();
        assert_eq!(event, TransportEvent::NaturallyEnded);
    }

    #[test]
    fn status_event_serializes_lowercase_status() {
        let json = serde_json::to_value(PlaybackEvent::status(PlaybackStatus::Paused)).unwrap();
        assert_eq!(json["type"], "statusChanged");
        assert_eq!(json["status"], "paused");
    }
}
