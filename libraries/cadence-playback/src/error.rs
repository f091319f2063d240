//! Error types for playback control

use cadence_core::CoreError;
use thiserror::Error;

/// Playback errors
///
/// These never reach UI operations: the controller converts them into state
/// transitions plus a logged diagnostic.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Backend has no playable stream for the track
    #[error("No playable source for track: {0}")]
    SourceUnavailable(String),

    /// Source resolution failed in transport
    #[error("Network error: {0}")]
    Network(String),

    /// Output device refused to start playback
    #[error("Playback rejected by output device: {0}")]
    PlaybackRejected(String),

    /// An output device is already bound to the transport
    #[error("Output device already attached")]
    DeviceAlreadyAttached,

    /// No output device has been attached yet
    #[error("No output device attached")]
    NoDevice,

    /// Persistence failure
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<CoreError> for PlaybackError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SourceUnavailable(track_id) => Self::SourceUnavailable(track_id),
            CoreError::Network(msg) => Self::Network(msg),
            CoreError::Storage(msg) => Self::Persistence(msg),
            CoreError::Serialization(e) => Self::Persistence(e.to_string()),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
