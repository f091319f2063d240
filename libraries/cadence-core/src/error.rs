/// Core error types for Cadence Player
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type shared by collaborator traits
#[derive(Error, Debug)]
pub enum CoreError {
    /// The backend has no playable stream for the track
    #[error("No playable source for track: {0}")]
    SourceUnavailable(String),

    /// Transport-level failure talking to a remote collaborator
    #[error("Network error: {0}")]
    Network(String),

    /// Durable storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a source-unavailable error
    pub fn source_unavailable(track_id: impl Into<String>) -> Self {
        Self::SourceUnavailable(track_id.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
