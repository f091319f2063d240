//! Error types for the catalog client.

use cadence_core::CoreError;
use thiserror::Error;

/// Errors that can occur when talking to the catalog proxy.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Invalid base URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// The proxy answered but had no playable stream
    #[error("No playable source for track: {0}")]
    SourceUnavailable(String),
}

impl ClientError {
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ServerUnreachable(err.to_string())
        } else {
            Self::Request(err)
        }
    }
}

impl From<ClientError> for CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::SourceUnavailable(track_id) => CoreError::SourceUnavailable(track_id),
            other => CoreError::Network(other.to_string()),
        }
    }
}

/// Result type for catalog client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
