/// Collaborator traits consumed by the playback engine
use crate::error::Result;
use crate::types::{HistoryEntry, Quality};
use async_trait::async_trait;

/// Resolves a track identifier to a streamable URL
///
/// Implemented by the catalog HTTP client. Calls may be slow or fail; the
/// playback engine treats late success and late failure symmetrically.
#[async_trait]
pub trait MediaSourceApi: Send + Sync {
    /// Resolve a playable URL for `track_id` at the requested quality
    ///
    /// # Errors
    /// Returns `CoreError::SourceUnavailable` when the backend has no stream,
    /// `CoreError::Network` on transport failure
    async fn resolve_media_source(&self, track_id: &str, quality: Quality) -> Result<String>;
}

/// Records completed plays in a user's remote history
#[async_trait]
pub trait HistoryApi: Send + Sync {
    /// Append `entry` to the history of `user_id`, returning the updated history
    async fn report_history(&self, user_id: &str, entry: HistoryEntry)
        -> Result<Vec<HistoryEntry>>;
}

/// Durable string key/value storage for restorable player state
///
/// Values are opaque strings (JSON in practice). Implementations must be
/// safe to call from any task.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Source of the signed-in user identity
///
/// The engine only needs to know whether someone is signed in (and who) to
/// decide whether plays are reported to history.
pub trait IdentityProvider: Send + Sync {
    /// Identifier of the current user, if signed in
    fn current_user(&self) -> Option<String>;
}

/// Identity fixed at construction time
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    /// Identity for a signed-in user
    pub fn user(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    /// No signed-in user
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<String> {
        self.0.clone()
    }
}
