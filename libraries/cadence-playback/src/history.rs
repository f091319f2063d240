//! Remote playback history reporting
//!
//! Reports are fire-and-forget: each runs in its own task and never delays
//! or fails the play that triggered it.

use cadence_core::{HistoryApi, HistoryEntry, IdentityProvider, Track};
use chrono::Utc;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Sends completed plays to the history backend for the signed-in user
#[derive(Clone)]
pub struct HistoryReporter {
    api: Arc<dyn HistoryApi>,
    identity: Arc<dyn IdentityProvider>,
}

impl HistoryReporter {
    pub fn new(api: Arc<dyn HistoryApi>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { api, identity }
    }

    /// Report `track` as played now
    ///
    /// Does nothing without a signed-in user or outside a tokio runtime.
    pub fn report(&self, track: &Track) -> Option<JoinHandle<()>> {
        let user_id = self.identity.current_user()?;
        let handle = Handle::try_current().ok()?;

        let entry = HistoryEntry::from_track(track, Utc::now());
        let api = Arc::clone(&self.api);

        Some(handle.spawn(async move {
            let track_id = entry.track_id.clone();
            match api.report_history(&user_id, entry).await {
                Ok(history) => {
                    debug!(track_id, entries = history.len(), "Reported play to history");
                }
                Err(e) => {
                    warn!(track_id, error = %e, "Failed to report play to history");
                }
            }
        }))
    }
}
