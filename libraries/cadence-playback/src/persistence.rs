//! Durable player state
//!
//! Two kinds of records live in the [`StateStore`]:
//!
//! | Key                  | Value                                   |
//! |----------------------|-----------------------------------------|
//! | `player:snapshot`    | [`PersistedSnapshot`] (queue, modifiers) |
//! | `progress:<trackId>` | [`ProgressRecord`] (resume point)       |
//!
//! Reads fail open: anything missing, malformed, or from an unknown version
//! falls back to defaults. Write failures are logged and swallowed.

use crate::volume::DEFAULT_VOLUME;
use cadence_core::{StateStore, Track};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

/// Storage key of the queue snapshot
pub const SNAPSHOT_KEY: &str = "player:snapshot";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Minimum wall-clock gap between two resume-point writes
pub const PROGRESS_WRITE_INTERVAL: Duration = Duration::from_millis(800);

/// Minimum play head movement between two resume-point writes, in seconds
pub const PROGRESS_MIN_DELTA: f64 = 0.5;

/// Resume points at or beyond this fraction of the duration are ignored
pub const RESUME_MAX_FRACTION: f64 = 0.95;

/// Resume points older than this are ignored
pub const RESUME_MAX_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Storage key of the resume point for `track_id`
pub fn progress_key(track_id: &str) -> String {
    format!("progress:{track_id}")
}

/// Restorable subset of the player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub version: u32,
    pub queue: Vec<Track>,
    /// Position in `queue`, -1 when unset
    pub current_index: i64,
    pub current_song: Option<Track>,
    pub volume: f32,
    #[serde(rename = "loop")]
    pub loop_enabled: bool,
    pub shuffle: bool,
}

impl Default for PersistedSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            queue: Vec::new(),
            current_index: -1,
            current_song: None,
            volume: DEFAULT_VOLUME,
            loop_enabled: false,
            shuffle: false,
        }
    }
}

impl PersistedSnapshot {
    /// Decode a stored snapshot, falling back to the default on any problem
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Self>(raw) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => snapshot,
            Ok(snapshot) => {
                warn!(version = snapshot.version, "Unknown snapshot version, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Unreadable snapshot, using defaults");
                Self::default()
            }
        }
    }

    /// Stored position, if it points into the stored queue
    pub fn position(&self) -> Option<usize> {
        usize::try_from(self.current_index)
            .ok()
            .filter(|&index| index < self.queue.len())
    }

    pub fn index_to_wire(index: Option<usize>) -> i64 {
        index.map_or(-1, |i| i as i64)
    }
}

/// Per-track resume point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Position in seconds
    pub t: f64,
    /// Write time, epoch milliseconds
    pub ts: i64,
}

impl ProgressRecord {
    /// Position to resume at for a track of `duration` seconds, if any
    ///
    /// Returns `None` when the record is stale, sits in the final 5% of the
    /// track, or points at the very start.
    pub fn resume_target(&self, duration: f64, now_ms: i64) -> Option<f64> {
        if !self.t.is_finite() || self.t <= 0.0 {
            return None;
        }
        if now_ms.saturating_sub(self.ts) > RESUME_MAX_AGE_MS {
            return None;
        }
        if duration.is_finite() && duration > 0.0 && self.t >= RESUME_MAX_FRACTION * duration {
            return None;
        }
        Some(self.t)
    }
}

/// Rate limiter for resume-point writes
///
/// Remembers the last written track, instant, and position.
#[derive(Debug, Default)]
pub struct ProgressThrottle {
    last: Option<(String, Instant, f64)>,
}

impl ProgressThrottle {
    /// Check whether a write is due and, if so, record it as written
    pub fn try_acquire(&mut self, track_id: &str, position: f64, now: Instant) -> bool {
        let due = match &self.last {
            Some((last_track, last_at, last_position)) if last_track == track_id => {
                now.saturating_duration_since(*last_at) >= PROGRESS_WRITE_INTERVAL
                    && (position - last_position).abs() >= PROGRESS_MIN_DELTA
            }
            _ => true,
        };

        if due {
            self.last = Some((track_id.to_string(), now, position));
        }
        due
    }
}

/// Reads and writes player state through a [`StateStore`]
pub struct PersistenceAdapter {
    store: Arc<dyn StateStore>,
    snapshot_writes: Mutex<()>,
    throttle: StdMutex<ProgressThrottle>,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            snapshot_writes: Mutex::new(()),
            throttle: StdMutex::new(ProgressThrottle::default()),
        }
    }

    /// Load the snapshot, or the default if missing or unreadable
    pub async fn load_snapshot(&self) -> PersistedSnapshot {
        match self.store.get(SNAPSHOT_KEY).await {
            Ok(Some(raw)) => PersistedSnapshot::decode(&raw),
            Ok(None) => PersistedSnapshot::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read snapshot, using defaults");
                PersistedSnapshot::default()
            }
        }
    }

    /// Write a snapshot built by `build`
    ///
    /// Writers queue on a fair lock and `build` runs only once the lock is
    /// held, so the final write always carries the latest state.
    pub async fn save_snapshot_with<F>(&self, build: F)
    where
        F: FnOnce() -> PersistedSnapshot,
    {
        let _guard = self.snapshot_writes.lock().await;
        let snapshot = build();

        let raw = match serde_json::to_string(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to encode snapshot");
                return;
            }
        };

        if let Err(e) = self.store.set(SNAPSHOT_KEY, &raw).await {
            warn!(error = %e, "Failed to write snapshot");
        }
    }

    /// Rate-limit check for a resume-point write
    pub fn progress_due(&self, track_id: &str, position: f64, now: Instant) -> bool {
        self.throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_acquire(track_id, position, now)
    }

    /// Store the resume point for `track_id`
    pub async fn save_progress(&self, track_id: &str, position: f64, now_ms: i64) {
        let record = ProgressRecord {
            t: position,
            ts: now_ms,
        };

        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(track_id, error = %e, "Failed to encode resume point");
                return;
            }
        };

        debug!(track_id, position, "Saving resume point");
        if let Err(e) = self.store.set(&progress_key(track_id), &raw).await {
            warn!(track_id, error = %e, "Failed to write resume point");
        }
    }

    /// Resume point for `track_id`, if one is stored and readable
    pub async fn load_progress(&self, track_id: &str) -> Option<ProgressRecord> {
        match self.store.get(&progress_key(track_id)).await {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .map_err(|e| warn!(track_id, error = %e, "Unreadable resume point"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(track_id, error = %e, "Failed to read resume point");
                None
            }
        }
    }
}
