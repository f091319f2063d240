//! Shared fakes for controller integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_core::{CoreError, HistoryApi, HistoryEntry, MediaSourceApi, Quality, StateStore, Track};
use cadence_playback::{OutputDevice, PlaybackError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

// ===== Tracks =====

pub fn create_test_track(id: &str) -> Track {
    Track::new(id, format!("Track {id}"), "Test Artist").with_duration(200.0)
}

pub fn create_test_queue(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| create_test_track(id)).collect()
}

pub fn url_for(track_id: &str) -> String {
    format!("https://cdn.test/{track_id}.m4a")
}

/// Let spawned tasks and pending futures run to their next suspension point
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

// ===== Media source =====

type Reply = Result<String, CoreError>;

/// Media source whose responses can be held back per track
#[derive(Default)]
pub struct FakeSource {
    gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    unavailable: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeSource {
    /// Hold the next resolution of `track_id` until the returned sender fires
    pub fn gate(&self, track_id: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(track_id.to_string(), rx);
        tx
    }

    /// Make `track_id` resolve to `SourceUnavailable`
    pub fn make_unavailable(&self, track_id: &str) {
        self.unavailable.lock().unwrap().push(track_id.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSourceApi for FakeSource {
    async fn resolve_media_source(&self, track_id: &str, _quality: Quality) -> cadence_core::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().remove(track_id);
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(CoreError::network("gate dropped")));
        }

        if self.unavailable.lock().unwrap().iter().any(|id| id == track_id) {
            return Err(CoreError::source_unavailable(track_id));
        }

        Ok(url_for(track_id))
    }
}

// ===== Output device =====

/// Output device that records what the controller asked of it
#[derive(Default)]
pub struct FakeDevice {
    pub source: Mutex<Option<String>>,
    pub loaded: Mutex<Vec<String>>,
    pub position: Mutex<f64>,
    pub duration: Mutex<Option<f64>>,
    pub volume: Mutex<Option<f32>>,
    pub playing: AtomicBool,
    pub reject_play: AtomicBool,
    pub play_calls: AtomicUsize,
    pub pause_calls: AtomicUsize,
}

impl FakeDevice {
    pub fn source(&self) -> Option<String> {
        self.source.lock().unwrap().clone()
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }

    pub fn current_position(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    pub fn set_duration(&self, seconds: f64) {
        *self.duration.lock().unwrap() = Some(seconds);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn reject_play(&self, reject: bool) {
        self.reject_play.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl OutputDevice for FakeDevice {
    fn set_source(&self, url: &str) {
        *self.source.lock().unwrap() = Some(url.to_string());
        self.loaded.lock().unwrap().push(url.to_string());
    }

    fn clear_source(&self) {
        *self.source.lock().unwrap() = None;
    }

    async fn play(&self) -> cadence_playback::Result<()> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_play.load(Ordering::SeqCst) {
            return Err(PlaybackError::PlaybackRejected("autoplay blocked".to_string()));
        }
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }

    fn set_position(&self, seconds: f64) {
        *self.position.lock().unwrap() = seconds;
    }

    fn position(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    fn duration(&self) -> Option<f64> {
        *self.duration.lock().unwrap()
    }

    fn set_volume(&self, level: f32) {
        *self.volume.lock().unwrap() = Some(level);
    }
}

// ===== State store =====

#[derive(Default)]
pub struct FakeStore {
    pub values: Mutex<HashMap<String, String>>,
    pub fail: AtomicBool,
}

impl FakeStore {
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.values.lock().unwrap().insert(key.to_string(), value.to_string());
        store
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl StateStore for FakeStore {
    async fn get(&self, key: &str) -> cadence_core::Result<Option<String>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::storage("disk unavailable"));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> cadence_core::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::storage("disk unavailable"));
        }
        self.values.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> cadence_core::Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

// ===== History =====

pub struct FakeHistory {
    reports: mpsc::UnboundedSender<(String, HistoryEntry)>,
}

impl FakeHistory {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, HistoryEntry)>) {
        let (reports, rx) = mpsc::unbounded_channel();
        (Self { reports }, rx)
    }
}

#[async_trait]
impl HistoryApi for FakeHistory {
    async fn report_history(&self, user_id: &str, entry: HistoryEntry) -> cadence_core::Result<Vec<HistoryEntry>> {
        let _ = self.reports.send((user_id.to_string(), entry.clone()));
        Ok(vec![entry])
    }
}
