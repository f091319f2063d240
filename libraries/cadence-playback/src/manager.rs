//! Playback controller - core orchestration
//!
//! Composes queue, resolver, transport, and persistence into the single
//! source of truth for playback status.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Every play-at-index request mints a [`RequestToken`] and checks
//! it again after each suspension point (source resolution, `play()`); a
//! request whose token is no longer current abandons all further side
//! effects. Transport calls that follow a token check run under the state
//! lock so the check and the side effect are atomic. Output devices must
//! therefore never call back into the controller synchronously.

use crate::{
    error::Result,
    events::{PlaybackEvent, TransportEvent},
    history::HistoryReporter,
    persistence::{PersistedSnapshot, PersistenceAdapter, SNAPSHOT_VERSION},
    queue::QueueEngine,
    resolver::MediaSourceResolver,
    token::{RequestToken, TokenIssuer},
    transport::{OutputDevice, TransportController},
    types::{PlaybackConfig, PlaybackStatus, PlayerView},
    volume::Volume,
};
use cadence_core::{HistoryApi, IdentityProvider, MediaSourceApi, StateStore, Track};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Capacity of the UI event channel; slow subscribers see `Lagged`
const EVENT_CHANNEL_CAPACITY: usize = 64;

struct ControllerState {
    queue: QueueEngine,
    status: PlaybackStatus,
    /// URL of the source last loaded for the current track
    current_url: Option<String>,
    /// Request whose source is on the device
    loaded: Option<RequestToken>,
    /// Request whose start was last sent to the history
    reported: Option<RequestToken>,
    volume: Volume,
    loop_enabled: bool,
    shuffle: bool,
    tokens: TokenIssuer,
}

impl ControllerState {
    fn new(config: &PlaybackConfig) -> Self {
        Self {
            queue: QueueEngine::new(),
            status: PlaybackStatus::Idle,
            current_url: None,
            loaded: None,
            reported: None,
            volume: Volume::new(config.volume),
            loop_enabled: config.loop_enabled,
            shuffle: config.shuffle,
            tokens: TokenIssuer::new(),
        }
    }

    fn set_status(&mut self, status: PlaybackStatus, events: &mut Vec<PlaybackEvent>) {
        if self.status != status {
            debug!(from = %self.status, to = %status, "Status changed");
            self.status = status;
            events.push(PlaybackEvent::status(status));
        }
    }

    fn track_event(&self) -> PlaybackEvent {
        PlaybackEvent::TrackChanged {
            track: self.queue.current_track().cloned(),
            index: self.queue.current_index(),
        }
    }

    /// Drop position, current track, and loaded source
    fn clear_current(&mut self, events: &mut Vec<PlaybackEvent>) {
        let had_track = self.queue.current_index().is_some();
        self.queue.clear_position();
        self.current_url = None;
        self.loaded = None;
        if had_track {
            events.push(self.track_event());
        }
    }

    fn owns_device(&self) -> Option<RequestToken> {
        self.loaded.filter(|token| self.tokens.is_current(*token))
    }
}

struct Shared {
    state: Mutex<ControllerState>,
    transport: TransportController,
    resolver: MediaSourceResolver,
    persistence: Option<Arc<PersistenceAdapter>>,
    history: Option<HistoryReporter>,
    events: broadcast::Sender<PlaybackEvent>,
}

/// Builder for [`PlaybackController`]
pub struct PlaybackControllerBuilder {
    config: PlaybackConfig,
    api: Arc<dyn MediaSourceApi>,
    store: Option<Arc<dyn StateStore>>,
    history: Option<HistoryReporter>,
}

impl PlaybackControllerBuilder {
    #[must_use]
    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist the snapshot and resume points to `store`
    #[must_use]
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Report successful plays for the user named by `identity`
    #[must_use]
    pub fn history(mut self, api: Arc<dyn HistoryApi>, identity: Arc<dyn IdentityProvider>) -> Self {
        self.history = Some(HistoryReporter::new(api, identity));
        self
    }

    pub fn build(self) -> PlaybackController {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let resolver = MediaSourceResolver::new(
            self.api,
            self.config.quality,
            self.config.source_cache_capacity,
        );

        PlaybackController {
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState::new(&self.config)),
                transport: TransportController::new(),
                resolver,
                persistence: self
                    .store
                    .map(|store| Arc::new(PersistenceAdapter::new(store))),
                history: self.history,
                events,
            }),
        }
    }
}

/// Playback controller
///
/// Cheap to clone; clones share state. UI operations never return errors:
/// failures become state transitions plus a logged diagnostic.
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl PlaybackController {
    /// Create a controller without persistence or history reporting
    pub fn new(config: PlaybackConfig, api: Arc<dyn MediaSourceApi>) -> Self {
        Self::builder(api).config(config).build()
    }

    pub fn builder(api: Arc<dyn MediaSourceApi>) -> PlaybackControllerBuilder {
        PlaybackControllerBuilder {
            config: PlaybackConfig::default(),
            api,
            store: None,
            history: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, events: Vec<PlaybackEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.shared.events.send(event);
        }
    }

    fn has_device(&self, operation: &str) -> bool {
        let attached = self.shared.transport.is_attached();
        if !attached {
            warn!(operation, "No output device attached, ignoring");
        }
        attached
    }

    // ===== Device =====

    /// Bind the output device and push the current volume to it
    ///
    /// # Errors
    /// Returns `PlaybackError::DeviceAlreadyAttached` if a device is bound
    pub fn attach(&self, device: Arc<dyn OutputDevice>) -> Result<()> {
        let level = self.lock().volume.level();
        self.shared.transport.attach(Arc::clone(&device))?;
        device.set_volume(level);
        info!(volume = level, "Output device attached");
        Ok(())
    }

    // ===== Playback =====

    /// Replace the queue with `tracks` and play from `start_index`
    pub async fn play_queue(&self, tracks: Vec<Track>, start_index: usize) {
        self.play_at(start_index, Some(tracks)).await;
    }

    /// Replace the queue with a single track and play it
    pub async fn play_song(&self, track: Track) {
        self.play_at(0, Some(vec![track])).await;
    }

    /// Play the track at `index` of `queue_override` (or the stored queue)
    ///
    /// An index that doesn't exist unloads the transport and leaves the
    /// controller idle with no current track.
    pub async fn play_at(&self, index: usize, queue_override: Option<Vec<Track>>) {
        if !self.has_device("play_at") {
            return;
        }

        let mut events = Vec::new();

        let request = {
            let mut state = self.lock();

            if let Some(tracks) = queue_override {
                state.queue.replace(tracks);
                events.push(PlaybackEvent::QueueChanged {
                    length: state.queue.len(),
                });
            }

            let token = state.tokens.mint();
            let track = state.queue.select(index).cloned();

            match track {
                Some(track) => {
                    debug!(%token, index, track_id = %track.id, "Play requested");
                    events.push(state.track_event());
                    state.set_status(PlaybackStatus::Loading, &mut events);
                    Some((token, track))
                }
                None => {
                    debug!(%token, index, queue_len = state.queue.len(), "Play index out of range");
                    if let Err(e) = self.shared.transport.unload() {
                        warn!(error = %e, "Failed to unload transport");
                    }
                    state.clear_current(&mut events);
                    state.set_status(PlaybackStatus::Idle, &mut events);
                    None
                }
            }
        };

        self.emit(events);
        self.persist();

        let Some((token, track)) = request else {
            return;
        };

        let url = match self.shared.resolver.resolve(&track.id).await {
            Ok(url) => url,
            Err(e) => {
                self.on_resolve_failed(token, &track, &e.to_string());
                return;
            }
        };

        {
            let mut state = self.lock();
            if !state.tokens.is_current(token) {
                debug!(%token, track_id = %track.id, "Discarding stale source");
                return;
            }
            if let Err(e) = self.shared.transport.load(&url) {
                warn!(error = %e, "Failed to load source");
                return;
            }
            state.current_url = Some(url);
            state.loaded = Some(token);
        }

        let played = self.shared.transport.play().await;

        let mut events = Vec::new();
        {
            let mut state = self.lock();
            if !state.tokens.is_current(token) {
                debug!(%token, track_id = %track.id, "Play finished for superseded request");
                return;
            }
            match &played {
                Ok(()) => {
                    state.reported = Some(token);
                    state.set_status(PlaybackStatus::Playing, &mut events);
                }
                Err(e) => {
                    warn!(track_id = %track.id, error = %e, "Output device rejected playback");
                    state.set_status(PlaybackStatus::Paused, &mut events);
                }
            }
        }
        self.emit(events);

        if played.is_ok() {
            info!(track_id = %track.id, title = %track.title, "Now playing");
            if let Some(history) = &self.shared.history {
                history.report(&track);
            }
        }
    }

    fn on_resolve_failed(&self, token: RequestToken, track: &Track, reason: &str) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            if !state.tokens.is_current(token) {
                debug!(%token, track_id = %track.id, "Ignoring failure of stale request");
                return;
            }
            warn!(track_id = %track.id, error = reason, "Failed to resolve media source");
            if let Err(e) = self.shared.transport.pause() {
                warn!(error = %e, "Failed to pause transport");
            }
            state.current_url = None;
            state.loaded = None;
            state.set_status(PlaybackStatus::Paused, &mut events);
        }
        self.emit(events);
    }

    /// Pause, resume, or start playback depending on status
    ///
    /// Does nothing while a request is loading.
    pub async fn toggle_play(&self) {
        enum Action {
            Pause,
            Resume(Option<RequestToken>),
            Start(usize),
            Nothing,
        }

        if !self.has_device("toggle_play") {
            return;
        }

        let action = {
            let state = self.lock();
            match state.status {
                PlaybackStatus::Playing => Action::Pause,
                PlaybackStatus::Loading => Action::Nothing,
                PlaybackStatus::Paused if state.current_url.is_some() => {
                    Action::Resume(state.tokens.active())
                }
                _ if !state.queue.is_empty() => {
                    Action::Start(state.queue.current_index().unwrap_or(0))
                }
                _ => Action::Nothing,
            }
        };

        match action {
            Action::Pause => self.pause(),
            Action::Resume(token) => {
                let played = self.shared.transport.play().await;
                let mut events = Vec::new();
                let unreported = {
                    let mut state = self.lock();
                    match played {
                        Ok(()) if state.tokens.active() == token
                            && state.status == PlaybackStatus::Paused =>
                        {
                            state.set_status(PlaybackStatus::Playing, &mut events);
                            // First successful start after a rejected one
                            match state.owns_device() {
                                Some(loaded) if state.reported != Some(loaded) => {
                                    state.reported = Some(loaded);
                                    state.queue.current_track().cloned()
                                }
                                _ => None,
                            }
                        }
                        Ok(()) => None,
                        Err(e) => {
                            warn!(error = %e, "Failed to resume playback");
                            None
                        }
                    }
                };
                self.emit(events);

                if let (Some(track), Some(history)) = (unreported, &self.shared.history) {
                    history.report(&track);
                }
            }
            Action::Start(index) => self.play_at(index, None).await,
            Action::Nothing => debug!("Toggle ignored"),
        }
    }

    fn pause(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            if let Err(e) = self.shared.transport.pause() {
                warn!(error = %e, "Failed to pause transport");
            }
            state.set_status(PlaybackStatus::Paused, &mut events);
        }
        self.emit(events);
    }

    /// Skip forward (random pick under shuffle)
    ///
    /// Loop is ignored here; it only applies when a track ends naturally.
    pub async fn next(&self) {
        enum Step {
            PauseOnly,
            Play(usize),
            Exhausted,
        }

        if !self.has_device("next") {
            return;
        }

        let step = {
            let state = self.lock();
            if state.queue.is_empty() {
                Step::PauseOnly
            } else if state.shuffle {
                Step::Play(state.queue.shuffle_index(&mut rand::thread_rng()))
            } else {
                state.queue.next_index().map_or(Step::Exhausted, Step::Play)
            }
        };

        match step {
            Step::PauseOnly => {
                if let Err(e) = self.shared.transport.pause() {
                    warn!(error = %e, "Failed to pause transport");
                }
            }
            Step::Play(index) => self.play_at(index, None).await,
            Step::Exhausted => {
                let mut events = Vec::new();
                {
                    let mut state = self.lock();
                    state.tokens.mint();
                    if let Err(e) = self.shared.transport.stop() {
                        warn!(error = %e, "Failed to stop transport");
                    }
                    state.set_status(PlaybackStatus::Idle, &mut events);
                }
                info!("Reached end of queue");
                self.emit(events);
            }
        }
    }

    /// Skip back one position, stopping at the first track
    pub async fn previous(&self) {
        if !self.has_device("previous") {
            return;
        }

        let index = {
            let state = self.lock();
            (!state.queue.is_empty()).then(|| state.queue.previous_index())
        };

        match index {
            Some(index) => self.play_at(index, None).await,
            None => {
                if let Err(e) = self.shared.transport.pause() {
                    warn!(error = %e, "Failed to pause transport");
                }
            }
        }
    }

    /// Advance after the current track played to its end
    ///
    /// Shuffle wins over loop; without either the queue advances linearly
    /// and goes idle past the last track.
    async fn on_natural_end(&self) {
        let index = {
            let state = self.lock();
            if state.shuffle && !state.queue.is_empty() {
                Some(state.queue.shuffle_index(&mut rand::thread_rng()))
            } else if let (true, Some(current)) = (state.loop_enabled, state.queue.current_index()) {
                Some(current)
            } else {
                state.queue.next_index()
            }
        };

        if let Some(index) = index {
            self.play_at(index, None).await;
            return;
        }

        let mut events = Vec::new();
        {
            let mut state = self.lock();
            state.tokens.mint();
            if let Err(e) = self.shared.transport.stop() {
                warn!(error = %e, "Failed to stop transport");
            }
            state.clear_current(&mut events);
            state.set_status(PlaybackStatus::Idle, &mut events);
        }
        info!("Queue finished");
        self.emit(events);
        self.persist();
    }

    /// Seek within the current track, in seconds
    pub fn seek(&self, seconds: f64) {
        if !self.has_device("seek") {
            return;
        }
        match self.shared.transport.seek(seconds) {
            Ok(Some(position)) => debug!(position, "Seeked"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Seek failed"),
        }
    }

    // ===== Settings =====

    /// Set the volume, clamped to `[0, 1]`
    pub fn set_volume(&self, level: f32) {
        let applied = {
            let mut state = self.lock();
            if !state.volume.set_level(level) {
                warn!(level, "Ignoring invalid volume");
                return;
            }
            state.volume.level()
        };

        if self.shared.transport.is_attached() {
            if let Err(e) = self.shared.transport.set_volume(applied) {
                warn!(error = %e, "Failed to set device volume");
            }
        }

        self.emit(vec![PlaybackEvent::VolumeChanged { level: applied }]);
        self.persist();
    }

    /// Flip the loop modifier, returning the new value
    pub fn toggle_loop(&self) -> bool {
        let (loop_enabled, shuffle) = {
            let mut state = self.lock();
            state.loop_enabled = !state.loop_enabled;
            (state.loop_enabled, state.shuffle)
        };
        self.emit(vec![PlaybackEvent::ModifiersChanged {
            loop_enabled,
            shuffle,
        }]);
        self.persist();
        loop_enabled
    }

    /// Flip the shuffle modifier, returning the new value
    pub fn toggle_shuffle(&self) -> bool {
        let (loop_enabled, shuffle) = {
            let mut state = self.lock();
            state.shuffle = !state.shuffle;
            (state.loop_enabled, state.shuffle)
        };
        self.emit(vec![PlaybackEvent::ModifiersChanged {
            loop_enabled,
            shuffle,
        }]);
        self.persist();
        shuffle
    }

    // ===== Transport events =====

    /// Apply a state change observed on the output device
    pub async fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Started => {
                let mut events = Vec::new();
                {
                    let mut state = self.lock();
                    if state.status != PlaybackStatus::Loading {
                        state.set_status(PlaybackStatus::Playing, &mut events);
                    }
                }
                self.emit(events);
            }
            TransportEvent::Paused => {
                let mut events = Vec::new();
                {
                    let mut state = self.lock();
                    if !matches!(state.status, PlaybackStatus::Loading | PlaybackStatus::Idle) {
                        state.set_status(PlaybackStatus::Paused, &mut events);
                    }
                }
                self.emit(events);
            }
            TransportEvent::NaturallyEnded => {
                // The source that ended may belong to a superseded request
                let owned = {
                    let state = self.lock();
                    state.status != PlaybackStatus::Loading && state.owns_device().is_some()
                };
                if owned {
                    self.on_natural_end().await;
                } else {
                    debug!("Ignoring end of a superseded source");
                }
            }
            TransportEvent::MetadataLoaded { duration } => self.apply_resume_point(duration).await,
            TransportEvent::TimeUpdate { position } => self.record_progress(position).await,
        }
    }

    /// Feed transport events from the host until the channel closes
    pub async fn run_transport_events(&self, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_transport_event(event).await;
        }
        debug!("Transport event channel closed");
    }

    async fn apply_resume_point(&self, duration: f64) {
        let Some(adapter) = self.shared.persistence.clone() else {
            return;
        };

        let target = {
            let state = self.lock();
            state
                .owns_device()
                .zip(state.queue.current_track().map(|track| track.id.clone()))
        };
        let Some((token, track_id)) = target else {
            return;
        };

        let Some(record) = adapter.load_progress(&track_id).await else {
            return;
        };
        let Some(position) = record.resume_target(duration, Utc::now().timestamp_millis()) else {
            debug!(track_id, t = record.t, duration, "Resume point not applicable");
            return;
        };

        let state = self.lock();
        if state.tokens.is_current(token) {
            match self.shared.transport.seek(position) {
                Ok(applied) => debug!(track_id, ?applied, "Resumed from saved position"),
                Err(e) => warn!(track_id, error = %e, "Failed to apply resume point"),
            }
        }
    }

    async fn record_progress(&self, position: f64) {
        let Some(adapter) = self.shared.persistence.clone() else {
            return;
        };

        let track_id = {
            let state = self.lock();
            if state.status != PlaybackStatus::Playing || state.owns_device().is_none() {
                return;
            }
            match state.queue.current_track() {
                Some(track) => track.id.clone(),
                None => return,
            }
        };

        if adapter.progress_due(&track_id, position, Instant::now()) {
            adapter
                .save_progress(&track_id, position, Utc::now().timestamp_millis())
                .await;
        }
    }

    // ===== Persistence =====

    /// Restore queue, position, volume, and modifiers from the store
    ///
    /// Status is always `Idle` afterwards; nothing auto-plays.
    pub async fn restore(&self) {
        let Some(adapter) = self.shared.persistence.clone() else {
            return;
        };

        let snapshot = adapter.load_snapshot().await;
        let position = snapshot.position();
        if position.is_none() && snapshot.current_index >= 0 {
            warn!(index = snapshot.current_index, "Dropping invalid restored position");
        }

        let mut events = Vec::new();
        let level = {
            let mut state = self.lock();
            state.tokens.mint();
            state.queue = QueueEngine::from_parts(snapshot.queue, position);
            state.current_url = None;
            state.loaded = None;
            state.volume = Volume::new(snapshot.volume);
            state.loop_enabled = snapshot.loop_enabled;
            state.shuffle = snapshot.shuffle;
            state.set_status(PlaybackStatus::Idle, &mut events);

            events.push(PlaybackEvent::QueueChanged {
                length: state.queue.len(),
            });
            events.push(state.track_event());
            events.push(PlaybackEvent::VolumeChanged {
                level: state.volume.level(),
            });
            events.push(PlaybackEvent::ModifiersChanged {
                loop_enabled: state.loop_enabled,
                shuffle: state.shuffle,
            });
            info!(
                queue_len = state.queue.len(),
                index = ?state.queue.current_index(),
                "Restored player state"
            );
            state.volume.level()
        };

        if self.shared.transport.is_attached() {
            if let Err(e) = self.shared.transport.set_volume(level) {
                warn!(error = %e, "Failed to set device volume");
            }
        }
        self.emit(events);
    }

    /// Restorable subset of the current state
    pub fn snapshot(&self) -> PersistedSnapshot {
        let state = self.lock();
        PersistedSnapshot {
            version: SNAPSHOT_VERSION,
            queue: state.queue.tracks().to_vec(),
            current_index: PersistedSnapshot::index_to_wire(state.queue.current_index()),
            current_song: state.queue.current_track().cloned(),
            volume: state.volume.level(),
            loop_enabled: state.loop_enabled,
            shuffle: state.shuffle,
        }
    }

    /// Write the snapshot in the background
    fn persist(&self) {
        let Some(adapter) = self.shared.persistence.clone() else {
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            warn!("No runtime available, snapshot not saved");
            return;
        };

        let controller = self.clone();
        handle.spawn(async move {
            adapter.save_snapshot_with(|| controller.snapshot()).await;
        });
    }

    /// Write the snapshot and wait for the write to finish
    pub async fn persist_now(&self) {
        if let Some(adapter) = &self.shared.persistence {
            adapter.save_snapshot_with(|| self.snapshot()).await;
        }
    }

    // ===== Observation =====

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }

    /// Read-only view of the observable state
    pub fn view(&self) -> PlayerView {
        let state = self.lock();
        PlayerView {
            status: state.status,
            current_song: state.queue.current_track().cloned(),
            current_index: state.queue.current_index(),
            queue_len: state.queue.len(),
            volume: state.volume.level(),
            loop_enabled: state.loop_enabled,
            shuffle: state.shuffle,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.lock().status
    }

    /// Copy of the queue contents
    pub fn queue(&self) -> Vec<Track> {
        self.lock().queue.tracks().to_vec()
    }

    /// Next track in linear order, if any
    pub fn peek_next(&self) -> Option<Track> {
        self.lock().queue.peek_next().cloned()
    }

    /// URL of the source loaded for the current track
    pub fn current_url(&self) -> Option<String> {
        self.lock().current_url.clone()
    }

    /// Cached media URL for `track_id`
    pub fn cached_source(&self, track_id: &str) -> Option<String> {
        self.shared.resolver.cached(track_id)
    }
}
