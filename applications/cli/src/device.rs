//! Simulated output device
//!
//! Renders nothing. A clock task advances the play head while "playing" and
//! reports what a real audio element would: metadata on load, periodic time
//! updates, and the natural end of the source.

use async_trait::async_trait;
use cadence_playback::{OutputDevice, PlaybackError, TransportEvent};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedDeviceConfig {
    /// Length of every loaded source, in seconds
    pub track_seconds: f64,

    /// Simulated seconds per real second
    pub speed: f64,

    /// Real time between play head updates, in milliseconds
    pub tick_ms: u64,
}

impl Default for SimulatedDeviceConfig {
    fn default() -> Self {
        Self {
            track_seconds: 30.0,
            speed: 1.0,
            tick_ms: 250,
        }
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    source: Option<String>,
    position: f64,
    playing: bool,
    volume: f32,
}

pub struct SimulatedDevice {
    config: SimulatedDeviceConfig,
    state: Mutex<DeviceState>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl SimulatedDevice {
    /// Create a device and the receiver for its transport events
    pub fn new(
        config: SimulatedDeviceConfig,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let device = Arc::new(Self {
            config,
            state: Mutex::new(DeviceState::default()),
            events,
        });
        (device, rx)
    }

    /// Start the clock; it stops once the device is dropped
    pub fn spawn_clock(self: &Arc<Self>) -> JoinHandle<()> {
        let device: Weak<Self> = Arc::downgrade(self);
        let tick = Duration::from_millis(self.config.tick_ms.max(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            let mut last = interval.tick().await;

            loop {
                let now = interval.tick().await;
                let elapsed = now - last;
                last = now;

                let Some(device) = device.upgrade() else {
                    break;
                };
                for event in device.advance(elapsed) {
                    device.emit(event);
                }
            }
            debug!("Simulated clock stopped");
        })
    }

    /// Move the play head forward by `elapsed` real time
    ///
    /// Returns the events the move produced; the caller delivers them.
    pub fn advance(&self, elapsed: Duration) -> Vec<TransportEvent> {
        let mut state = self.lock();
        if !state.playing || state.source.is_none() {
            return Vec::new();
        }

        let length = self.config.track_seconds;
        state.position += elapsed.as_secs_f64() * self.config.speed;

        if state.position >= length {
            state.position = length;
            state.playing = false;
            vec![
                TransportEvent::TimeUpdate { position: length },
                TransportEvent::NaturallyEnded,
            ]
        } else {
            vec![TransportEvent::TimeUpdate {
                position: state.position,
            }]
        }
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    fn emit(&self, event: TransportEvent) {
        trace!(?event, "Device event");
        if self.events.send(event).is_err() {
            debug!("Transport listener gone, dropping event");
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OutputDevice for SimulatedDevice {
    fn set_source(&self, url: &str) {
        {
            let mut state = self.lock();
            state.source = Some(url.to_string());
            state.position = 0.0;
            state.playing = false;
        }
        debug!(url, "Source loaded");
        self.emit(TransportEvent::MetadataLoaded {
            duration: self.config.track_seconds,
        });
    }

    fn clear_source(&self) {
        let mut state = self.lock();
        state.source = None;
        state.position = 0.0;
        state.playing = false;
    }

    async fn play(&self) -> cadence_playback::Result<()> {
        let started = {
            let mut state = self.lock();
            if state.source.is_none() {
                return Err(PlaybackError::PlaybackRejected("no source loaded".into()));
            }
            !std::mem::replace(&mut state.playing, true)
        };
        if started {
            self.emit(TransportEvent::Started);
        }
        Ok(())
    }

    fn pause(&self) {
        let paused = std::mem::replace(&mut self.lock().playing, false);
        if paused {
            self.emit(TransportEvent::Paused);
        }
    }

    fn set_position(&self, seconds: f64) {
        let mut state = self.lock();
        if state.source.is_some() {
            state.position = seconds.clamp(0.0, self.config.track_seconds);
        }
    }

    fn position(&self) -> f64 {
        self.lock().position
    }

    fn duration(&self) -> Option<f64> {
        self.lock().source.as_ref().map(|_| self.config.track_seconds)
    }

    fn set_volume(&self, level: f32) {
        self.lock().volume = level;
    }
}
