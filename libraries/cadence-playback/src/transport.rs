//! Output device abstraction and the transport that drives it
//!
//! The device is whatever actually renders audio (a browser element, a
//! native player, a simulated clock). It is bound once and never swapped.

use crate::error::{PlaybackError, Result};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Platform audio output
///
/// Implementors report observed state changes back to the controller as
/// [`TransportEvent`](crate::events::TransportEvent)s.
#[async_trait]
pub trait OutputDevice: Send + Sync {
    /// Point the device at a new stream URL
    fn set_source(&self, url: &str);

    /// Drop the current source
    fn clear_source(&self);

    /// Start or resume playback
    ///
    /// # Errors
    /// Returns `PlaybackError::PlaybackRejected` if the device refuses to start
    async fn play(&self) -> Result<()>;

    /// Pause playback; pausing a paused device is a no-op
    fn pause(&self);

    /// Move the play head, in seconds
    fn set_position(&self, seconds: f64);

    /// Current play head, in seconds
    fn position(&self) -> f64;

    /// Duration of the loaded source, if known
    fn duration(&self) -> Option<f64>;

    /// Output gain in `[0, 1]`
    fn set_volume(&self, level: f32);
}

/// Owns the single output device handle
#[derive(Default)]
pub struct TransportController {
    device: OnceLock<Arc<dyn OutputDevice>>,
}

impl TransportController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the output device
    ///
    /// # Errors
    /// Returns `PlaybackError::DeviceAlreadyAttached` on a second call
    pub fn attach(&self, device: Arc<dyn OutputDevice>) -> Result<()> {
        self.device
            .set(device)
            .map_err(|_| PlaybackError::DeviceAlreadyAttached)
    }

    pub fn is_attached(&self) -> bool {
        self.device.get().is_some()
    }

    fn device(&self) -> Result<&Arc<dyn OutputDevice>> {
        self.device.get().ok_or(PlaybackError::NoDevice)
    }

    /// Set the source and rewind to zero
    pub fn load(&self, url: &str) -> Result<()> {
        let device = self.device()?;
        debug!(url, "Loading source");
        device.set_source(url);
        device.set_position(0.0);
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        self.device()?.play().await
    }

    pub fn pause(&self) -> Result<()> {
        self.device()?.pause();
        Ok(())
    }

    /// Seek to `seconds`, clamped to `[0, duration]`
    ///
    /// Returns the applied position, or `None` if the duration is unknown.
    pub fn seek(&self, seconds: f64) -> Result<Option<f64>> {
        let device = self.device()?;

        let Some(duration) = device.duration().filter(|d| d.is_finite() && *d >= 0.0) else {
            debug!(seconds, "Seek ignored, duration unknown");
            return Ok(None);
        };

        let target = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, duration)
        };
        device.set_position(target);
        Ok(Some(target))
    }

    /// Set output gain, clamped to `[0, 1]`
    pub fn set_volume(&self, level: f32) -> Result<()> {
        let level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
        self.device()?.set_volume(level);
        Ok(())
    }

    /// Pause and rewind, keeping the source
    pub fn stop(&self) -> Result<()> {
        let device = self.device()?;
        device.pause();
        device.set_position(0.0);
        Ok(())
    }

    /// Pause and drop the source
    pub fn unload(&self) -> Result<()> {
        let device = self.device()?;
        device.pause();
        device.clear_source();
        Ok(())
    }

    pub fn position(&self) -> Option<f64> {
        self.device.get().map(|device| device.position())
    }

    pub fn duration(&self) -> Option<f64> {
        self.device.get().and_then(|device| device.duration())
    }
}
