//! Cadence CLI - headless host for the playback engine
//!
//! Wires the catalog client, SQLite state store, and a simulated output
//! device into a [`cadence_playback::PlaybackController`].

pub mod config;
pub mod device;
pub mod session;

pub use config::AppConfig;
pub use device::{SimulatedDevice, SimulatedDeviceConfig};
pub use session::{watch, SessionEnd};
