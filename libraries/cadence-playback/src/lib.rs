//! Cadence Player - Playback Control
//!
//! Platform-agnostic playback control for a streaming front-end.
//!
//! This crate provides:
//! - Play queue with current position (duplicates allowed)
//! - Media source resolution with a bounded per-session URL cache
//! - Transport state machine (idle, loading, playing, paused)
//! - Request tokens so only the latest play request takes effect
//! - Loop and shuffle modifiers
//! - Persisted queue snapshot and per-track resume points
//! - Fire-and-forget playback history reporting
//!
//! # Architecture
//!
//! `cadence-playback` owns no I/O of its own. The catalog backend, durable
//! storage, identity, and the audio output are all injected through traits
//! (`MediaSourceApi`, `StateStore`, `IdentityProvider`, `OutputDevice`).
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use cadence_core::{MediaSourceApi, Quality, Track};
//! use cadence_playback::{PlaybackConfig, PlaybackController};
//! use std::sync::Arc;
//!
//! struct Catalog;
//!
//! #[async_trait]
//! impl MediaSourceApi for Catalog {
//!     async fn resolve_media_source(
//!         &self,
//!         track_id: &str,
//!         _quality: Quality,
//!     ) -> cadence_core::Result<String> {
//!         Ok(format!("https://cdn.example/{track_id}.m4a"))
//!     }
//! }
//!
//! # async fn run(device: Arc<dyn cadence_playback::OutputDevice>) {
//! let controller = PlaybackController::new(PlaybackConfig::default(), Arc::new(Catalog));
//! controller.attach(device).unwrap();
//!
//! let queue = vec![
//!     Track::new("a", "First", "Artist"),
//!     Track::new("b", "Second", "Artist"),
//! ];
//! controller.play_queue(queue, 0).await;
//! controller.next().await;
//! controller.toggle_play().await;
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod events;
pub mod history;
pub mod manager;
pub mod persistence;
pub mod queue;
pub mod resolver;
pub mod shuffle;
pub mod token;
pub mod transport;
pub mod types;
pub mod volume;

pub use error::{PlaybackError, Result};
pub use events::{PlaybackEvent, TransportEvent};
pub use history::HistoryReporter;
pub use manager::{PlaybackController, PlaybackControllerBuilder};
pub use persistence::{PersistedSnapshot, PersistenceAdapter, ProgressRecord};
pub use queue::QueueEngine;
pub use resolver::MediaSourceResolver;
pub use token::RequestToken;
pub use transport::{OutputDevice, TransportController};
pub use types::{PlaybackConfig, PlaybackStatus, PlayerView};
pub use volume::Volume;
