//! Cadence Player Core
//!
//! Shared domain types, collaborator traits, and error handling for Cadence Player.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `HistoryEntry`, `Quality`
//! - **Collaborator Traits**: `MediaSourceApi`, `HistoryApi`, `StateStore`, `IdentityProvider`
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! The playback engine depends only on these traits; the HTTP client and the
//! SQLite store implement them.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::types::{HistoryEntry, Quality, Track};
//!
//! let track = Track::new("004Z8Ihr0JIu5s", "Sunny Day", "Jay Chou")
//!     .with_album("Yeh Hui-Mei")
//!     .with_duration(269.0);
//!
//! let entry = HistoryEntry::from_track(&track, chrono::Utc::now());
//! assert_eq!(entry.track_id, track.id);
//! assert_eq!(Quality::default().as_str(), "standard");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use traits::{HistoryApi, IdentityProvider, MediaSourceApi, StateStore, StaticIdentity};
pub use types::{HistoryEntry, Quality, Track};
