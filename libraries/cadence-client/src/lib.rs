//! Cadence Catalog Client
//!
//! HTTP client for the catalog proxy that fronts the streaming service.
//!
//! # Features
//!
//! - **Media**: resolve streamable URLs at a requested quality, fetch lyrics
//! - **Browse**: search, charts, recommended playlists, playlist contents
//! - **History**: read and append a user's playback history
//!
//! `CatalogClient` implements `MediaSourceApi` and `HistoryApi`, so it plugs
//! straight into the playback controller.
//!
//! # Example
//!
//! ```ignore
//! use cadence_client::{CatalogClient, ClientConfig};
//! use cadence_core::Quality;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(ClientConfig::new("http://localhost:4000"))?;
//!
//!     let page = client.search("sunny day", 1).await?;
//!     let track = &page.tracks[0];
//!
//!     let url = client.media_source_url(&track.id, Quality::High).await?;
//!     println!("{} -> {}", track.title, url);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{CatalogClient, TrackPage};
pub use error::{ClientError, Result};
pub use types::{
    ClientConfig, LyricsResponse, MusicItem, RecommendSheet, RecommendSheetsResponse,
    RecommendTag, RecommendTagGroup, RecommendTagsResponse, TopListDetail, TopListGroup,
    TopListSummary, DEFAULT_BASE_URL,
};
