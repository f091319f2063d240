//! Domain types shared across Cadence Player crates

mod history;
mod quality;
mod track;

pub use history::HistoryEntry;
pub use quality::Quality;
pub use track::Track;
