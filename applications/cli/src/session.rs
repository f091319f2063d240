//! Console output for a running controller

use cadence_core::Track;
use cadence_playback::{PlaybackController, PlaybackEvent, PlaybackStatus};
use std::future::Future;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Why [`watch`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The queue played out and the controller went idle
    Finished,
    /// Playback paused on its own; nothing headless can resume it
    Stalled,
    /// The shutdown future completed
    Interrupted,
    /// The controller dropped its event channel
    Closed,
}

/// Print playback events until the session ends
pub async fn watch<F>(
    controller: &PlaybackController,
    events: &mut broadcast::Receiver<PlaybackEvent>,
    shutdown: F,
) -> SessionEnd
where
    F: Future,
{
    tokio::pin!(shutdown);
    let mut queue_len = controller.queue().len();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted");
                return SessionEnd::Interrupted;
            }
            event = events.recv() => match event {
                Ok(PlaybackEvent::QueueChanged { length }) => queue_len = length,
                Ok(PlaybackEvent::TrackChanged { track: Some(track), index }) => {
                    let position = index.map_or(0, |i| i + 1);
                    println!("[{position}/{queue_len}] {}", describe(&track));
                }
                Ok(PlaybackEvent::StatusChanged { status }) => {
                    println!("  {status}");
                    match status {
                        PlaybackStatus::Idle => return SessionEnd::Finished,
                        PlaybackStatus::Paused => {
                            if controller.current_url().is_none() {
                                println!("  could not load the current track");
                            } else {
                                println!("  output refused to start");
                            }
                            return SessionEnd::Stalled;
                        }
                        PlaybackStatus::Loading | PlaybackStatus::Playing => {}
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event stream lagged"),
                Err(RecvError::Closed) => return SessionEnd::Closed,
            }
        }
    }
}

/// One-line "title - artist (album)" rendering
pub fn describe(track: &Track) -> String {
    match &track.album {
        Some(album) => format!("{} - {} ({album})", track.title, track.artist),
        None => format!("{} - {}", track.title, track.artist),
    }
}
