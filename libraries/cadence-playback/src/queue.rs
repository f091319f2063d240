//! Play queue and current position
//!
//! The queue is an ordered list of tracks. Duplicates are allowed and are
//! distinct positions. The position is either unset or a valid index:
//!
//! ```text
//! tracks:   [ A ][ B ][ A ][ C ]
//!                      ^
//! current:  Some(2)    (the second A, not the first)
//! ```
//!
//! All index arithmetic for next/previous/shuffle lives here. Mutation goes
//! through `PlaybackController` so queue and status never diverge.

use crate::shuffle::pick_other_index;
use cadence_core::Track;
use rand::Rng;

/// Ordered queue plus current position
#[derive(Debug, Clone, Default)]
pub struct QueueEngine {
    tracks: Vec<Track>,
    current: Option<usize>,
}

impl QueueEngine {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from restored parts
    ///
    /// An out-of-range `current` is dropped.
    pub fn from_parts(tracks: Vec<Track>, current: Option<usize>) -> Self {
        let current = current.filter(|&index| index < tracks.len());
        Self { tracks, current }
    }

    /// Replace the queue contents wholesale
    ///
    /// The position survives only if it still fits the new queue; callers
    /// normally follow up with `select`.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        if self.current.is_some_and(|index| index >= self.tracks.len()) {
            self.current = None;
        }
    }

    /// Move the position to `index`
    ///
    /// Returns the selected track, or `None` (position untouched) if `index`
    /// is out of range.
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index < self.tracks.len() {
            self.current = Some(index);
            self.tracks.get(index)
        } else {
            None
        }
    }

    /// Unset the position
    pub fn clear_position(&mut self) {
        self.current = None;
    }

    /// All tracks in queue order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Current position
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Track at the current position
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|index| self.tracks.get(index))
    }

    /// Linear successor of the current position
    ///
    /// An unset position advances to 0. Returns `None` past the end.
    pub fn next_index(&self) -> Option<usize> {
        let next = self.current.map_or(0, |index| index + 1);
        (next < self.tracks.len()).then_some(next)
    }

    /// Linear predecessor, clamped to 0 (never wraps)
    pub fn previous_index(&self) -> usize {
        self.current
            .and_then(|index| index.checked_sub(1))
            .unwrap_or(0)
    }

    /// Random index different from the current one (0 for single-track queues)
    pub fn shuffle_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        pick_other_index(rng, self.tracks.len(), self.current)
    }

    /// Peek at the linear successor without moving
    pub fn peek_next(&self) -> Option<&Track> {
        self.next_index().and_then(|index| self.tracks.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {id}"), "Test Artist").with_duration(180.0)
    }

    fn queue_of(ids: &[&str]) -> QueueEngine {
        QueueEngine::from_parts(ids.iter().map(|id| create_test_track(id)).collect(), None)
    }

    #[test]
    fn select_sets_position() {
        let mut queue = queue_of(&["a", "b", "c"]);

        let track = queue.select(1).cloned();
        assert_eq!(track.map(|t| t.id), Some("b".to_string()));
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.current_track().map(|t| t.id.as_str()), Some("b"));
    }

    #[test]
    fn select_out_of_range_keeps_position() {
        let mut queue = queue_of(&["a", "b"]);
        queue.select(1);

        assert!(queue.select(5).is_none());
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn duplicates_are_distinct_positions() {
        let mut queue = queue_of(&["a", "b", "a"]);
        queue.select(2);

        assert_eq!(queue.current_index(), Some(2));
        assert_eq!(queue.next_index(), None);
        assert_eq!(queue.previous_index(), 1);
    }

    #[test]
    fn from_parts_drops_invalid_position() {
        let tracks = vec![create_test_track("a")];
        let queue = QueueEngine::from_parts(tracks, Some(3));
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn replace_with_shorter_queue_unsets_position() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(2);

        queue.replace(vec![create_test_track("x")]);
        assert_eq!(queue.current_index(), None);

        queue.replace(Vec::new());
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn replace_keeps_fitting_position() {
        let mut queue = queue_of(&["a", "b"]);
        queue.select(1);

        queue.replace(vec![create_test_track("x"), create_test_track("y")]);
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.current_track().map(|t| t.id.as_str()), Some("y"));
    }

    #[test]
    fn next_index_walks_to_end() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.next_index(), Some(0));

        queue.select(0);
        assert_eq!(queue.next_index(), Some(1));
        queue.select(2);
        assert_eq!(queue.next_index(), None);
        assert!(queue.peek_next().is_none());
    }

    #[test]
    fn previous_index_clamps_to_zero() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.previous_index(), 0);

        queue.select(0);
        assert_eq!(queue.previous_index(), 0);

        queue.select(2);
        assert_eq!(queue.previous_index(), 1);
    }

    #[test]
    fn shuffle_index_avoids_current() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut queue = queue_of(&["a", "b"]);
        queue.select(0);

        for _ in 0..100 {
            assert_eq!(queue.shuffle_index(&mut rng), 1);
        }
    }

    #[test]
    fn peek_next_returns_successor() {
        let mut queue = queue_of(&["a", "b"]);
        queue.select(0);
        assert_eq!(queue.peek_next().map(|t| t.id.as_str()), Some("b"));
    }
}
