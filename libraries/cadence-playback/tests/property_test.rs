//! Property-based tests for queue and shuffle invariants

use cadence_core::Track;
use cadence_playback::{shuffle::pick_other_index, QueueEngine, Volume};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ===== Helpers =====

fn arbitrary_track() -> impl Strategy<Value = Track> {
    (
        "[a-z0-9]{1,10}",   // id
        "[A-Za-z ]{1,30}",  // title
        "[A-Za-z ]{1,20}",  // artist
        proptest::option::of(1.0f64..600.0),
    )
        .prop_map(|(id, title, artist, duration)| {
            let track = Track::new(id, title, artist);
            match duration {
                Some(seconds) => track.with_duration(seconds),
                None => track,
            }
        })
}

fn arbitrary_tracks() -> impl Strategy<Value = Vec<Track>> {
    prop::collection::vec(arbitrary_track(), 0..40)
}

// ===== Property Tests =====

proptest! {
    /// Property: a shuffle pick never repeats the current index when another exists
    #[test]
    fn shuffle_pick_differs_from_current(len in 2usize..64, seed in any::<u64>(), current in 0usize..64) {
        let current = current % len;
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..50 {
            let pick = pick_other_index(&mut rng, len, Some(current));
            prop_assert_ne!(pick, current);
            prop_assert!(pick < len);
        }
    }

    /// Property: position is always unset or a valid index
    #[test]
    fn position_always_valid(
        first in arbitrary_tracks(),
        second in arbitrary_tracks(),
        selects in prop::collection::vec(0usize..50, 0..20),
    ) {
        let mut queue = QueueEngine::from_parts(first, None);

        for index in &selects {
            queue.select(*index);
            prop_assert!(queue.current_index().map_or(true, |i| i < queue.len()));
        }

        queue.replace(second);
        prop_assert!(queue.current_index().map_or(true, |i| i < queue.len()));
        prop_assert_eq!(queue.current_track().is_some(), queue.current_index().is_some());
    }

    /// Property: linear advance visits every index exactly once, in order
    #[test]
    fn linear_advance_visits_all(tracks in arbitrary_tracks()) {
        let len = tracks.len();
        let mut queue = QueueEngine::from_parts(tracks, None);
        let mut visited = Vec::new();

        while let Some(next) = queue.next_index() {
            queue.select(next);
            visited.push(next);
        }

        prop_assert_eq!(visited, (0..len).collect::<Vec<_>>());
    }

    /// Property: previous never underflows
    #[test]
    fn previous_never_underflows(tracks in arbitrary_tracks(), start in 0usize..40) {
        let mut queue = QueueEngine::from_parts(tracks, None);
        queue.select(start);

        for _ in 0..45 {
            let previous = queue.previous_index();
            prop_assert!(previous == 0 || previous < queue.len());
            queue.select(previous);
        }
    }

    /// Property: volume always lands in [0, 1]
    #[test]
    fn volume_always_in_range(level in any::<f32>()) {
        let mut volume = Volume::default();
        volume.set_level(level);
        prop_assert!((0.0..=1.0).contains(&volume.level()));
    }
}
