//! Shuffle index selection
//!
//! Shuffle never reorders the queue; on advance it picks a uniformly random
//! position different from the current one.

use rand::Rng;

/// Pick a random queue index different from `current`
///
/// - `len <= 1`: returns 0 (replay the only track)
/// - `current` unset or out of range: uniform over `0..len`
/// - otherwise: uniform over the other `len - 1` indices
///
/// A single draw over `len - 1` slots, shifted past `current`, keeps the pick
/// uniform without a retry loop.
pub fn pick_other_index<R: Rng + ?Sized>(rng: &mut R, len: usize, current: Option<usize>) -> usize {
    if len <= 1 {
        return 0;
    }

    match current {
        Some(current) if current < len => {
            let pick = rng.gen_range(0..len - 1);
            if pick >= current {
                pick + 1
            } else {
                pick
            }
        }
        _ => rng.gen_range(0..len),
    }
}
