//! Crossing debounce - per-track suppression of spurious re-triggers
//!
//! Prevents double-counting when a tracked person hesitates at the line
//! or when tracker jitter produces rapid repeated crossings. Two guards
//! apply after the first accepted crossing for a track:
//! - a crossing within `MIN_CROSS_INTERVAL_SECS` of the last accepted
//!   one is ignored
//! - a crossing in the same direction as the last accepted one is
//!   ignored (the track never genuinely crossed back)
//!
//! Timestamps are injected by the caller, so the logic is deterministic
//! under test.

use crate::domain::types::{Direction, TrackId};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Minimum interval between countable crossings for the same track
pub const MIN_CROSS_INTERVAL_SECS: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
struct DebounceState {
    last_cross_time: f64,
    last_direction: Direction,
}

/// Per-track crossing debounce state machine
#[derive(Debug, Default)]
pub struct CrossingDebouncer {
    states: FxHashMap<TrackId, DebounceState>,
}

impl CrossingDebouncer {
    pub fn new() -> Self {
        Self { states: FxHashMap::default() }
    }

    /// Decide whether a detected crossing should be counted.
    ///
    /// Accepts and records the crossing unless one of the guards
    /// rejects it; rejections leave the stored state untouched.
    pub fn should_count(&mut self, track_id: TrackId, direction: Direction, now: f64) -> bool {
        let Some(state) = self.states.get(&track_id) else {
            // First crossing for this track is always counted
            self.states.insert(track_id, DebounceState { last_cross_time: now, last_direction: direction });
            return true;
        };

        let since_last = now - state.last_cross_time;
        if since_last < MIN_CROSS_INTERVAL_SECS {
            debug!(
                track_id = %track_id,
                direction = %direction.as_str(),
                since_last_secs = %since_last,
                "crossing_debounced_too_soon"
            );
            return false;
        }

        if direction == state.last_direction {
            debug!(
                track_id = %track_id,
                direction = %direction.as_str(),
                "crossing_debounced_same_direction"
            );
            return false;
        }

        self.states.insert(track_id, DebounceState { last_cross_time: now, last_direction: direction });
        true
    }

    /// Drop the stored state for a track, e.g. when the track ends.
    ///
    /// Without this an ended track's identity could be reused later and
    /// inherit stale debounce state.
    pub fn reset(&mut self, track_id: TrackId) {
        self.states.remove(&track_id);
    }

    /// Drop all stored state
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Evict entries whose last accepted crossing is older than `max_age_secs`.
    /// Returns the number of evicted entries.
    pub fn evict_stale(&mut self, now: f64, max_age_secs: f64) -> usize {
        let before = self.states.len();
        self.states.retain(|_, state| now - state.last_cross_time <= max_age_secs);
        before - self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
