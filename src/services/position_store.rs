//! Shared last-known-position store for active tracks
//!
//! One entry per currently-active track, keyed by track_id. The store is
//! shared across all camera workers because track ids are treated as
//! globally unique to the process; the inner mutex makes lookup-then-write
//! on one entry mutually exclusive across workers. The lock is only ever
//! held for a single map operation, never across IO.

use crate::domain::types::{TrackId, TrackPosition};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct TrackPositionStore {
    positions: Mutex<FxHashMap<TrackId, TrackPosition>>,
}

impl TrackPositionStore {
    pub fn new() -> Self {
        Self { positions: Mutex::new(FxHashMap::default()) }
    }

    pub fn get(&self, track_id: TrackId) -> Option<TrackPosition> {
        self.positions.lock().get(&track_id).copied()
    }

    /// Store the new position and return the previous one, atomically
    pub fn upsert(&self, track_id: TrackId, position: TrackPosition) -> Option<TrackPosition> {
        self.positions.lock().insert(track_id, position)
    }

    /// Remove a track's position, e.g. when the track ends
    pub fn remove(&self, track_id: TrackId) -> Option<TrackPosition> {
        self.positions.lock().remove(&track_id)
    }

    pub fn clear(&self) {
        self.positions.lock().clear();
    }

    /// Evict entries not updated within `max_age_secs`. Tracks that never
    /// send an explicit end signal would otherwise accumulate for the
    /// lifetime of the process. Returns the number of evicted entries.
    pub fn evict_stale(&self, now: f64, max_age_secs: f64) -> usize {
        let mut positions = self.positions.lock();
        let before = positions.len();
        positions.retain(|_, pos| now - pos.at <= max_age_secs);
        before - positions.len()
    }

    pub fn len(&self) -> usize {
        self.positions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.lock().is_empty()
    }
}
