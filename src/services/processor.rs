//! Centroid processing - turns tracked positions into crossing events
//!
//! For each new centroid the processor updates the track's last-known
//! position, runs crossing detection against the camera's configured
//! line, resolves enter/exit semantics, applies the direction filter and
//! the debouncer, and persists accepted events. Every discard path is a
//! normal Ok(None) outcome; only a persistence failure is an error.

use crate::domain::geometry::{detect_crossing, side_of_line};
use crate::domain::types::{
    CameraId, CrossingEvent, EventKind, LineConfig, Point, Side, TrackId, TrackPosition,
};
use crate::infra::metrics::Metrics;
use crate::io::events::EventSink;
use crate::services::debounce::CrossingDebouncer;
use crate::services::position_store::TrackPositionStore;
use anyhow::Context;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

pub struct CentroidProcessor {
    /// Last-known positions, shared across all camera workers
    positions: Arc<TrackPositionStore>,
    /// Debounce state, keyed by track_id like the position store
    debouncer: Mutex<CrossingDebouncer>,
    /// Persistence collaborator for accepted events
    sink: Arc<dyn EventSink>,
    /// Metrics collector
    metrics: Arc<Metrics>,
}

impl CentroidProcessor {
    pub fn new(
        positions: Arc<TrackPositionStore>,
        sink: Arc<dyn EventSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { positions, debouncer: Mutex::new(CrossingDebouncer::new()), sink, metrics }
    }

    /// Process one centroid observation for a track.
    ///
    /// Returns Ok(Some) only for an accepted, persisted event. The
    /// position upsert happens unconditionally before any decision, and
    /// position/debounce state is not rolled back when persistence fails:
    /// a replayed detection must not double-count.
    pub fn process(
        &self,
        camera_id: CameraId,
        track_id: TrackId,
        x: f64,
        y: f64,
        config: &LineConfig,
        now: f64,
    ) -> anyhow::Result<Option<CrossingEvent>> {
        let prev = self.positions.upsert(track_id, TrackPosition { x, y, at: now });

        // A crossing requires two samples
        let Some(prev) = prev else {
            return Ok(None);
        };

        let prev_point = Point::new(prev.x, prev.y);
        let curr_point = Point::new(x, y);

        let Some(direction) = detect_crossing(prev_point, curr_point, &config.line) else {
            return Ok(None);
        };
        self.metrics.record_crossing_detected();

        let kind = resolve_event_kind(prev_point, direction.into(), config);

        if !config.direction.allows(kind) {
            self.metrics.record_filter_rejected();
            debug!(
                camera_id = %camera_id,
                track_id = %track_id,
                event = %kind.as_str(),
                "crossing_filtered_by_direction"
            );
            return Ok(None);
        }

        // Debounce on the geometric direction, not the resolved label, so
        // entrance-side relabeling cannot destabilize the guards
        if !self.debouncer.lock().should_count(track_id, direction, now) {
            self.metrics.record_debounce_rejected();
            return Ok(None);
        }

        let event = CrossingEvent::new(camera_id, kind, track_id, now);
        self.sink
            .append(&event)
            .with_context(|| format!("persist crossing event for track {track_id}"))?;

        self.metrics.record_event_accepted();
        info!(
            camera_id = %camera_id,
            event = %kind.as_str(),
            track_id = %track_id,
            direction = %direction.as_str(),
            "crossing_event"
        );

        Ok(Some(event))
    }

    /// Drop all state for an ended track
    pub fn end_track(&self, track_id: TrackId) {
        self.positions.remove(track_id);
        self.debouncer.lock().reset(track_id);
        debug!(track_id = %track_id, "track_state_cleared");
    }

    /// Drop all per-track state
    pub fn clear_all(&self) {
        self.positions.clear();
        self.debouncer.lock().clear();
    }

    /// Evict per-track state not touched within `max_age_secs`
    pub fn sweep_stale(&self, now: f64, max_age_secs: f64) {
        let positions_evicted = self.positions.evict_stale(now, max_age_secs);
        let debounce_evicted = self.debouncer.lock().evict_stale(now, max_age_secs);
        if positions_evicted > 0 || debounce_evicted > 0 {
            info!(
                positions_evicted = %positions_evicted,
                debounce_evicted = %debounce_evicted,
                "stale_track_state_evicted"
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_count(&self) -> usize {
        self.positions.len()
    }
}

/// Map a geometric crossing onto enter/exit semantics.
///
/// With an entrance side configured, a track coming from that side is
/// entering regardless of line orientation. If either side classification
/// is ambiguous (exactly on the line) the geometric rule applies.
fn resolve_event_kind(prev_point: Point, geometric: EventKind, config: &LineConfig) -> EventKind {
    let Some(entrance_side) = config.entrance_side else {
        return geometric;
    };

    let prev_side = side_of_line(prev_point, &config.line);
    let entr_side = side_of_line(entrance_side, &config.line);
    if prev_side == Side::OnLine || entr_side == Side::OnLine {
        return geometric;
    }

    if prev_side == entr_side {
        EventKind::Enter
    } else {
        EventKind::Exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DirectionFilter, Line};
    use anyhow::bail;

    /// In-memory sink capturing appended events
    #[derive(Default)]
    struct MemorySink {
        events: Mutex<Vec<CrossingEvent>>,
    }

    impl EventSink for MemorySink {
        fn append(&self, event: &CrossingEvent) -> anyhow::Result<()> {
            self.events.lock().push(event.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn append(&self, _event: &CrossingEvent) -> anyhow::Result<()> {
            bail!("sink unavailable")
        }
    }

    fn vertical_line_config() -> LineConfig {
        LineConfig {
            line: Line::new(0.0, 0.0, 0.0, 10.0),
            direction: DirectionFilter::Both,
            entrance_side: None,
        }
    }

    fn processor_with_sink(sink: Arc<dyn EventSink>) -> CentroidProcessor {
        CentroidProcessor::new(
            Arc::new(TrackPositionStore::new()),
            sink,
            Arc::new(Metrics::new()),
        )
    }

    #[test]
    fn test_first_observation_returns_none() {
        let processor = processor_with_sink(Arc::new(MemorySink::default()));
        let config = vertical_line_config();

        let result = processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 100.0).unwrap();
        assert!(result.is_none());
        // Position was still recorded
        assert_eq!(processor.tracked_count(), 1);
    }

    #[test]
    fn test_crossing_emits_enter_event() {
        let sink = Arc::new(MemorySink::default());
        let processor = processor_with_sink(sink.clone());
        let config = vertical_line_config();

        processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 100.0).unwrap();
        let event = processor
            .process(CameraId(1), TrackId(7), 1.0, 5.0, &config, 101.0)
            .unwrap()
            .expect("crossing event");

        assert_eq!(event.camera_id, CameraId(1));
        assert_eq!(event.event, EventKind::Enter);
        assert_eq!(event.track_id, TrackId(7));
        assert_eq!(sink.events.lock().len(), 1);
    }

    #[test]
    fn test_no_crossing_no_event() {
        let processor = processor_with_sink(Arc::new(MemorySink::default()));
        let config = vertical_line_config();

        processor.process(CameraId(1), TrackId(7), -1.0, 2.0, &config, 100.0).unwrap();
        let result = processor.process(CameraId(1), TrackId(7), -2.0, 8.0, &config, 101.0).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_direction_filter_suppresses_exit() {
        let sink = Arc::new(MemorySink::default());
        let processor = processor_with_sink(sink.clone());
        let mut config = vertical_line_config();
        config.direction = DirectionFilter::In;

        // Right-to-left crossing is an exit under the geometric rule
        processor.process(CameraId(1), TrackId(7), 1.0, 5.0, &config, 100.0).unwrap();
        let result = processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 101.0).unwrap();

        assert!(result.is_none());
        assert!(sink.events.lock().is_empty());
    }

    #[test]
    fn test_debounce_suppresses_rapid_recross() {
        let sink = Arc::new(MemorySink::default());
        let processor = processor_with_sink(sink.clone());
        let config = vertical_line_config();

        processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 100.0).unwrap();
        let first = processor.process(CameraId(1), TrackId(7), 1.0, 5.0, &config, 101.0).unwrap();
        assert!(first.is_some());

        // Crosses back 1s later: geometric crossing but debounced
        let second = processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 102.0).unwrap();
        assert!(second.is_none());

        // And again past the interval, opposite direction: accepted
        processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 104.5).unwrap();
        let third = processor.process(CameraId(1), TrackId(7), 1.0, 5.0, &config, 105.0).unwrap();
        assert!(third.is_none(), "same geometric direction as the first accepted crossing");

        assert_eq!(sink.events.lock().len(), 1);
    }

    #[test]
    fn test_entrance_side_override() {
        let sink = Arc::new(MemorySink::default());
        let processor = processor_with_sink(sink.clone());
        let mut config = vertical_line_config();

        // Entrance side on the same side as the track's previous position:
        // the crossing is an enter
        config.entrance_side = Some(Point::new(-5.0, 5.0));
        processor.process(CameraId(1), TrackId(1), -1.0, 5.0, &config, 100.0).unwrap();
        let event = processor
            .process(CameraId(1), TrackId(1), 1.0, 5.0, &config, 101.0)
            .unwrap()
            .expect("event");
        assert_eq!(event.event, EventKind::Enter);

        // Entrance side on the opposite side: same motion is an exit
        config.entrance_side = Some(Point::new(5.0, 5.0));
        processor.process(CameraId(1), TrackId(2), -1.0, 5.0, &config, 100.0).unwrap();
        let event = processor
            .process(CameraId(1), TrackId(2), 1.0, 5.0, &config, 101.0)
            .unwrap()
            .expect("event");
        assert_eq!(event.event, EventKind::Exit);
    }

    #[test]
    fn test_entrance_side_on_line_falls_back_to_geometric() {
        let processor = processor_with_sink(Arc::new(MemorySink::default()));
        let mut config = vertical_line_config();
        config.entrance_side = Some(Point::new(0.0, 5.0));

        processor.process(CameraId(1), TrackId(3), -1.0, 5.0, &config, 100.0).unwrap();
        let event = processor
            .process(CameraId(1), TrackId(3), 1.0, 5.0, &config, 101.0)
            .unwrap()
            .expect("event");
        // Left-to-right geometric In maps to enter
        assert_eq!(event.event, EventKind::Enter);
    }

    #[test]
    fn test_persist_failure_propagates_without_rollback() {
        let processor = processor_with_sink(Arc::new(FailingSink));
        let config = vertical_line_config();

        processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 100.0).unwrap();
        let result = processor.process(CameraId(1), TrackId(7), 1.0, 5.0, &config, 101.0);
        assert!(result.is_err());

        // The crossing was still recorded by the debouncer: replaying the
        // same detection does not produce a second acceptance
        processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 101.5).unwrap();
        let replay = processor.process(CameraId(1), TrackId(7), 1.0, 5.0, &config, 102.0).unwrap();
        assert!(replay.is_none());
    }

    #[test]
    fn test_end_track_clears_state() {
        let processor = processor_with_sink(Arc::new(MemorySink::default()));
        let config = vertical_line_config();

        processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 100.0).unwrap();
        processor.process(CameraId(1), TrackId(7), 1.0, 5.0, &config, 101.0).unwrap();
        processor.end_track(TrackId(7));

        assert_eq!(processor.tracked_count(), 0);
        // Reused identity behaves like a fresh track
        let result = processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 102.0).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_degenerate_line_never_emits() {
        let processor = processor_with_sink(Arc::new(MemorySink::default()));
        let config = LineConfig {
            line: Line::new(3.0, 3.0, 3.0, 3.0),
            direction: DirectionFilter::Both,
            entrance_side: None,
        };

        processor.process(CameraId(1), TrackId(7), -1.0, 5.0, &config, 100.0).unwrap();
        let result = processor.process(CameraId(1), TrackId(7), 1.0, 5.0, &config, 101.0).unwrap();
        assert!(result.is_none());
    }
}
