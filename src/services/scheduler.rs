//! Per-camera detection polling
//!
//! One independent tokio task per camera pulls the latest person
//! detections from the perception service, computes bbox centroids, and
//! feeds them through the centroid processor in arrival order. Workers
//! never block each other; position and debounce state shared across
//! workers is synchronized inside the processor.
//!
//! Cancellation is cooperative: `stop` flips a watch channel that the
//! worker observes at its next loop boundary, so an in-flight fetch or a
//! batch already pulled finishes processing first.

use crate::domain::types::{CameraAnalytics, CameraId, TrackId};
use crate::infra::metrics::Metrics;
use crate::io::detections::DetectionSource;
use crate::services::processor::CentroidProcessor;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// Configuration collaborator: resolves a camera's analytics settings.
/// Returns None for cameras with no entrance/exit analytics configured.
pub trait CameraConfigSource: Send + Sync {
    fn analytics(&self, camera_id: CameraId) -> Option<CameraAnalytics>;
}

/// Logical worker state as last commanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Stopping,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Stopped => "stopped",
            RunState::Running => "running",
            RunState::Stopping => "stopping",
        }
    }
}

/// Worker status as reported by `status`.
///
/// `alive` is the task's actual liveness, independent of the logical
/// state, so a crashed worker shows up as running-but-dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraStatus {
    pub registered: bool,
    pub alive: bool,
    pub state: RunState,
}

struct CameraWorker {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    state: RunState,
}

/// Manages one polling worker per camera
pub struct PollScheduler {
    workers: Mutex<FxHashMap<CameraId, CameraWorker>>,
    processor: Arc<CentroidProcessor>,
    source: Arc<dyn DetectionSource>,
    configs: Arc<dyn CameraConfigSource>,
    metrics: Arc<Metrics>,
    poll_interval: Duration,
}

impl PollScheduler {
    pub fn new(
        processor: Arc<CentroidProcessor>,
        source: Arc<dyn DetectionSource>,
        configs: Arc<dyn CameraConfigSource>,
        metrics: Arc<Metrics>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            workers: Mutex::new(FxHashMap::default()),
            processor,
            source,
            configs,
            metrics,
            poll_interval,
        }
    }

    /// Start a polling worker for a camera. No-op if one is already live.
    pub fn start(&self, camera_id: CameraId) {
        let mut workers = self.workers.lock();

        if let Some(worker) = workers.get(&camera_id) {
            if !worker.handle.is_finished() && worker.state == RunState::Running {
                debug!(camera_id = %camera_id, "camera_poll_already_running");
                return;
            }
            // A finished or stopping worker is replaced; the old task is
            // already draining toward its stop signal
            workers.remove(&camera_id);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(
            camera_id,
            self.processor.clone(),
            self.source.clone(),
            self.configs.clone(),
            self.metrics.clone(),
            self.poll_interval,
            stop_rx,
        ));

        workers.insert(camera_id, CameraWorker { stop_tx, handle, state: RunState::Running });
        info!(camera_id = %camera_id, "camera_poll_start_requested");
    }

    /// Signal a camera's worker to stop at its next loop boundary.
    /// No-op if no worker is registered.
    pub fn stop(&self, camera_id: CameraId) {
        let mut workers = self.workers.lock();
        match workers.get_mut(&camera_id) {
            Some(worker) => {
                let _ = worker.stop_tx.send(true);
                worker.state = RunState::Stopping;
                info!(camera_id = %camera_id, "camera_poll_stop_requested");
            }
            None => {
                debug!(camera_id = %camera_id, "camera_poll_stop_noop");
            }
        }
    }

    /// Report registration, task liveness, and the logical state
    pub fn status(&self, camera_id: CameraId) -> CameraStatus {
        let mut workers = self.workers.lock();
        match workers.get_mut(&camera_id) {
            Some(worker) => {
                let alive = !worker.handle.is_finished();
                if !alive && worker.state == RunState::Stopping {
                    worker.state = RunState::Stopped;
                }
                CameraStatus { registered: true, alive, state: worker.state }
            }
            None => CameraStatus { registered: false, alive: false, state: RunState::Stopped },
        }
    }

    /// Signal every registered worker to stop
    pub fn stop_all(&self) {
        let mut workers = self.workers.lock();
        for (camera_id, worker) in workers.iter_mut() {
            let _ = worker.stop_tx.send(true);
            worker.state = RunState::Stopping;
            debug!(camera_id = %camera_id, "camera_poll_stop_requested");
        }
    }

    /// Cameras with a registered worker
    pub fn registered_cameras(&self) -> Vec<CameraId> {
        self.workers.lock().keys().copied().collect()
    }
}

/// Current wall time in epoch seconds
pub fn epoch_now() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

async fn poll_loop(
    camera_id: CameraId,
    processor: Arc<CentroidProcessor>,
    source: Arc<dyn DetectionSource>,
    configs: Arc<dyn CameraConfigSource>,
    metrics: Arc<Metrics>,
    poll_interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!(camera_id = %camera_id, poll_interval_ms = %poll_interval.as_millis(), "camera_poll_started");

    let mut poll_timer = interval(poll_interval);

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                // A closed channel means the scheduler is gone; treat it
                // as a stop so an orphaned worker cannot spin
                if changed.is_err() || *stop_rx.borrow() {
                    info!(camera_id = %camera_id, "camera_poll_stopped");
                    return;
                }
            }
            _ = poll_timer.tick() => {}
        }

        // Re-resolve the camera's settings each poll: a dynamic config
        // source can change the line or filter between polls. A camera
        // that loses its config or is disabled stops its worker; it needs
        // an explicit start once re-enabled.
        let Some(analytics) = configs.analytics(camera_id) else {
            warn!(camera_id = %camera_id, "camera_not_configured");
            return;
        };
        if !analytics.enabled {
            info!(camera_id = %camera_id, "camera_analytics_disabled");
            return;
        }

        match source.fetch_latest(camera_id).await {
            Ok(detections) => {
                metrics.record_poll();
                if !detections.is_empty() {
                    debug!(camera_id = %camera_id, count = %detections.len(), "detections_received");
                }

                for detection in detections {
                    // Malformed detections never reach the processor
                    let Some(track_id) = detection.track_id else {
                        continue;
                    };
                    let Some(centroid) = detection.centroid() else {
                        continue;
                    };
                    let at = detection.timestamp.unwrap_or_else(epoch_now);
                    metrics.record_detection();

                    match processor.process(
                        camera_id,
                        TrackId(track_id),
                        centroid.x,
                        centroid.y,
                        &analytics.line,
                        at,
                    ) {
                        Ok(_) => {}
                        Err(e) => {
                            error!(
                                camera_id = %camera_id,
                                track_id = %track_id,
                                error = %e,
                                "event_persist_failed"
                            );
                        }
                    }
                }
            }
            Err(e) => {
                // Transient upstream errors never terminate the loop
                metrics.record_poll_error();
                warn!(camera_id = %camera_id, error = %e, "detection_fetch_failed");
            }
        }
    }
}
