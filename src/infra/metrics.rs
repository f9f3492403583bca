//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counters are monotonic and use Relaxed ordering intentionally;
//! they are statistical only and must never drive logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

pub struct Metrics {
    /// Successful detection polls across all cameras (monotonic)
    polls_total: AtomicU64,
    /// Failed detection polls (monotonic)
    poll_errors_total: AtomicU64,
    /// Well-formed detections fed to the processor (monotonic)
    detections_total: AtomicU64,
    /// Geometric crossings detected, before filtering (monotonic)
    crossings_detected_total: AtomicU64,
    /// Events accepted and persisted (monotonic)
    events_accepted_total: AtomicU64,
    /// Crossings rejected by the debouncer (monotonic)
    debounce_rejected_total: AtomicU64,
    /// Crossings rejected by the direction filter (monotonic)
    filter_rejected_total: AtomicU64,
    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            polls_total: AtomicU64::new(0),
            poll_errors_total: AtomicU64::new(0),
            detections_total: AtomicU64::new(0),
            crossings_detected_total: AtomicU64::new(0),
            events_accepted_total: AtomicU64::new(0),
            debounce_rejected_total: AtomicU64::new(0),
            filter_rejected_total: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    #[inline]
    pub fn record_poll(&self) {
        self.polls_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_poll_error(&self) {
        self.poll_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_detection(&self) {
        self.detections_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_crossing_detected(&self) {
        self.crossings_detected_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_event_accepted(&self) {
        self.events_accepted_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_debounce_rejected(&self) {
        self.debounce_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_filter_rejected(&self) {
        self.filter_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough snapshot for reporting
    pub fn report(&self) -> MetricsSummary {
        MetricsSummary {
            uptime_secs: self.started_at.elapsed().as_secs(),
            polls_total: self.polls_total.load(Ordering::Relaxed),
            poll_errors_total: self.poll_errors_total.load(Ordering::Relaxed),
            detections_total: self.detections_total.load(Ordering::Relaxed),
            crossings_detected_total: self.crossings_detected_total.load(Ordering::Relaxed),
            events_accepted_total: self.events_accepted_total.load(Ordering::Relaxed),
            debounce_rejected_total: self.debounce_rejected_total.load(Ordering::Relaxed),
            filter_rejected_total: self.filter_rejected_total.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub polls_total: u64,
    pub poll_errors_total: u64,
    pub detections_total: u64,
    pub crossings_detected_total: u64,
    pub events_accepted_total: u64,
    pub debounce_rejected_total: u64,
    pub filter_rejected_total: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = %self.uptime_secs,
            polls = %self.polls_total,
            poll_errors = %self.poll_errors_total,
            detections = %self.detections_total,
            crossings_detected = %self.crossings_detected_total,
            events_accepted = %self.events_accepted_total,
            debounce_rejected = %self.debounce_rejected_total,
            filter_rejected = %self.filter_rejected_total,
            "metrics_summary"
        );
    }
}
