//! Entryline - entrance/exit line-crossing analytics
//!
//! Polls an upstream perception service for tracked person detections
//! and converts centroid movement across configured lines into debounced
//! enter/exit events, one polling worker per camera.
//!
//! Module structure:
//! - `domain/` - Core types and crossing geometry
//! - `io/` - External interfaces (perception service, event egress)
//! - `services/` - Business logic (processor, debounce, scheduler)
//! - `infra/` - Infrastructure (config, metrics)

use clap::Parser;
use entryline::infra::{Config, Metrics};
use entryline::io::{HttpDetectionSource, JsonlEventSink};
use entryline::services::{epoch_now, CentroidProcessor, PollScheduler, TrackPositionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Entryline - entrance/exit analytics for camera lines
#[derive(Parser, Debug)]
#[command(name = "entryline", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to the CONFIG_FILE
    /// environment variable, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("entryline starting");

    let args = Args::parse();
    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path);

    info!(
        config_file = %config.config_file(),
        detector_base_url = %config.detector_base_url(),
        poll_interval_ms = %config.poll_interval_ms(),
        egress_file = %config.egress_file(),
        cameras = ?config.camera_ids(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());
    let positions = Arc::new(TrackPositionStore::new());
    let sink = Arc::new(JsonlEventSink::new(config.egress_file()));
    let processor = Arc::new(CentroidProcessor::new(positions, sink, metrics.clone()));
    let source = Arc::new(HttpDetectionSource::new(
        config.detector_base_url(),
        Duration::from_millis(config.detector_timeout_ms()),
    )?);

    let scheduler = Arc::new(PollScheduler::new(
        processor.clone(),
        source,
        Arc::new(config.clone()),
        metrics.clone(),
        Duration::from_millis(config.poll_interval_ms()),
    ));

    // One worker per configured camera; workers for disabled cameras exit
    // on their own after logging
    for camera_id in config.camera_ids() {
        scheduler.start(camera_id);
    }

    // Periodic metrics summary
    let metrics_reporter = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_reporter.report().log();
        }
    });

    // Periodic sweep of stale per-track state; tracks that never see an
    // explicit end signal would otherwise leak
    let sweeper = processor.clone();
    let stale_after = config.stale_after_secs() as f64;
    let sweep_interval = config.sweep_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval));
        loop {
            interval.tick().await;
            sweeper.sweep_stale(epoch_now(), stale_after);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown_signal_received");

    scheduler.stop_all();
    // Let workers observe the stop signal at their next loop boundary
    tokio::time::sleep(Duration::from_millis(config.poll_interval_ms())).await;

    info!("entryline shutdown complete");
    Ok(())
}
