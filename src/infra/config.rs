//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::{CameraAnalytics, CameraId, DirectionFilter, Line, LineConfig, Point};
use crate::services::scheduler::CameraConfigSource;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Base URL of the perception service
    #[serde(default = "default_detector_base_url")]
    pub base_url: String,
    /// Per-request timeout for detection fetches
    #[serde(default = "default_detector_timeout_ms")]
    pub timeout_ms: u64,
    /// Interval between polls of one camera
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_detector_base_url(),
            timeout_ms: default_detector_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_detector_base_url() -> String {
    "http://ai_inference:8001".to_string()
}

fn default_detector_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for crossing event egress (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "events.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Track state not updated within this window is evicted
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Interval between eviction sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_stale_after_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

/// One `[[camera]]` entry in the TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct CameraEntry {
    pub id: i32,
    #[serde(default = "default_camera_enabled")]
    pub enabled: bool,
    pub line: Line,
    #[serde(default)]
    pub direction: DirectionFilter,
    #[serde(default)]
    pub entrance_side: Option<Point>,
}

fn default_camera_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default, rename = "camera")]
    pub cameras: Vec<CameraEntry>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    detector_base_url: String,
    detector_timeout_ms: u64,
    poll_interval_ms: u64,
    egress_file: String,
    stale_after_secs: u64,
    sweep_interval_secs: u64,
    metrics_interval_secs: u64,
    cameras: HashMap<CameraId, CameraAnalytics>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector_base_url: default_detector_base_url(),
            detector_timeout_ms: default_detector_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            egress_file: default_egress_file(),
            stale_after_secs: default_stale_after_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            metrics_interval_secs: default_metrics_interval_secs(),
            cameras: HashMap::new(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine the config file path: explicit CLI value first, then the
    /// CONFIG_FILE environment variable, then the default
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let mut cameras = HashMap::new();
        for entry in toml_config.cameras {
            let camera_id = CameraId(entry.id);
            if entry.line.is_degenerate() {
                bail!("camera {} has a degenerate line (zero direction vector)", entry.id);
            }
            if cameras.contains_key(&camera_id) {
                bail!("camera {} is configured more than once", entry.id);
            }
            cameras.insert(
                camera_id,
                CameraAnalytics {
                    enabled: entry.enabled,
                    line: LineConfig {
                        line: entry.line,
                        direction: entry.direction,
                        entrance_side: entry.entrance_side,
                    },
                },
            );
        }

        Ok(Self {
            detector_base_url: toml_config.detector.base_url,
            detector_timeout_ms: toml_config.detector.timeout_ms,
            poll_interval_ms: toml_config.detector.poll_interval_ms,
            egress_file: toml_config.egress.file,
            stale_after_secs: toml_config.tracking.stale_after_secs,
            sweep_interval_secs: toml_config.tracking.sweep_interval_secs,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            cameras,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn detector_base_url(&self) -> &str {
        &self.detector_base_url
    }

    pub fn detector_timeout_ms(&self) -> u64 {
        self.detector_timeout_ms
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn stale_after_secs(&self) -> u64 {
        self.stale_after_secs
    }

    pub fn sweep_interval_secs(&self) -> u64 {
        self.sweep_interval_secs
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// All configured cameras, in stable order
    pub fn camera_ids(&self) -> Vec<CameraId> {
        let mut ids: Vec<CameraId> = self.cameras.keys().copied().collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    pub fn camera(&self, camera_id: CameraId) -> Option<&CameraAnalytics> {
        self.cameras.get(&camera_id)
    }
}

impl CameraConfigSource for Config {
    fn analytics(&self, camera_id: CameraId) -> Option<CameraAnalytics> {
        self.cameras.get(&camera_id).cloned()
    }
}
