//! Integration tests for configuration loading

use entryline::domain::types::{CameraId, DirectionFilter, Point};
use entryline::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[detector]
base_url = "http://detector.local:8001"
timeout_ms = 2500
poll_interval_ms = 500

[egress]
file = "out/events.jsonl"

[tracking]
stale_after_secs = 120
sweep_interval_secs = 30

[metrics]
interval_secs = 15

[[camera]]
id = 1
line = { x1 = 0.0, y1 = 0.0, x2 = 0.0, y2 = 10.0 }

[[camera]]
id = 2
enabled = false
direction = "out"
line = { x1 = 3.0, y1 = 1.0, x2 = 9.0, y2 = 1.0 }
entrance_side = { x = 6.0, y = -4.0 }
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.detector_base_url(), "http://detector.local:8001");
    assert_eq!(config.detector_timeout_ms(), 2500);
    assert_eq!(config.poll_interval_ms(), 500);
    assert_eq!(config.egress_file(), "out/events.jsonl");
    assert_eq!(config.stale_after_secs(), 120);
    assert_eq!(config.sweep_interval_secs(), 30);
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.camera_ids(), vec![CameraId(1), CameraId(2)]);

    let cam1 = config.camera(CameraId(1)).unwrap();
    assert!(cam1.enabled);
    assert_eq!(cam1.line.direction, DirectionFilter::Both);
    assert_eq!(cam1.line.entrance_side, None);

    let cam2 = config.camera(CameraId(2)).unwrap();
    assert!(!cam2.enabled);
    assert_eq!(cam2.line.direction, DirectionFilter::Out);
    assert_eq!(cam2.line.entrance_side, Some(Point::new(6.0, -4.0)));
}

#[test]
fn test_degenerate_line_is_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let config_content = r#"
[[camera]]
id = 1
line = { x1 = 5.0, y1 = 5.0, x2 = 5.0, y2 = 5.0 }
"#;
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("degenerate"));
}

#[test]
fn test_duplicate_camera_is_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let config_content = r#"
[[camera]]
id = 7
line = { x1 = 0.0, y1 = 0.0, x2 = 0.0, y2 = 10.0 }

[[camera]]
id = 7
line = { x1 = 1.0, y1 = 0.0, x2 = 1.0, y2 = 10.0 }
"#;
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.detector_base_url(), "http://ai_inference:8001");
    assert_eq!(config.poll_interval_ms(), 1000);
    assert!(config.camera_ids().is_empty());
}
