//! Perception service client
//!
//! Pulls the latest tracked person detections for a camera over HTTP.
//! The client is built once with a bounded timeout and reused across
//! polls (connection pooling).

use crate::domain::types::{CameraId, Detection, DetectionBatch};
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;

/// Pull interface to the upstream perception service
#[async_trait]
pub trait DetectionSource: Send + Sync {
    /// Fetch the latest batch of person detections for a camera
    async fn fetch_latest(&self, camera_id: CameraId) -> anyhow::Result<Vec<Detection>>;
}

/// HTTP adapter for the perception service's shared-detections endpoint
pub struct HttpDetectionSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDetectionSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build detection HTTP client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn latest_url(&self, camera_id: CameraId) -> String {
        format!("{}/shared/cameras/{}/detections/latest", self.base_url, camera_id)
    }
}

#[async_trait]
impl DetectionSource for HttpDetectionSource {
    async fn fetch_latest(&self, camera_id: CameraId) -> anyhow::Result<Vec<Detection>> {
        let url = self.latest_url(camera_id);
        let response = self
            .client
            .get(&url)
            .query(&[("object_filter", "person")])
            .send()
            .await
            .with_context(|| format!("fetch detections for camera {camera_id}"))?
            .error_for_status()
            .with_context(|| format!("detection request rejected for camera {camera_id}"))?;

        let batch: DetectionBatch = response
            .json()
            .await
            .with_context(|| format!("decode detection batch for camera {camera_id}"))?;

        Ok(batch.detections)
    }
}
