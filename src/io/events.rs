//! Crossing event persistence
//!
//! Accepted events are appended in JSONL format (one JSON object per
//! line) to the file specified in config. The sink must not silently
//! drop events: any write failure propagates to the caller.

use crate::domain::types::CrossingEvent;
use anyhow::Context;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Persistence collaborator for accepted crossing events
pub trait EventSink: Send + Sync {
    /// Append one event to durable storage. Errors must surface.
    fn append(&self, event: &CrossingEvent) -> anyhow::Result<()>;
}

/// Appends events to a JSONL file
pub struct JsonlEventSink {
    file_path: String,
}

impl JsonlEventSink {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "event_sink_initialized");
        Self { file_path: file_path.to_string() }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "event_written");

        Ok(())
    }
}

impl EventSink for JsonlEventSink {
    fn append(&self, event: &CrossingEvent) -> anyhow::Result<()> {
        let json = serde_json::to_string(event).context("serialize crossing event")?;
        self.append_line(&json)
            .with_context(|| format!("append crossing event to {}", self.file_path))?;
        Ok(())
    }
}
