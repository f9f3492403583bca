//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `detections` - HTTP pull client for the perception service
//! - `events` - crossing event persistence (JSONL format)

pub mod detections;
pub mod events;

// Re-export commonly used types
pub use detections::{DetectionSource, HttpDetectionSource};
pub use events::{EventSink, JsonlEventSink};
