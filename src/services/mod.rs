//! Services - business logic and state management
//!
//! This module contains the core crossing-detection services:
//! - `debounce` - per-track suppression of spurious re-triggers
//! - `position_store` - shared last-known-position map
//! - `processor` - centroid processing and event emission
//! - `scheduler` - per-camera detection polling workers

pub mod debounce;
pub mod position_store;
pub mod processor;
pub mod scheduler;

// Re-export commonly used types
pub use debounce::CrossingDebouncer;
pub use position_store::TrackPositionStore;
pub use processor::CentroidProcessor;
pub use scheduler::{epoch_now, CameraConfigSource, CameraStatus, PollScheduler, RunState};
