//! Domain models - core types and line-crossing geometry
//!
//! This module contains the canonical data types used throughout the system:
//! - `Point` / `Line` - planar geometry for monitored lines
//! - `Direction` - geometric crossing direction relative to line orientation
//! - `EventKind` - semantic enter/exit labels
//! - `CrossingEvent` - the emitted, persisted event record
//! - `Detection` - wire shape of upstream perception detections

pub mod geometry;
pub mod types;
