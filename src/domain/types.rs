//! Shared types for the entrance/exit analytics engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newtype wrapper for track IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TrackId(pub i64);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for camera IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct CameraId(pub i32);

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A directed line segment from (x1, y1) to (x2, y2).
///
/// The direction vector orients side classification: swapping the
/// endpoints flips the meaning of left and right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Line {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// A degenerate line has a zero direction vector and never crosses
    pub fn is_degenerate(&self) -> bool {
        self.x1 == self.x2 && self.y1 == self.y2
    }
}

/// Side of a directed line, from the cross-product sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    OnLine,
}

/// Geometric crossing direction relative to line orientation.
///
/// `In` is a crossing from the left side to the right side, `Out` the
/// reverse. These labels carry no enter/exit semantics; that mapping is
/// resolved by the centroid processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Semantic event label emitted to downstream consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Enter,
    Exit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Enter => "enter",
            EventKind::Exit => "exit",
        }
    }
}

impl From<Direction> for EventKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => EventKind::Enter,
            Direction::Out => EventKind::Exit,
        }
    }
}

/// Which crossing directions produce events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionFilter {
    In,
    Out,
    #[default]
    Both,
}

impl DirectionFilter {
    pub fn allows(&self, kind: EventKind) -> bool {
        match self {
            DirectionFilter::In => kind == EventKind::Enter,
            DirectionFilter::Out => kind == EventKind::Exit,
            DirectionFilter::Both => true,
        }
    }
}

/// Active line configuration for one camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    pub line: Line,
    #[serde(default)]
    pub direction: DirectionFilter,
    /// Optional reference point marking the side a person approaches from
    /// when entering. When set, enter/exit labels are resolved against it
    /// instead of the raw line orientation.
    #[serde(default)]
    pub entrance_side: Option<Point>,
}

/// Per-camera analytics settings as resolved from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CameraAnalytics {
    pub enabled: bool,
    pub line: LineConfig,
}

/// Last-known position of a track, in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPosition {
    pub x: f64,
    pub y: f64,
    pub at: f64,
}

/// An accepted line-crossing event.
///
/// Field names are a contract with the persistence and API layers and
/// must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub camera_id: CameraId,
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    pub track_id: TrackId,
}

impl CrossingEvent {
    /// Build an event from an epoch-seconds timestamp
    pub fn new(camera_id: CameraId, event: EventKind, track_id: TrackId, at: f64) -> Self {
        let timestamp =
            DateTime::<Utc>::from_timestamp_millis((at * 1000.0) as i64).unwrap_or_default();
        Self { camera_id, event, timestamp, track_id }
    }
}

/// One detection as returned by the perception service.
///
/// Fields are lenient on purpose: upstream occasionally emits detections
/// without a track assignment or with a truncated bbox, and those are
/// filtered out before processing.
#[derive(Debug, Clone, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub track_id: Option<i64>,
    #[serde(default)]
    pub bbox: Vec<f64>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl Detection {
    /// Midpoint of the bounding box, or None if the bbox is malformed
    pub fn centroid(&self) -> Option<Point> {
        match self.bbox.as_slice() {
            [x1, y1, x2, y2] => Some(Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0)),
            _ => None,
        }
    }
}

/// Response envelope from the perception service's latest-detections endpoint
#[derive(Debug, Default, Deserialize)]
pub struct DetectionBatch {
    #[serde(default)]
    pub detections: Vec<Detection>,
}
