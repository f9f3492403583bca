//! Line-crossing geometry
//!
//! Pure functions over points and directed line segments. Side
//! classification uses the 2D cross product of the line's direction
//! vector with the vector from the line start to the point:
//! positive is left, negative is right, exactly zero is on the line.

use crate::domain::types::{Direction, Line, Point, Side};

/// Cross product of the line direction with (line start -> point)
#[inline]
fn cross(point: Point, line: &Line) -> f64 {
    let line_dx = line.x2 - line.x1;
    let line_dy = line.y2 - line.y1;
    line_dx * (point.y - line.y1) - line_dy * (point.x - line.x1)
}

/// Classify which side of a directed line a point is on.
///
/// Swapping the line's endpoints flips Left and Right. A degenerate line
/// classifies every point as OnLine.
pub fn side_of_line(point: Point, line: &Line) -> Side {
    let c = cross(point, line);
    if c > 0.0 {
        Side::Left
    } else if c < 0.0 {
        Side::Right
    } else {
        Side::OnLine
    }
}

/// Detect whether a track crossed the line between two consecutive
/// positions, and in which geometric direction.
///
/// Returns None when both points are on the same side, or when either
/// point lies exactly on the line (a touch is conservatively not a
/// crossing). Left-to-right is `In`, right-to-left is `Out`.
pub fn detect_crossing(prev: Point, curr: Point, line: &Line) -> Option<Direction> {
    let prev_cross = cross(prev, line);
    let curr_cross = cross(curr, line);

    // Same side, or at least one point exactly on the line
    if prev_cross * curr_cross >= 0.0 {
        return None;
    }

    if prev_cross > 0.0 && curr_cross < 0.0 {
        Some(Direction::In)
    } else {
        Some(Direction::Out)
    }
}
