//! Composite paths built from extrusion moves.

use std::fmt;
use std::str::FromStr;

use printhead_math::{round_to_precision, Point2, Tolerance, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::Speed;
use crate::emitter::{Generator, Move};
use crate::error::{ensure_positive, GcodeError, Result};

/// Direction of the first edge of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// +X.
    Right,
    /// +Y.
    Up,
    /// -X.
    Left,
    /// -Y.
    Down,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];
}

impl FromStr for Direction {
    type Err = GcodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "left" => Ok(Direction::Left),
            "down" => Ok(Direction::Down),
            _ => Err(GcodeError::InvalidArgument(format!("unknown direction {s:?}"))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Left => "left",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}

/// Turning sense of a closed contour, with Y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winding {
    /// Right turns.
    Clockwise,
    /// Left turns.
    CounterClockwise,
}

impl Winding {
    /// `Clockwise` when `clockwise` is true.
    pub fn from_clockwise(clockwise: bool) -> Self {
        if clockwise {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }
}

impl FromStr for Winding {
    type Err = GcodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cw" | "clockwise" => Ok(Winding::Clockwise),
            "ccw" | "counterclockwise" | "counter-clockwise" => Ok(Winding::CounterClockwise),
            _ => Err(GcodeError::InvalidArgument(format!("unknown winding {s:?}"))),
        }
    }
}

/// Edge displacements of a `width` x `height` rectangle.
///
/// The four vectors always sum to zero, so the contour closes on its
/// starting point.
pub fn rectangle_deltas(width: f64, height: f64, start: Direction, winding: Winding) -> [Vec2; 4] {
    use Direction::*;
    use Winding::*;

    let right = Vec2::new(width, 0.0);
    let left = Vec2::new(-width, 0.0);
    let up = Vec2::new(0.0, height);
    let down = Vec2::new(0.0, -height);

    match (start, winding) {
        (Right, Clockwise) => [right, down, left, up],
        (Right, CounterClockwise) => [right, up, left, down],
        (Up, Clockwise) => [up, right, down, left],
        (Up, CounterClockwise) => [up, left, down, right],
        (Left, Clockwise) => [left, up, right, down],
        (Left, CounterClockwise) => [left, down, right, up],
        (Down, Clockwise) => [down, left, up, right],
        (Down, CounterClockwise) => [down, right, up, left],
    }
}

impl Generator {
    /// Extrude a closed `width` x `height` rectangle starting at the
    /// current position.
    pub fn rectangle(
        &mut self,
        width: f64,
        height: f64,
        start: Direction,
        winding: Winding,
        speed: Option<Speed>,
    ) -> Result<&[String]> {
        ensure_positive("rectangle width", width)?;
        ensure_positive("rectangle height", height)?;
        let moves = rectangle_deltas(width, height, start, winding)
            .map(|d| Move::extrude(d.x, d.y).with_speed(speed));
        self.emit_moves(&moves)
    }

    /// Extrude through absolute XY waypoints, starting from the current
    /// position. Waypoints that round onto the previous one are skipped.
    pub fn extrude_polyline(
        &mut self,
        points: &[Point2],
        speed: Option<Speed>,
    ) -> Result<&[String]> {
        let start = self.position()?;
        let tolerance = Tolerance::default();
        let mut cursor = Point2::new(start.x, start.y);
        let mut moves = Vec::with_capacity(points.len());
        for point in points {
            let delta = Vec2::new(
                round_to_precision(point.x - cursor.x),
                round_to_precision(point.y - cursor.y),
            );
            let next = Point2::new(
                round_to_precision(cursor.x + delta.x),
                round_to_precision(cursor.y + delta.y),
            );
            if tolerance.points_equal(&cursor, &next) {
                continue;
            }
            moves.push(Move::extrude(delta.x, delta.y).with_speed(speed));
            cursor = next;
        }
        self.emit_moves(&moves)
    }
}
