//! Tracked print head position.
//!
//! Every field is rounded to [`PRECISION_DIGITS`](printhead_math::PRECISION_DIGITS)
//! fractional digits right after each update, the same precision used in
//! emitted text, so tracked and commanded values never drift apart.

use printhead_math::round_to_precision;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, GcodeError, Result};

/// Head coordinates and cumulative extruded filament (mm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
    /// Filament fed so far, net of retractions.
    pub e: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f64, y: f64, z: f64, e: f64) -> Self {
        Self { x, y, z, e }
    }

    fn rounded(self) -> Self {
        Self {
            x: round_to_precision(self.x),
            y: round_to_precision(self.y),
            z: round_to_precision(self.z),
            e: round_to_precision(self.e),
        }
    }
}

/// Position tracker. Unknown until initialized.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionState {
    current: Option<Position>,
}

impl PositionState {
    /// A tracker with no known position.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker at a known position. The caller guarantees `origin` is finite.
    pub(crate) fn at_origin(origin: Position) -> Self {
        Self {
            current: Some(origin.rounded()),
        }
    }

    /// Whether a position has been set.
    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    /// Set a known position.
    pub fn initialize(&mut self, origin: Position) -> Result<()> {
        ensure_finite("x", origin.x)?;
        ensure_finite("y", origin.y)?;
        ensure_finite("z", origin.z)?;
        ensure_finite("e", origin.e)?;
        self.current = Some(origin.rounded());
        Ok(())
    }

    /// Current position.
    pub fn current(&self) -> Result<Position> {
        self.current.ok_or(GcodeError::Uninitialized)
    }

    /// Shift the position by a displacement.
    pub fn apply_delta(&mut self, dx: f64, dy: f64, dz: f64, de: f64) -> Result<Position> {
        let pos = self.current()?;
        ensure_finite("dx", dx)?;
        ensure_finite("dy", dy)?;
        ensure_finite("dz", dz)?;
        ensure_finite("de", de)?;
        let next = Position::new(pos.x + dx, pos.y + dy, pos.z + dz, pos.e + de).rounded();
        self.current = Some(next);
        Ok(next)
    }

    /// Displacement from the current position to a target. Axes given as
    /// `None` keep their current value.
    pub fn delta_to(&self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Result<[f64; 3]> {
        let pos = self.current()?;
        let axis = |name: &str, target: Option<f64>, current: f64| -> Result<f64> {
            match target {
                Some(t) => Ok(round_to_precision(ensure_finite(name, t)? - current)),
                None => Ok(0.0),
            }
        };
        Ok([
            axis("x", x, pos.x)?,
            axis("y", y, pos.y)?,
            axis("z", z, pos.z)?,
        ])
    }

    /// Move to an absolute target, leaving `e` unchanged.
    pub fn apply_absolute(&mut self, x: f64, y: f64, z: f64) -> Result<Position> {
        let [dx, dy, dz] = self.delta_to(Some(x), Some(y), Some(z))?;
        self.apply_delta(dx, dy, dz, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn homed() -> PositionState {
        let mut state = PositionState::new();
        state.initialize(Position::new(0.0, 0.0, 10.0, 0.0)).unwrap();
        state
    }

    #[test]
    fn test_uninitialized() {
        let mut state = PositionState::new();
        assert!(!state.is_initialized());
        assert!(matches!(state.current(), Err(GcodeError::Uninitialized)));
        assert!(matches!(
            state.apply_delta(1.0, 0.0, 0.0, 0.0),
            Err(GcodeError::Uninitialized)
        ));
        assert!(matches!(
            state.apply_absolute(1.0, 0.0, 0.0),
            Err(GcodeError::Uninitialized)
        ));
    }

    #[test]
    fn test_apply_delta_accumulates() {
        let mut state = homed();
        for _ in 0..1000 {
            state.apply_delta(0.1, -0.3, 0.0, 0.01).unwrap();
        }
        let pos = state.current().unwrap();
        assert_abs_diff_eq!(pos.x, 100.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pos.y, -300.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pos.z, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pos.e, 10.0, epsilon = 1e-5);
    }

    #[test]
    fn test_apply_absolute_round_trip() {
        let mut state = homed();
        state.apply_delta(13.37, 4.2, 0.3, 1.0).unwrap();
        let pos = state.apply_absolute(-7.123_45, 88.0, 0.2).unwrap();
        assert_abs_diff_eq!(pos.x, -7.123_45, epsilon = 1e-5);
        assert_abs_diff_eq!(pos.y, 88.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pos.z, 0.2, epsilon = 1e-5);
        assert_eq!(pos.e, 1.0);
    }

    #[test]
    fn test_delta_to_keeps_missing_axes() {
        let mut state = homed();
        state.apply_delta(5.0, 5.0, 0.0, 0.0).unwrap();
        let delta = state.delta_to(Some(7.5), None, None).unwrap();
        assert_eq!(delta, [2.5, 0.0, 0.0]);
    }

    #[test]
    fn test_non_finite_rejected_without_change() {
        let mut state = homed();
        let before = state;
        assert!(matches!(
            state.apply_delta(f64::NAN, 0.0, 0.0, 0.0),
            Err(GcodeError::InvalidGeometry(_))
        ));
        assert!(state.apply_absolute(0.0, f64::INFINITY, 0.0).is_err());
        assert_eq!(state, before);
        assert!(PositionState::new()
            .initialize(Position::new(f64::NAN, 0.0, 0.0, 0.0))
            .is_err());
    }

    #[test]
    fn test_values_are_rounded() {
        let mut state = homed();
        let pos = state.apply_delta(0.123_456_7, 0.0, 0.0, 0.000_001).unwrap();
        assert_eq!(pos.x, 0.12346);
        assert_eq!(pos.e, 0.0);
    }
}
