#![warn(missing_docs)]

//! Extrusion geometry for the printhead G-code generator.
//!
//! Pure functions that turn planar moves into filament lengths, plus the
//! fixed-precision rounding and number formatting shared by the command
//! emitter and the position tracker. Points and vectors are thin aliases
//! over nalgebra.

use std::f64::consts::PI;

use nalgebra::Vector2;

/// A point in the XY plane.
pub type Point2 = nalgebra::Point2<f64>;

/// A displacement in the XY plane.
pub type Vec2 = Vector2<f64>;

/// Number of fractional digits kept in tracked state and emitted text.
pub const PRECISION_DIGITS: i32 = 5;

const PRECISION_SCALE: f64 = 100_000.0;

/// Euclidean distance between `(x1, y1)` and `(x2, y2)`.
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    nalgebra::distance(&Point2::new(x1, y1), &Point2::new(x2, y2))
}

/// Cross-section area of a deposited bead (mm²).
///
/// The bead is modelled as a rectangle of width `extrusion_width - layer_height`
/// and height `layer_height`, capped on both sides by half circles of
/// diameter `layer_height`.
pub fn extrusion_cross_section(extrusion_width: f64, layer_height: f64) -> f64 {
    (extrusion_width - layer_height) * layer_height + PI * (layer_height / 2.0).powi(2)
}

/// Length of filament that must be fed to lay a bead of `distance` mm.
///
/// Equates the bead volume with the volume of a filament cylinder. When
/// `extrusion_width < layer_height` the rectangular term goes negative and
/// the result may be negative; it is returned unclamped.
pub fn filament_length(
    distance: f64,
    extrusion_width: f64,
    layer_height: f64,
    filament_diameter: f64,
) -> f64 {
    let area = extrusion_cross_section(extrusion_width, layer_height);
    (area * distance * 4.0) / (PI * filament_diameter.powi(2))
}

/// Round to [`PRECISION_DIGITS`] fractional digits. Negative zero becomes zero.
pub fn round_to_precision(value: f64) -> f64 {
    let rounded = (value * PRECISION_SCALE).round() / PRECISION_SCALE;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format a value for a G-code parameter.
///
/// Rounds first, then prints the shortest decimal form: `20`, `0.32774`,
/// `-2.5`. Never uses exponent notation or a leading `+`.
pub fn format_decimal(value: f64) -> String {
    format!("{}", round_to_precision(value))
}

/// Tolerance constants for coordinate comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
}

impl Tolerance {
    /// Half a unit in the last tracked digit.
    pub const DEFAULT: Self = Self { linear: 5e-6 };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point2, b: &Point2) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
