//! Printer configuration and built-in profiles.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Result};

/// Extrusion width as a multiple of layer height when not set explicitly.
pub const DEFAULT_WIDTH_FACTOR: f64 = 1.2;

/// A head speed in mm/s.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Speed(f64);

impl Speed {
    /// Speed in mm/s.
    pub const fn mm_per_s(value: f64) -> Self {
        Self(value)
    }

    /// Value in mm/s.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Feed rate for the `F` word, in mm/min.
    pub fn feed_rate(self) -> f64 {
        self.0 * 60.0
    }

    pub(crate) fn validated(self, name: &str) -> Result<Self> {
        ensure_positive(name, self.value()).map(Self)
    }
}

/// Machine and material settings, fixed for a generator's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Profile name.
    pub name: String,
    /// Nozzle diameter (mm).
    pub nozzle_diameter: f64,
    /// Layer height (mm).
    pub layer_height: f64,
    /// Filament diameter (mm).
    pub filament_diameter: f64,
    /// Bead width (mm). Defaults to `layer_height * 1.2`.
    pub extrusion_width: Option<f64>,
    /// Non-extruding XY travel speed.
    pub travel_speed: Speed,
    /// Extruding move speed.
    pub print_speed: Speed,
    /// Z move speed.
    pub z_lift_speed: Speed,
    /// Retract / unretract speed.
    pub retract_speed: Speed,
    /// Default retraction distance (mm).
    pub retract_length: f64,
    /// Z height the head is lifted to after homing (mm).
    pub safe_z: f64,
    /// Emit zero instead of a negative filament length when the bead
    /// width is narrower than the layer height.
    pub clamp_negative_extrusion: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::generic()
    }
}

impl PrinterConfig {
    /// Config with the default speeds and retraction.
    pub fn new(nozzle_diameter: f64, layer_height: f64, filament_diameter: f64) -> Self {
        Self {
            name: "Custom".into(),
            nozzle_diameter,
            layer_height,
            filament_diameter,
            extrusion_width: None,
            travel_speed: Speed::mm_per_s(100.0),
            print_speed: Speed::mm_per_s(60.0),
            z_lift_speed: Speed::mm_per_s(20.0),
            retract_speed: Speed::mm_per_s(60.0),
            retract_length: 2.5,
            safe_z: 10.0,
            clamp_negative_extrusion: false,
        }
    }

    /// Generic 0.4 mm nozzle, 1.75 mm filament profile.
    pub fn generic() -> Self {
        Self {
            name: "Generic".into(),
            ..Self::new(0.4, 0.2, 1.75)
        }
    }

    /// Creality Ender 3 profile.
    pub fn ender3() -> Self {
        Self {
            name: "Creality Ender 3".into(),
            travel_speed: Speed::mm_per_s(150.0),
            print_speed: Speed::mm_per_s(50.0),
            z_lift_speed: Speed::mm_per_s(5.0),
            retract_speed: Speed::mm_per_s(45.0),
            retract_length: 5.0,
            ..Self::new(0.4, 0.2, 1.75)
        }
    }

    /// Prusa MK4 profile.
    pub fn prusa_mk4() -> Self {
        Self {
            name: "Prusa MK4".into(),
            travel_speed: Speed::mm_per_s(200.0),
            print_speed: Speed::mm_per_s(80.0),
            z_lift_speed: Speed::mm_per_s(12.0),
            retract_speed: Speed::mm_per_s(35.0),
            retract_length: 0.8,
            ..Self::new(0.4, 0.2, 1.75)
        }
    }

    /// Voron 2.4 profile.
    pub fn voron_24() -> Self {
        Self {
            name: "Voron 2.4 (350mm)".into(),
            travel_speed: Speed::mm_per_s(300.0),
            print_speed: Speed::mm_per_s(120.0),
            z_lift_speed: Speed::mm_per_s(15.0),
            retract_speed: Speed::mm_per_s(30.0),
            retract_length: 0.5,
            ..Self::new(0.4, 0.2, 1.75)
        }
    }

    /// Get all built-in profiles.
    pub fn all_profiles() -> Vec<Self> {
        vec![
            Self::generic(),
            Self::ender3(),
            Self::prusa_mk4(),
            Self::voron_24(),
        ]
    }

    /// Parse a config from TOML. Missing keys fall back to [`PrinterConfig::generic`].
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Bead width used when a move gives no override.
    pub fn extrusion_width(&self) -> f64 {
        self.extrusion_width
            .unwrap_or(self.layer_height * DEFAULT_WIDTH_FACTOR)
    }

    /// Check that every length and speed is finite and positive.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("nozzle_diameter", self.nozzle_diameter)?;
        ensure_positive("layer_height", self.layer_height)?;
        ensure_positive("filament_diameter", self.filament_diameter)?;
        if let Some(width) = self.extrusion_width {
            ensure_positive("extrusion_width", width)?;
        }
        ensure_positive("retract_length", self.retract_length)?;
        ensure_positive("safe_z", self.safe_z)?;
        self.travel_speed.validated("travel_speed")?;
        self.print_speed.validated("print_speed")?;
        self.z_lift_speed.validated("z_lift_speed")?;
        self.retract_speed.validated("retract_speed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GcodeError;
    use approx::assert_relative_eq;

    #[test]
    fn test_profiles() {
        for profile in PrinterConfig::all_profiles() {
            assert!(profile.validate().is_ok(), "{} failed validation", profile.name);
            assert!(profile.nozzle_diameter > 0.0);
        }
    }

    #[test]
    fn test_constructor_defaults() {
        let config = PrinterConfig::new(0.4, 0.2, 1.75);
        assert_relative_eq!(config.extrusion_width(), 0.24, epsilon = 1e-12);
        assert_eq!(config.print_speed.feed_rate(), 3600.0);
        assert_eq!(config.travel_speed.feed_rate(), 6000.0);
        assert_eq!(config.retract_length, 2.5);
        assert_eq!(config.safe_z, 10.0);
        assert!(!config.clamp_negative_extrusion);
    }

    #[test]
    fn test_width_override() {
        let config = PrinterConfig {
            extrusion_width: Some(0.45),
            ..PrinterConfig::generic()
        };
        assert_eq!(config.extrusion_width(), 0.45);
    }

    #[test]
    fn test_invalid_config() {
        let config = PrinterConfig::new(0.4, 0.2, 0.0);
        assert!(matches!(config.validate(), Err(GcodeError::InvalidGeometry(_))));

        let config = PrinterConfig {
            print_speed: Speed::mm_per_s(f64::NAN),
            ..PrinterConfig::generic()
        };
        assert!(config.validate().is_err());

        let config = PrinterConfig {
            extrusion_width: Some(-0.1),
            ..PrinterConfig::generic()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = PrinterConfig::from_toml_str(
            r#"
            name = "Bench"
            layer_height = 0.3
            filament_diameter = 2.85
            print_speed = 40.0
            clamp_negative_extrusion = true
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "Bench");
        assert_eq!(config.layer_height, 0.3);
        assert_eq!(config.filament_diameter, 2.85);
        assert_eq!(config.print_speed, Speed::mm_per_s(40.0));
        assert_eq!(config.travel_speed, Speed::mm_per_s(100.0));
        assert!(config.clamp_negative_extrusion);
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(matches!(
            PrinterConfig::from_toml_str("layer_height = -0.2"),
            Err(GcodeError::InvalidGeometry(_))
        ));
        assert!(matches!(
            PrinterConfig::from_toml_str("layer_height = \"thin\""),
            Err(GcodeError::Config(_))
        ));
    }
}
