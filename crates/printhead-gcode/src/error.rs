//! Error types for G-code generation.

use thiserror::Error;

/// Errors that can occur while emitting G-code.
///
/// A failed operation leaves the command buffer and tracked position
/// exactly as they were before the call.
#[derive(Error, Debug)]
pub enum GcodeError {
    /// Positional command issued before the head position is known.
    #[error("head position is unknown; home or initialize first")]
    Uninitialized,

    /// Non-finite coordinate, or a non-positive length or speed.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Unrecognized enum value, such as a bad start direction.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Printer configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for G-code operations.
pub type Result<T> = std::result::Result<T, GcodeError>;

/// Reject NaN and infinities.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GcodeError::InvalidGeometry(format!("{name} must be finite, got {value}")))
    }
}

/// Reject non-finite and non-positive values.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<f64> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(GcodeError::InvalidGeometry(format!("{name} must be positive, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite("x", -3.0).unwrap(), -3.0);
        assert!(matches!(ensure_finite("x", f64::NAN), Err(GcodeError::InvalidGeometry(_))));
        assert!(matches!(
            ensure_finite("x", f64::NEG_INFINITY),
            Err(GcodeError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive("len", 0.4).unwrap(), 0.4);
        assert!(ensure_positive("len", 0.0).is_err());
        assert!(ensure_positive("len", -1.0).is_err());
        assert!(ensure_positive("len", f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = ensure_positive("layer_height", 0.0).unwrap_err();
        assert_eq!(err.to_string(), "invalid geometry: layer_height must be positive, got 0");
        assert_eq!(
            GcodeError::Uninitialized.to_string(),
            "head position is unknown; home or initialize first"
        );
    }
}
