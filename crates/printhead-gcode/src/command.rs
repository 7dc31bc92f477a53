//! Individual G-code commands and their text form.

use std::fmt;

use printhead_math::format_decimal;

/// Coordinate interpretation for motion commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositioningMode {
    /// G90: parameters are targets.
    Absolute,
    /// G91: parameters are displacements, E included.
    Relative,
}

/// A single line of machine input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// G1 linear move. Absent axes are omitted from the line.
    LinearMove {
        /// X word.
        x: Option<f64>,
        /// Y word.
        y: Option<f64>,
        /// Z word.
        z: Option<f64>,
        /// E word.
        e: Option<f64>,
        /// Feed rate (mm/min).
        feed_rate: f64,
    },
    /// G1 with only a feed rate.
    SetFeedRate(f64),
    /// G28 - home all axes.
    Home,
    /// G90 / G91.
    SetPositioning(PositioningMode),
    /// G92 - declare the current position.
    SetPosition {
        /// X word.
        x: Option<f64>,
        /// Y word.
        y: Option<f64>,
        /// Z word.
        z: Option<f64>,
        /// E word.
        e: Option<f64>,
    },
    /// M140 (no wait) / M190 (wait).
    SetBedTemp {
        /// Target temperature (°C).
        temp: u32,
        /// Block until reached.
        wait: bool,
    },
    /// M104 (no wait) / M109 (wait).
    SetToolTemp {
        /// Target temperature (°C).
        temp: u32,
        /// Block until reached.
        wait: bool,
    },
    /// M106 S0.
    FanOff,
    /// M84 - release steppers.
    DisableMotors,
}

fn write_axis(f: &mut fmt::Formatter<'_>, letter: char, value: Option<f64>) -> fmt::Result {
    match value {
        Some(v) => write!(f, " {letter}{}", format_decimal(v)),
        None => Ok(()),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::LinearMove { x, y, z, e, feed_rate } => {
                f.write_str("G1")?;
                write_axis(f, 'X', *x)?;
                write_axis(f, 'Y', *y)?;
                write_axis(f, 'Z', *z)?;
                write_axis(f, 'E', *e)?;
                write!(f, " F{}", format_decimal(*feed_rate))
            }
            Command::SetFeedRate(feed_rate) => write!(f, "G1 F{}", format_decimal(*feed_rate)),
            Command::Home => f.write_str("G28"),
            Command::SetPositioning(PositioningMode::Absolute) => f.write_str("G90"),
            Command::SetPositioning(PositioningMode::Relative) => f.write_str("G91"),
            Command::SetPosition { x, y, z, e } => {
                f.write_str("G92")?;
                write_axis(f, 'X', *x)?;
                write_axis(f, 'Y', *y)?;
                write_axis(f, 'Z', *z)?;
                write_axis(f, 'E', *e)
            }
            Command::SetBedTemp { temp, wait: true } => write!(f, "M190 S{temp}"),
            Command::SetBedTemp { temp, wait: false } => write!(f, "M140 S{temp}"),
            Command::SetToolTemp { temp, wait: true } => write!(f, "M109 S{temp}"),
            Command::SetToolTemp { temp, wait: false } => write!(f, "M104 S{temp}"),
            Command::FanOff => f.write_str("M106 S0"),
            Command::DisableMotors => f.write_str("M84"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_move_text() {
        let cmd = Command::LinearMove {
            x: Some(20.0),
            y: Some(0.0),
            z: None,
            e: Some(0.327_744_76),
            feed_rate: 3600.0,
        };
        assert_eq!(cmd.to_string(), "G1 X20 Y0 E0.32774 F3600");

        let lift = Command::LinearMove {
            x: None,
            y: None,
            z: Some(-9.8),
            e: None,
            feed_rate: 1200.0,
        };
        assert_eq!(lift.to_string(), "G1 Z-9.8 F1200");
    }

    #[test]
    fn test_temperature_text() {
        assert_eq!(Command::SetBedTemp { temp: 50, wait: true }.to_string(), "M190 S50");
        assert_eq!(Command::SetBedTemp { temp: 50, wait: false }.to_string(), "M140 S50");
        assert_eq!(Command::SetToolTemp { temp: 180, wait: true }.to_string(), "M109 S180");
        assert_eq!(Command::SetToolTemp { temp: 180, wait: false }.to_string(), "M104 S180");
    }

    #[test]
    fn test_misc_text() {
        assert_eq!(Command::SetFeedRate(1500.0).to_string(), "G1 F1500");
        assert_eq!(Command::Home.to_string(), "G28");
        assert_eq!(Command::SetPositioning(PositioningMode::Absolute).to_string(), "G90");
        assert_eq!(Command::SetPositioning(PositioningMode::Relative).to_string(), "G91");
        assert_eq!(Command::FanOff.to_string(), "M106 S0");
        assert_eq!(Command::DisableMotors.to_string(), "M84");
        let reset = Command::SetPosition {
            x: None,
            y: None,
            z: None,
            e: Some(0.0),
        };
        assert_eq!(reset.to_string(), "G92 E0");
    }
}
