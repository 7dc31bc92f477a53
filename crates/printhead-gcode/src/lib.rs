#![warn(missing_docs)]

//! Stateful G-code emission for fused-filament printers.
//!
//! This crate turns already-decided waypoints into linear motion commands
//! with correct extrusion amounts, while tracking the head position and
//! filament state so that the emitted text and the tracked state never
//! disagree.
//!
//! # Example
//!
//! ```
//! use printhead_gcode::{Direction, Generator, PrinterConfig, Winding};
//!
//! # fn main() -> printhead_gcode::Result<()> {
//! let mut gcode = Generator::new(PrinterConfig::new(0.4, 0.2, 1.75))?;
//! gcode.home();
//! gcode.heat_tool(200, true);
//! gcode.travel_to(100.0, 100.0, Some(0.2), None)?;
//! gcode.rectangle(20.0, 20.0, Direction::Right, Winding::Clockwise, None)?;
//! gcode.disable_all();
//!
//! let program = gcode.render();
//! assert!(program.contains("G1 X20 Y0 E0.32774 F3600"));
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod command;
pub mod config;
pub mod emitter;
pub mod error;
pub mod shapes;
pub mod state;

pub use buffer::CommandBuffer;
pub use command::{Command, PositioningMode};
pub use config::{PrinterConfig, Speed};
pub use emitter::{Generator, Move, MoveKind};
pub use error::{GcodeError, Result};
pub use shapes::{rectangle_deltas, Direction, Winding};
pub use state::{Position, PositionState};
