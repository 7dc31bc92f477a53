//! Stateful G-code emission.
//!
//! [`Generator`] owns the printer config, the tracked head position, the
//! machine's positioning mode and the program text. Every operation stages
//! its commands and the resulting state in a batch, and only commits
//! both once the whole operation has validated. A failed call therefore
//! leaves the generator untouched.
//!
//! All motion is emitted as relative displacements under G91. Absolute
//! variants convert their target into a displacement against the tracked
//! position and go through the same path.

use printhead_math::{distance, filament_length, round_to_precision};
use tracing::{debug, info, warn};

use crate::buffer::CommandBuffer;
use crate::command::{Command, PositioningMode};
use crate::config::{PrinterConfig, Speed};
use crate::error::{ensure_finite, ensure_positive, GcodeError, Result};
use crate::state::{Position, PositionState};

/// What a [`Move`] does besides moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Non-extruding XY move, optionally with Z.
    Travel,
    /// XY move that lays down a bead.
    Extrude,
    /// Z-only move.
    ZOnly,
}

/// A single relative displacement waiting to be emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    /// Move type.
    pub kind: MoveKind,
    /// X displacement (mm).
    pub dx: f64,
    /// Y displacement (mm).
    pub dy: f64,
    /// Z displacement (mm). Emitted only when present.
    pub dz: Option<f64>,
    /// Speed override.
    pub speed: Option<Speed>,
    /// Bead width override, extrusion moves only.
    pub extrusion_width: Option<f64>,
}

impl Move {
    /// Non-extruding move.
    pub fn travel(dx: f64, dy: f64, dz: Option<f64>) -> Self {
        Self {
            kind: MoveKind::Travel,
            dx,
            dy,
            dz,
            speed: None,
            extrusion_width: None,
        }
    }

    /// Extruding XY move.
    pub fn extrude(dx: f64, dy: f64) -> Self {
        Self {
            kind: MoveKind::Extrude,
            dx,
            dy,
            dz: None,
            speed: None,
            extrusion_width: None,
        }
    }

    /// Z-only move.
    pub fn z(dz: f64) -> Self {
        Self {
            kind: MoveKind::ZOnly,
            dx: 0.0,
            dy: 0.0,
            dz: Some(dz),
            speed: None,
            extrusion_width: None,
        }
    }

    /// Use `speed` instead of the configured default.
    pub fn with_speed(mut self, speed: Option<Speed>) -> Self {
        self.speed = speed;
        self
    }

    /// Use `width` instead of the configured bead width.
    pub fn with_extrusion_width(mut self, width: Option<f64>) -> Self {
        self.extrusion_width = width;
        self
    }

    /// Reject axes and overrides the move kind cannot emit.
    fn check_shape(&self) -> Result<()> {
        let unsupported = match self.kind {
            MoveKind::Travel if self.extrusion_width.is_some() => Some("extrusion width"),
            MoveKind::Travel => None,
            MoveKind::Extrude if self.dz.is_some() => Some("z displacement"),
            MoveKind::Extrude => None,
            MoveKind::ZOnly if self.dz.is_none() => {
                return Err(GcodeError::InvalidArgument(
                    "z-only move without a z displacement".into(),
                ))
            }
            MoveKind::ZOnly if self.dx != 0.0 || self.dy != 0.0 => Some("xy displacement"),
            MoveKind::ZOnly if self.extrusion_width.is_some() => Some("extrusion width"),
            MoveKind::ZOnly => None,
        };
        match unsupported {
            Some(what) => Err(GcodeError::InvalidArgument(format!(
                "{:?} move cannot carry {what}",
                self.kind
            ))),
            None => Ok(()),
        }
    }
}

fn resolve_speed(speed: Option<Speed>, default: Speed) -> Result<Speed> {
    match speed {
        Some(s) => s.validated("speed"),
        None => Ok(default),
    }
}

/// Rounded filament length for an XY displacement.
fn filament_for(config: &PrinterConfig, dx: f64, dy: f64, width: Option<f64>) -> Result<f64> {
    let width = match width {
        Some(w) => ensure_positive("extrusion_width", w)?,
        None => config.extrusion_width(),
    };
    let length = filament_length(
        distance(0.0, 0.0, dx, dy),
        width,
        config.layer_height,
        config.filament_diameter,
    );
    if length < 0.0 {
        if config.clamp_negative_extrusion {
            warn!(width, length, "bead narrower than layer height, clamping extrusion to 0");
            return Ok(0.0);
        }
        warn!(width, length, "bead narrower than layer height, emitting negative extrusion");
    }
    Ok(round_to_precision(length))
}

/// Commands and state produced by one operation, not yet committed.
struct Batch {
    state: PositionState,
    mode: Option<PositioningMode>,
    commands: Vec<Command>,
}

impl Batch {
    fn require_mode(&mut self, mode: PositioningMode) {
        if self.mode != Some(mode) {
            self.commands.push(Command::SetPositioning(mode));
            self.mode = Some(mode);
        }
    }

    fn push_move(&mut self, config: &PrinterConfig, mv: &Move) -> Result<()> {
        self.state.current()?;
        mv.check_shape()?;
        let dx = round_to_precision(ensure_finite("dx", mv.dx)?);
        let dy = round_to_precision(ensure_finite("dy", mv.dy)?);
        let dz = match mv.dz {
            Some(dz) => Some(round_to_precision(ensure_finite("dz", dz)?)),
            None => None,
        };

        let command = match mv.kind {
            MoveKind::Travel => {
                let speed = resolve_speed(mv.speed, config.travel_speed)?;
                self.state.apply_delta(dx, dy, dz.unwrap_or(0.0), 0.0)?;
                Command::LinearMove {
                    x: Some(dx),
                    y: Some(dy),
                    z: dz,
                    e: None,
                    feed_rate: speed.feed_rate(),
                }
            }
            MoveKind::Extrude => {
                let speed = resolve_speed(mv.speed, config.print_speed)?;
                let e = filament_for(config, dx, dy, mv.extrusion_width)?;
                self.state.apply_delta(dx, dy, 0.0, e)?;
                Command::LinearMove {
                    x: Some(dx),
                    y: Some(dy),
                    z: None,
                    e: Some(e),
                    feed_rate: speed.feed_rate(),
                }
            }
            MoveKind::ZOnly => {
                let speed = resolve_speed(mv.speed, config.z_lift_speed)?;
                let dz = dz.unwrap_or_default();
                self.state.apply_delta(0.0, 0.0, dz, 0.0)?;
                Command::LinearMove {
                    x: None,
                    y: None,
                    z: Some(dz),
                    e: None,
                    feed_rate: speed.feed_rate(),
                }
            }
        };

        self.require_mode(PositioningMode::Relative);
        self.commands.push(command);
        Ok(())
    }

    fn push_filament(&mut self, de: f64, speed: Speed) -> Result<()> {
        let de = round_to_precision(ensure_finite("length", de)?);
        self.state.apply_delta(0.0, 0.0, 0.0, de)?;
        self.require_mode(PositioningMode::Relative);
        self.commands.push(Command::LinearMove {
            x: None,
            y: None,
            z: None,
            e: Some(de),
            feed_rate: speed.feed_rate(),
        });
        Ok(())
    }
}

/// G-code generator for one print job.
///
/// The config is fixed at construction. Position-dependent operations fail
/// with [`GcodeError::Uninitialized`](crate::GcodeError::Uninitialized)
/// until [`Generator::home`] or [`Generator::initialize`] has run.
#[derive(Debug, Clone)]
pub struct Generator {
    config: PrinterConfig,
    state: PositionState,
    mode: Option<PositioningMode>,
    buffer: CommandBuffer,
}

impl Generator {
    /// Create a generator. Fails if the config has a non-positive or
    /// non-finite length or speed.
    pub fn new(config: PrinterConfig) -> Result<Self> {
        config.validate()?;
        debug!(profile = %config.name, "created generator");
        Ok(Self {
            config,
            state: PositionState::new(),
            mode: None,
            buffer: CommandBuffer::new(),
        })
    }

    /// Printer config.
    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Tracked head position.
    pub fn position(&self) -> Result<Position> {
        self.state.current()
    }

    /// Positioning mode the machine was last switched to, if any.
    pub fn mode(&self) -> Option<PositioningMode> {
        self.mode
    }

    /// Emitted program so far.
    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    /// Full program text.
    pub fn render(&self) -> String {
        self.buffer.render()
    }

    fn stage(&self) -> Batch {
        Batch {
            state: self.state,
            mode: self.mode,
            commands: Vec::new(),
        }
    }

    fn commit(&mut self, batch: Batch) -> &[String] {
        let Batch {
            state,
            mode,
            commands,
        } = batch;
        self.state = state;
        self.mode = mode;
        let lines = self.buffer.append(&commands);
        debug!(lines = ?lines, "emitted");
        lines
    }

    /// Home all axes and lift to the safe Z height.
    ///
    /// Position becomes `(0, 0, safe_z, 0)`. This is the only way to reach
    /// a known position besides [`Generator::initialize`].
    pub fn home(&mut self) -> &[String] {
        let safe_z = self.config.safe_z;
        let mut batch = self.stage();
        batch.require_mode(PositioningMode::Absolute);
        batch.commands.push(Command::Home);
        batch.commands.push(Command::LinearMove {
            x: Some(0.0),
            y: Some(0.0),
            z: Some(safe_z),
            e: None,
            feed_rate: self.config.travel_speed.feed_rate(),
        });
        batch.commands.push(Command::SetPosition {
            x: None,
            y: None,
            z: None,
            e: Some(0.0),
        });
        batch.state = PositionState::at_origin(Position::new(0.0, 0.0, safe_z, 0.0));
        info!(safe_z, "homed");
        self.commit(batch)
    }

    /// Declare the head to be at `origin` without moving it (G92).
    pub fn initialize(&mut self, origin: Position) -> Result<&[String]> {
        let mut batch = self.stage();
        batch.state.initialize(origin)?;
        let origin = batch.state.current()?;
        batch.commands.push(Command::SetPosition {
            x: Some(origin.x),
            y: Some(origin.y),
            z: Some(origin.z),
            e: Some(origin.e),
        });
        info!(?origin, "position initialized");
        Ok(self.commit(batch))
    }

    /// Emit a sequence of moves as one all-or-nothing operation.
    pub fn emit_moves(&mut self, moves: &[Move]) -> Result<&[String]> {
        let mut batch = self.stage();
        for mv in moves {
            batch.push_move(&self.config, mv)?;
        }
        Ok(self.commit(batch))
    }

    /// Non-extruding move by a displacement. Z is emitted only when given.
    pub fn travel_by(
        &mut self,
        dx: f64,
        dy: f64,
        dz: Option<f64>,
        speed: Option<Speed>,
    ) -> Result<&[String]> {
        self.emit_moves(&[Move::travel(dx, dy, dz).with_speed(speed)])
    }

    /// Non-extruding move to an absolute target. Z is emitted only when given.
    pub fn travel_to(
        &mut self,
        x: f64,
        y: f64,
        z: Option<f64>,
        speed: Option<Speed>,
    ) -> Result<&[String]> {
        let [dx, dy, dz] = self.state.delta_to(Some(x), Some(y), z)?;
        self.travel_by(dx, dy, z.map(|_| dz), speed)
    }

    /// Extruding move by a displacement.
    pub fn extrude_by(
        &mut self,
        dx: f64,
        dy: f64,
        speed: Option<Speed>,
        extrusion_width: Option<f64>,
    ) -> Result<&[String]> {
        self.emit_moves(&[Move::extrude(dx, dy)
            .with_speed(speed)
            .with_extrusion_width(extrusion_width)])
    }

    /// Extruding move to an absolute XY target.
    pub fn extrude_to(
        &mut self,
        x: f64,
        y: f64,
        speed: Option<Speed>,
        extrusion_width: Option<f64>,
    ) -> Result<&[String]> {
        let [dx, dy, _] = self.state.delta_to(Some(x), Some(y), None)?;
        self.extrude_by(dx, dy, speed, extrusion_width)
    }

    /// Feed `length` mm of filament without moving. Defaults to print speed.
    pub fn extrude(&mut self, length: f64, speed: Option<Speed>) -> Result<&[String]> {
        let speed = resolve_speed(speed, self.config.print_speed)?;
        let mut batch = self.stage();
        batch.push_filament(length, speed)?;
        Ok(self.commit(batch))
    }

    /// Pull filament back. Defaults to the configured retract length.
    pub fn retract(&mut self, length: Option<f64>) -> Result<&[String]> {
        let length = self.retract_length(length)?;
        let mut batch = self.stage();
        batch.push_filament(-length, self.config.retract_speed)?;
        Ok(self.commit(batch))
    }

    /// Push retracted filament back. Defaults to the configured retract length.
    pub fn unretract(&mut self, length: Option<f64>) -> Result<&[String]> {
        let length = self.retract_length(length)?;
        let mut batch = self.stage();
        batch.push_filament(length, self.config.retract_speed)?;
        Ok(self.commit(batch))
    }

    /// Z move by a displacement, optionally wrapped in retract/unretract.
    pub fn move_z_by(
        &mut self,
        dz: f64,
        speed: Option<Speed>,
        with_retract: bool,
    ) -> Result<&[String]> {
        let retract = self.config.retract_length;
        let retract_speed = self.config.retract_speed;
        let mut batch = self.stage();
        if with_retract {
            batch.push_filament(-retract, retract_speed)?;
        }
        batch.push_move(&self.config, &Move::z(dz).with_speed(speed))?;
        if with_retract {
            batch.push_filament(retract, retract_speed)?;
        }
        Ok(self.commit(batch))
    }

    /// Z move to an absolute height, optionally wrapped in retract/unretract.
    pub fn move_z_to(
        &mut self,
        z: f64,
        speed: Option<Speed>,
        with_retract: bool,
    ) -> Result<&[String]> {
        let [_, _, dz] = self.state.delta_to(None, None, Some(z))?;
        self.move_z_by(dz, speed, with_retract)
    }

    /// Raise Z by one layer height.
    pub fn next_layer(&mut self, with_retract: bool) -> Result<&[String]> {
        self.move_z_by(self.config.layer_height, None, with_retract)
    }

    fn retract_length(&self, length: Option<f64>) -> Result<f64> {
        match length {
            Some(l) => ensure_positive("retract length", l),
            None => Ok(self.config.retract_length),
        }
    }

    /// Set the bed temperature, waiting for it when `blocking`.
    pub fn heat_bed(&mut self, temp: u32, blocking: bool) -> &[String] {
        let mut batch = self.stage();
        batch.commands.push(Command::SetBedTemp {
            temp,
            wait: blocking,
        });
        self.commit(batch)
    }

    /// Set the hotend temperature, waiting for it when `blocking`.
    pub fn heat_tool(&mut self, temp: u32, blocking: bool) -> &[String] {
        let mut batch = self.stage();
        batch.commands.push(Command::SetToolTemp {
            temp,
            wait: blocking,
        });
        self.commit(batch)
    }

    /// Set the feed rate for subsequent moves.
    pub fn set_speed(&mut self, speed: Speed) -> Result<&[String]> {
        let speed = speed.validated("speed")?;
        let mut batch = self.stage();
        batch.commands.push(Command::SetFeedRate(speed.feed_rate()));
        debug!(mm_per_s = speed.value(), "feed rate set");
        Ok(self.commit(batch))
    }

    /// Fan off, heaters off, motors off. Closes an open relative block
    /// with G90 first.
    pub fn disable_all(&mut self) -> &[String] {
        let mut batch = self.stage();
        if batch.mode == Some(PositioningMode::Relative) {
            batch.require_mode(PositioningMode::Absolute);
        }
        batch.commands.extend([
            Command::FanOff,
            Command::SetToolTemp {
                temp: 0,
                wait: false,
            },
            Command::SetBedTemp {
                temp: 0,
                wait: false,
            },
            Command::DisableMotors,
        ]);
        self.commit(batch)
    }
}
