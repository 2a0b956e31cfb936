//! Textual control surface over the registry.
//!
//! Mirrors the attribute-file conventions of line drivers: a class-level
//! write-only `export`/`unexport` pair taking a decimal line number, a byte
//! endpoint per exported line accepting `0`/`1`/`in`/`out`, and `value`/
//! `direction` attributes with the usual read/write split. All parsing
//! tolerates a trailing newline.

use crate::handle::{LineCommand, LineHandle};
use crate::registry::LineRegistry;
use gateline_core::{Direction, Error, Level, LineId, Result};

/// Event-control opcodes accepted by a line endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOp {
    /// Arm the resource's rising-edge interrupt.
    EnableEvents,
    /// Detach the resource's interrupt.
    DisableEvents,
}

impl LineRegistry {
    /// Handle a write to the class-level `export` attribute.
    ///
    /// # Errors
    /// `InvalidArgument` for a non-decimal payload, otherwise the
    /// [`export`](LineRegistry::export) error codes.
    pub fn write_export(&self, buf: &str) -> Result<usize> {
        let line: LineId = buf.parse()?;
        self.export(line)
    }

    /// Handle a write to the class-level `unexport` attribute.
    ///
    /// # Errors
    /// `InvalidArgument` for a non-decimal payload, `NotFound` if the line
    /// is not exported.
    pub fn write_unexport(&self, buf: &str) -> Result<()> {
        let line: LineId = buf.parse()?;
        self.unexport(line)
    }
}

impl LineHandle {
    /// Endpoint byte read: the current level as `"0"` or `"1"`.
    pub fn endpoint_read(&self) -> Result<&'static str> {
        Ok(match self.read()? {
            Level::Low => "0",
            Level::High => "1",
        })
    }

    /// Endpoint byte write: `"0"`, `"1"`, `"in"` or `"out"`.
    pub fn endpoint_write(&self, buf: &str) -> Result<()> {
        self.write(buf.parse::<LineCommand>()?)
    }

    /// Endpoint control operation.
    pub fn control(&self, op: ControlOp) -> Result<()> {
        match op {
            ControlOp::EnableEvents => self.arm_interrupt(),
            ControlOp::DisableEvents => self.disarm_interrupt(),
        }
    }

    /// `value` attribute read: `"0\n"` or `"1\n"`.
    pub fn value_show(&self) -> Result<String> {
        Ok(format!("{}\n", self.read()?.as_bit()))
    }

    /// `value` attribute write. Only `0`/`1` are accepted, and the store is
    /// rejected outright while the direction is input.
    pub fn value_store(&self, buf: &str) -> Result<()> {
        if self.direction()? == Direction::Input {
            return Err(Error::permission_denied(format!(
                "line {} is an input",
                self.line()
            )));
        }
        let level: Level = buf.parse()?;
        self.write(LineCommand::Set(level))
    }

    /// `direction` attribute read: `"in\n"` or `"out\n"`.
    pub fn direction_show(&self) -> Result<String> {
        Ok(format!("{}\n", self.direction()?))
    }

    /// `direction` attribute write: `"in"` or `"out"`.
    pub fn direction_store(&self, buf: &str) -> Result<()> {
        let direction: Direction = buf.parse()?;
        self.write(LineCommand::SetDirection(direction))
    }
}
