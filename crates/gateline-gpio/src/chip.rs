//! Simulated line controller.
//!
//! This module provides an in-process stand-in for a physical GPIO chip so
//! the registry and the credential link can run without hardware. Each pin's
//! level lives in a `tokio::sync::watch` channel: setting a level is a
//! non-blocking store, and edge observers subscribe to level changes instead
//! of polling.
//!
//! Two pins can be jumpered together with [`SimChip::link`], which makes them
//! share one cell: the in-process equivalent of the wire connecting a
//! transmit pin to a receive pin on the bench.

use gateline_core::{Error, Level, LineId, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

/// Number of pins on the default simulated chip (BCM-style numbering).
pub const DEFAULT_PIN_COUNT: u32 = 28;

/// One pin's mutable state.
///
/// Shared between every `SimLine` acquired for the pin and, after a
/// [`SimChip::link`], between both jumpered pins.
#[derive(Debug)]
struct PinCell {
    level: watch::Sender<Level>,
}

impl PinCell {
    fn new() -> Self {
        let (level, _) = watch::channel(Level::Low);
        PinCell { level }
    }
}

/// Simulated GPIO chip.
///
/// # Examples
///
/// ```
/// use gateline_core::{Level, LineId};
/// use gateline_gpio::SimChip;
///
/// let chip = SimChip::new();
/// let line = chip.acquire(LineId::new(17)).unwrap();
///
/// assert_eq!(line.get(), Level::Low);
/// line.set(Level::High);
/// assert_eq!(line.get(), Level::High);
/// ```
#[derive(Debug)]
pub struct SimChip {
    pins: HashMap<u32, Arc<PinCell>>,
    no_irq: HashSet<u32>,
}

impl SimChip {
    /// Create a chip with the default pin count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pins(DEFAULT_PIN_COUNT)
    }

    /// Create a chip with `count` pins numbered `0..count`.
    #[must_use]
    pub fn with_pins(count: u32) -> Self {
        let pins = (0..count).map(|n| (n, Arc::new(PinCell::new()))).collect();
        SimChip {
            pins,
            no_irq: HashSet::new(),
        }
    }

    /// Mark a pin as unable to deliver edge interrupts.
    ///
    /// Arming an interrupt on a line acquired from such a pin fails with
    /// `InterruptUnavailable`.
    #[must_use]
    pub fn without_irq(mut self, line: LineId) -> Self {
        self.no_irq.insert(line.as_u32());
        self
    }

    /// Jumper pin `b` onto pin `a` so both share one cell.
    ///
    /// The wire is bidirectional: a level driven on either pin is observed on
    /// both, and an edge watcher on either sees the same transitions. Call
    /// this before acquiring lines for the affected pins.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if either pin does not exist.
    pub fn link(&mut self, a: LineId, b: LineId) -> Result<()> {
        let cell = Arc::clone(self.cell(a)?);
        let target = self
            .pins
            .get_mut(&b.as_u32())
            .ok_or_else(|| Error::invalid_argument(format!("no such pin: {b}")))?;
        *target = cell;
        Ok(())
    }

    /// Acquire a handle to one pin.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the pin does not exist.
    pub fn acquire(&self, line: LineId) -> Result<SimLine> {
        let cell = Arc::clone(self.cell(line)?);
        Ok(SimLine {
            id: line,
            cell,
            irq_capable: !self.no_irq.contains(&line.as_u32()),
        })
    }

    fn cell(&self, line: LineId) -> Result<&Arc<PinCell>> {
        self.pins
            .get(&line.as_u32())
            .ok_or_else(|| Error::invalid_argument(format!("no such pin: {line}")))
    }
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one pin of a [`SimChip`].
#[derive(Debug, Clone)]
pub struct SimLine {
    id: LineId,
    cell: Arc<PinCell>,
    irq_capable: bool,
}

impl SimLine {
    /// The physical line number this handle was acquired for.
    #[must_use]
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Sample the current level. Non-blocking.
    #[must_use]
    pub fn get(&self) -> Level {
        *self.cell.level.borrow()
    }

    /// Drive the pin to `level`. Non-blocking.
    pub fn set(&self, level: Level) {
        self.cell.level.send_replace(level);
    }

    /// Subscribe to level changes for edge detection.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Level> {
        self.cell.level.subscribe()
    }

    /// Whether this pin can deliver edge interrupts.
    #[must_use]
    pub fn irq_capable(&self) -> bool {
        self.irq_capable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_unknown_pin() {
        let chip = SimChip::new();
        let result = chip.acquire(LineId::new(99));
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_level_roundtrip() {
        let chip = SimChip::new();
        let line = chip.acquire(LineId::new(5)).unwrap();
        assert_eq!(line.get(), Level::Low);
        line.set(Level::High);
        assert_eq!(line.get(), Level::High);
        line.set(Level::Low);
        assert_eq!(line.get(), Level::Low);
    }

    #[test]
    fn test_linked_pins_share_level() {
        let mut chip = SimChip::new();
        chip.link(LineId::new(26), LineId::new(17)).unwrap();

        let tx = chip.acquire(LineId::new(26)).unwrap();
        let rx = chip.acquire(LineId::new(17)).unwrap();

        tx.set(Level::High);
        assert_eq!(rx.get(), Level::High);

        // The jumper is bidirectional.
        rx.set(Level::Low);
        assert_eq!(tx.get(), Level::Low);
    }

    #[test]
    fn test_link_unknown_pin() {
        let mut chip = SimChip::with_pins(4);
        assert!(chip.link(LineId::new(0), LineId::new(9)).is_err());
        assert!(chip.link(LineId::new(9), LineId::new(0)).is_err());
    }

    #[test]
    fn test_irq_capability_flag() {
        let chip = SimChip::new().without_irq(LineId::new(7));
        assert!(!chip.acquire(LineId::new(7)).unwrap().irq_capable());
        assert!(chip.acquire(LineId::new(8)).unwrap().irq_capable());
    }

    #[tokio::test]
    async fn test_watch_sees_level_change() {
        let chip = SimChip::new();
        let line = chip.acquire(LineId::new(3)).unwrap();
        let mut levels = line.watch();

        line.set(Level::High);
        levels.changed().await.unwrap();
        assert_eq!(*levels.borrow_and_update(), Level::High);
    }
}
