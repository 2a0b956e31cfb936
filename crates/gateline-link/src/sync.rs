//! Frame-start detection on an unframed bit stream.

use gateline_core::{Level, constants::SYNC_SENTINEL};

/// Shift register of the most recent eight bits, compared against the frame
/// sentinel on every arrival.
///
/// The register starts at zero and the sentinel's leading bit is set, so a
/// match can only occur once a full window of real bits has shifted in,
/// never on a shorter prefix. The window is not persisted across a resync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncWindow {
    bits: u8,
}

impl SyncWindow {
    /// Empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift in one bit, discarding the oldest.
    ///
    /// Returns `true` exactly when the window now equals the sentinel.
    pub fn push(&mut self, bit: Level) -> bool {
        self.bits = (self.bits << 1) | bit.as_bit();
        self.bits == SYNC_SENTINEL
    }

    /// Current window contents, newest bit in the least significant place.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.bits
    }

    /// Discard all accumulated bits.
    pub fn reset(&mut self) {
        self.bits = 0;
    }
}
