//! Constants shared by the line registry and the bit-serial credential link.
//!
//! Registry limits describe the fixed resource table; link constants describe
//! the wire format both ends of the credential exchange must agree on. The
//! transmitter and receiver are independent programs with no side channel, so
//! a mismatch in any link constant silently breaks synchronization.

use std::time::Duration;

// ============================================================================
// Line registry
// ============================================================================

/// Maximum number of lines the registry can export at once.
///
/// The registry is a fixed arena of this many slots; `export` fails with
/// `CapacityExceeded` when every slot is occupied. Unexporting frees the slot
/// for reuse.
pub const MAX_LINES: usize = 10;

/// Name prefix for per-line endpoints.
///
/// An exported line with physical id `17` is addressable as `line17`.
pub const ENDPOINT_PREFIX: &str = "line";

// ============================================================================
// Credential format
// ============================================================================

/// Credential length in characters.
///
/// Credentials are exactly this many ASCII digits.
pub const CREDENTIAL_LEN: usize = 4;

/// Bits in one complete credential frame.
///
/// Each credential character is sent as one 8-bit byte, MSB first.
pub const FRAME_BITS: usize = CREDENTIAL_LEN * 8;

// ============================================================================
// Frame synchronization
// ============================================================================

/// Sentinel byte marking the start of a frame.
///
/// The transmitter sends this byte (bit pattern `10101010`) before every
/// credential so a receiver with no independent start-of-frame signal can
/// find the boundary. The receiver shifts incoming bits through an 8-bit
/// window and declares sync at the instant the window equals this value.
pub const SYNC_SENTINEL: u8 = 0xAA;

/// Width of the receiver's synchronization shift register, in bits.
pub const SYNC_WINDOW_BITS: usize = 8;

// ============================================================================
// Attempt lockout
// ============================================================================

/// Failed attempts tolerated before the lockout window opens.
pub const MAX_FAIL: u32 = 5;

/// Length of the lockout window after repeated failures.
pub const LOCK_DURATION: Duration = Duration::from_secs(30);

// ============================================================================
// Bit timing
// ============================================================================

/// Duration of one transmitted bit cell.
///
/// The clock strobe rises `DATA_SETUP` into the cell and falls at the end of
/// it, so the receiver samples a data level that has been stable for the
/// setup time.
pub const BIT_PERIOD: Duration = Duration::from_millis(100);

/// Settling time between driving the data line and raising the strobe.
pub const DATA_SETUP: Duration = Duration::from_millis(5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_holds_one_credential() {
        assert_eq!(FRAME_BITS, CREDENTIAL_LEN * 8);
    }

    #[test]
    fn sentinel_is_alternating_bits() {
        assert_eq!(SYNC_SENTINEL, 0b1010_1010);
    }

    #[test]
    fn strobe_rises_inside_bit_cell() {
        assert!(DATA_SETUP < BIT_PERIOD);
    }
}
