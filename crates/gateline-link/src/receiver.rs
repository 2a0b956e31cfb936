//! Credential receiver.
//!
//! The receive path is split in two, mirroring the bridge's two-phase
//! design: [`FrameAssembler`] is the pure synchronization state machine
//! (no I/O, no clock), and [`CredentialReceiver`] is the consumer task that
//! awaits clock notifications, samples the data line and drives the
//! assembler and the lockout policy.

use crate::frame::FrameBuffer;
use crate::lockout::{AttemptPolicy, Verdict};
use crate::sync::SyncWindow;
use gateline_core::{Credential, Level, Result, constants::CREDENTIAL_LEN};
use gateline_gpio::LineHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Receiver synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RxState {
    /// Searching the bit stream for the frame sentinel.
    Unsynced,
    /// Sentinel found; accumulating frame bits.
    Synced,
    /// Lockout window open; traffic is ignored.
    Locked,
    /// Terminal: a correct credential was received.
    Unlocked,
}

impl fmt::Display for RxState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = match self {
            RxState::Unsynced => "Unsynced",
            RxState::Synced => "Synced",
            RxState::Locked => "Locked",
            RxState::Unlocked => "Unlocked",
        };
        write!(f, "{state}")
    }
}

/// Result of feeding one sampled bit to the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOutcome {
    /// Still hunting for the sentinel.
    Hunting,
    /// The sentinel just completed; frame accumulation begins.
    Synced,
    /// Bit appended to the current frame.
    Accumulating {
        /// Bits accumulated so far.
        received: usize,
    },
    /// A full frame was assembled and the buffers were reset.
    Completed([u8; CREDENTIAL_LEN]),
}

/// Pure frame-boundary state machine.
///
/// Unsynced, it shifts bits through the [`SyncWindow`]; synced, it fills the
/// [`FrameBuffer`]. Completing a frame resets both buffers and drops back to
/// hunting regardless of how the credential evaluates; evaluation belongs
/// to the caller.
#[derive(Debug, Clone, Default)]
pub struct FrameAssembler {
    window: SyncWindow,
    frame: FrameBuffer,
    synced: bool,
}

impl FrameAssembler {
    /// Assembler in the hunting state with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while accumulating frame bits.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Feed one sampled bit.
    pub fn push(&mut self, bit: Level) -> BitOutcome {
        if !self.synced {
            if self.window.push(bit) {
                self.synced = true;
                self.frame.clear();
                return BitOutcome::Synced;
            }
            return BitOutcome::Hunting;
        }

        let received = self.frame.push(bit);
        if self.frame.is_full() {
            let word = self.frame.decode();
            self.reset();
            return BitOutcome::Completed(word);
        }
        BitOutcome::Accumulating { received }
    }

    /// Discard all progress: empty buffers, back to hunting.
    pub fn reset(&mut self) {
        self.window.reset();
        self.frame.clear();
        self.synced = false;
    }
}

/// Consumer task decoding credentials from a (data, clock) line pair.
///
/// Owns the line handles, its [`AttemptPolicy`] and the configured secret.
/// The control flow is single-threaded: it cooperatively suspends awaiting
/// the next clock notification or, while locked, a deadline. Each sample
/// re-reads the data resource fresh, since a notification carries no
/// payload.
pub struct CredentialReceiver {
    data: LineHandle,
    clock: LineHandle,
    secret: Credential,
    policy: AttemptPolicy,
    assembler: FrameAssembler,
    state: RxState,
}

impl CredentialReceiver {
    /// Bind a receiver to its line pair and arm the clock interrupt.
    ///
    /// # Errors
    /// Propagates `arm_interrupt` failures: `AlreadyArmed`,
    /// `InterruptUnavailable` or `NotFound`.
    pub fn new(data: LineHandle, clock: LineHandle, secret: Credential) -> Result<Self> {
        clock.arm_interrupt()?;
        Ok(CredentialReceiver {
            data,
            clock,
            secret,
            policy: AttemptPolicy::new(),
            assembler: FrameAssembler::new(),
            state: RxState::Unsynced,
        })
    }

    /// Current synchronization state.
    #[must_use]
    pub fn state(&self) -> RxState {
        self.state
    }

    /// The receiver's view of the attempt counter.
    #[must_use]
    pub fn policy(&self) -> &AttemptPolicy {
        &self.policy
    }

    /// Receive until a correct credential arrives.
    ///
    /// Returns `Ok(())` once unlocked. Loss of synchronization is expected
    /// under line noise and silently restarts the hunt; it is never an
    /// error.
    ///
    /// # Errors
    /// Returns `NotFound` if either line is unexported underneath the
    /// receiver.
    pub async fn run(&mut self) -> Result<()> {
        info!(secret_len = CREDENTIAL_LEN, "waiting for credential");
        loop {
            if let Some(remaining) = self.policy.remaining(Instant::now()) {
                self.state = RxState::Locked;
                self.assembler.reset();
                info!(remaining_secs = remaining.as_secs(), "locked, ignoring traffic");
                self.wait_out_lock().await;
                self.state = RxState::Unsynced;
                debug!("lockout expired, searching for sync");
                continue;
            }

            self.clock.notified().await;
            let bit = self.data.read()?;
            self.on_bit(bit);
            if self.state == RxState::Unlocked {
                return Ok(());
            }
        }
    }

    /// Feed one sampled bit through the assembler and, on a complete frame,
    /// the lockout policy.
    fn on_bit(&mut self, bit: Level) {
        match self.assembler.push(bit) {
            BitOutcome::Hunting => {}
            BitOutcome::Synced => {
                self.state = RxState::Synced;
                debug!("start pattern detected, receiving credential");
            }
            BitOutcome::Accumulating { received } => {
                trace!(received, bit = %bit, "rx bit");
            }
            BitOutcome::Completed(word) => {
                self.state = RxState::Unsynced;
                let correct = self.secret.matches_bytes(&word);
                info!(received = %String::from_utf8_lossy(&word), "credential frame received");
                match self.policy.evaluate(Instant::now(), correct) {
                    Verdict::Accept => {
                        info!("credential accepted, unlocked");
                        self.state = RxState::Unlocked;
                    }
                    Verdict::Deny { fail_count } => {
                        warn!(fail_count, "credential denied");
                    }
                    Verdict::Lock { .. } => {
                        warn!(
                            fail_count = self.policy.fail_count(),
                            "too many failures, locking"
                        );
                    }
                }
            }
        }
    }

    /// Single suspending wait carrying the lock deadline.
    ///
    /// Notifications arriving inside the window wake it early, but the bits
    /// behind them are dropped without sampling and never partially resynced
    /// across the boundary.
    async fn wait_out_lock(&mut self) {
        let Some(until) = self.policy.locked_until() else {
            return;
        };
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(until) => return,
                _ = self.clock.notified() => {
                    trace!("bit dropped during lockout");
                    self.assembler.reset();
                }
            }
        }
    }
}
