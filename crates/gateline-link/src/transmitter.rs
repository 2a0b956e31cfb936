//! Credential transmitter.
//!
//! Serializes a credential onto a (data, clock) line pair with manual strobe
//! timing: for each bit the data line is driven to the value, held for the
//! setup time, then the clock is pulsed high and low to mark the sampling
//! instant. Every frame is prefixed with the sentinel byte through the same
//! bit primitive so a listening receiver can resynchronize, including on
//! the dummy frames substituted for malformed input.

use crate::lockout::{AttemptPolicy, Verdict};
use gateline_core::{
    Credential, Direction, Level, Result,
    constants::{BIT_PERIOD, DATA_SETUP, SYNC_SENTINEL},
};
use gateline_gpio::{LineCommand, LineHandle};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Outcome of transmitting one candidate credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The candidate matched the secret; the transmitter is done.
    Accepted,
    /// The candidate mismatched below the lockout threshold.
    Denied {
        /// Failure count after this attempt.
        fail_count: u32,
    },
    /// The attempt opened (or re-opened) the lockout window.
    Locked {
        /// End of the lockout window.
        until: Instant,
    },
    /// The lockout window is still open; nothing was transmitted.
    StillLocked {
        /// Time left in the window.
        remaining: Duration,
    },
}

/// Drives a credential frame onto two output lines.
pub struct CredentialTransmitter {
    data: LineHandle,
    clock: LineHandle,
    secret: Credential,
    policy: AttemptPolicy,
}

impl CredentialTransmitter {
    /// Bind a transmitter to its line pair, flipping both to output.
    ///
    /// # Errors
    /// Returns `NotFound` if either line has been unexported.
    pub fn new(data: LineHandle, clock: LineHandle, secret: Credential) -> Result<Self> {
        data.write(LineCommand::SetDirection(Direction::Output))?;
        clock.write(LineCommand::SetDirection(Direction::Output))?;
        Ok(CredentialTransmitter {
            data,
            clock,
            secret,
            policy: AttemptPolicy::new(),
        })
    }

    /// The transmitter's view of the attempt counter.
    #[must_use]
    pub fn policy(&self) -> &AttemptPolicy {
        &self.policy
    }

    /// Time left in the lockout window, if it is open.
    #[must_use]
    pub fn lock_remaining(&self) -> Option<Duration> {
        self.policy.remaining(Instant::now())
    }

    /// Validate and transmit one candidate credential.
    ///
    /// A candidate that is not exactly four digits is replaced by the
    /// all-zero dummy, counted as a failed attempt, and still transmitted so
    /// the receiver can resynchronize. The lock window is checked before
    /// anything is driven onto the lines.
    ///
    /// # Errors
    /// Returns `NotFound` if a line is unexported mid-frame.
    pub async fn send_candidate(&mut self, input: &str) -> Result<SendOutcome> {
        if let Some(remaining) = self.policy.remaining(Instant::now()) {
            return Ok(SendOutcome::StillLocked { remaining });
        }

        let (credential, substituted) = match Credential::new(input) {
            Ok(credential) => (credential, false),
            Err(_) => {
                warn!("invalid input, sending all-zero dummy");
                (Credential::dummy(), true)
            }
        };
        // A substituted dummy counts as a failure at validation time,
        // before the send.
        let verdict = substituted.then(|| self.policy.evaluate(Instant::now(), false));

        self.send_frame(&credential).await?;

        if credential == self.secret {
            info!("correct credential sent");
            return Ok(SendOutcome::Accepted);
        }

        let verdict = match verdict {
            Some(verdict) => verdict,
            None if !credential.is_dummy() => self.policy.evaluate(Instant::now(), false),
            // A deliberate all-zero candidate is transmitted so the receiver
            // can resynchronize, but is never charged as an attempt.
            None => {
                return Ok(SendOutcome::Denied {
                    fail_count: self.policy.fail_count(),
                });
            }
        };
        Ok(match verdict {
            Verdict::Deny { fail_count } => {
                warn!(fail_count, "attempt failed");
                SendOutcome::Denied { fail_count }
            }
            Verdict::Lock { until } => {
                warn!(
                    fail_count = self.policy.fail_count(),
                    "too many failures, locking"
                );
                SendOutcome::Locked { until }
            }
            // evaluate(_, false) never accepts.
            Verdict::Accept => SendOutcome::Accepted,
        })
    }

    /// Send the sentinel byte followed by the credential bytes.
    async fn send_frame(&self, credential: &Credential) -> Result<()> {
        self.send_byte(SYNC_SENTINEL).await?;
        debug!("sent start sentinel");
        for &byte in credential.as_str().as_bytes() {
            self.send_byte(byte).await?;
        }
        debug!("sent credential frame");
        Ok(())
    }

    /// Send one byte, MSB first.
    async fn send_byte(&self, byte: u8) -> Result<()> {
        for shift in (0..8).rev() {
            self.send_bit(Level::from_bit((byte >> shift) & 1)).await?;
        }
        Ok(())
    }

    /// Send one bit: drive data, settle, then strobe the clock.
    async fn send_bit(&self, bit: Level) -> Result<()> {
        trace!(bit = %bit, "tx bit");
        self.data.write(LineCommand::Set(bit))?;
        tokio::time::sleep(DATA_SETUP).await;
        self.clock.write(LineCommand::Set(Level::High))?;
        tokio::time::sleep(BIT_PERIOD - DATA_SETUP).await;
        self.clock.write(LineCommand::Set(Level::Low))?;
        Ok(())
    }
}
