//! Failed-attempt lockout policy.
//!
//! A pure value type: evaluation is a function of the current state, the
//! correctness of one credential and the current time. No I/O. The receiver
//! and the transmitter each own an independent instance; the protocol has
//! no shared clock or state channel beyond the bit stream, so the two
//! counters are expected to drift apart.

use gateline_core::constants::{LOCK_DURATION, MAX_FAIL};
use std::time::Duration;
use tokio::time::Instant;

/// Classification of one credential evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Credential matched; failure state cleared.
    Accept,
    /// Credential mismatched below the lockout threshold.
    Deny {
        /// Failure count after this attempt.
        fail_count: u32,
    },
    /// Credential mismatched and the lockout window opened (or re-opened).
    Lock {
        /// End of the lockout window.
        until: Instant,
    },
}

/// Attempt counter plus the optional lockout deadline.
///
/// Callers must check [`is_locked`](AttemptPolicy::is_locked) before
/// evaluating: while the window is open, evaluation is skipped entirely and
/// incoming credentials or bits are simply dropped.
///
/// The failure count keeps incrementing past [`MAX_FAIL`], and every failure
/// at or beyond the threshold re-extends the window from the time of that
/// failure. Swap the increment for a clamp here to change that policy.
#[derive(Debug, Clone, Default)]
pub struct AttemptPolicy {
    fail_count: u32,
    locked_until: Option<Instant>,
}

impl AttemptPolicy {
    /// Fresh policy: zero failures, no lockout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Failure count so far.
    #[must_use]
    pub fn fail_count(&self) -> u32 {
        self.fail_count
    }

    /// End of the current lockout window, if one was ever opened.
    #[must_use]
    pub fn locked_until(&self) -> Option<Instant> {
        self.locked_until
    }

    /// True while the lockout window is open.
    #[must_use]
    pub fn is_locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Time left in the lockout window, `None` once it has passed.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.locked_until
            .and_then(|until| (now < until).then(|| until - now))
    }

    /// Evaluate one credential attempt.
    pub fn evaluate(&mut self, now: Instant, correct: bool) -> Verdict {
        if correct {
            self.fail_count = 0;
            self.locked_until = None;
            return Verdict::Accept;
        }

        self.fail_count += 1;
        if self.fail_count >= MAX_FAIL {
            let until = now + LOCK_DURATION;
            self.locked_until = Some(until);
            Verdict::Lock { until }
        } else {
            Verdict::Deny {
                fail_count: self.fail_count,
            }
        }
    }
}
