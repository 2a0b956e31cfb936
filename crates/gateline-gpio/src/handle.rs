//! Consumer handle bound to one exported line.

use crate::bridge;
use crate::line::SubscriberId;
use crate::registry::RegistryInner;
use gateline_core::{Direction, Error, Level, LineId, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// A write accepted by a line endpoint: a level or a direction change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCommand {
    /// Drive the line to a level.
    Set(Level),
    /// Reconfigure the line's direction.
    SetDirection(Direction),
}

impl std::str::FromStr for LineCommand {
    type Err = Error;

    /// Parse the endpoint write vocabulary: `"0"`, `"1"`, `"in"`, `"out"`.
    /// A trailing newline is tolerated.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0" => Ok(LineCommand::Set(Level::Low)),
            "1" => Ok(LineCommand::Set(Level::High)),
            "in" => Ok(LineCommand::SetDirection(Direction::Input)),
            "out" => Ok(LineCommand::SetDirection(Direction::Output)),
            other => Err(Error::invalid_argument(format!(
                "expected \"0\", \"1\", \"in\" or \"out\", got {other:?}"
            ))),
        }
    }
}

/// Non-owning reference to an exported line.
///
/// Every operation resolves through the registry table, so a handle held
/// across an unexport keeps failing cleanly with `NotFound` and can never
/// reach freed state. Opening a handle subscribes it to the resource's
/// notifications; [`LineHandle::notified`] suspends until the next delivery
/// once an interrupt is armed on the resource.
///
/// Dropping the handle closes it.
pub struct LineHandle {
    registry: Arc<RegistryInner>,
    line: LineId,
    slot: usize,
    token: u64,
    subscriber: SubscriberId,
    notify: Arc<Notify>,
    closed: AtomicBool,
}

impl LineHandle {
    pub(crate) fn new(
        registry: Arc<RegistryInner>,
        line: LineId,
        slot: usize,
        token: u64,
        subscriber: SubscriberId,
        notify: Arc<Notify>,
    ) -> Self {
        LineHandle {
            registry,
            line,
            slot,
            token,
            subscriber,
            notify,
            closed: AtomicBool::new(false),
        }
    }

    /// The physical line this handle was opened for.
    #[must_use]
    pub fn line(&self) -> LineId {
        self.line
    }

    /// This handle's subscriber identity.
    #[must_use]
    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    /// Sample the current level. Non-blocking; always a fresh read.
    ///
    /// # Errors
    /// Returns `NotFound` if the resource has been unexported.
    pub fn read(&self) -> Result<Level> {
        Ok(self.registry.resolve(self.slot, self.token)?.read())
    }

    /// The resource's current direction.
    ///
    /// # Errors
    /// Returns `NotFound` if the resource has been unexported.
    pub fn direction(&self) -> Result<Direction> {
        Ok(self.registry.resolve(self.slot, self.token)?.direction())
    }

    /// Apply a level or direction write.
    ///
    /// # Errors
    /// - `NotFound` if the resource has been unexported.
    /// - `PermissionDenied` when writing a level while direction is input.
    pub fn write(&self, command: LineCommand) -> Result<()> {
        self.registry.resolve(self.slot, self.token)?.write(command)
    }

    /// Bind a rising-edge interrupt to the resource, owned by this handle.
    ///
    /// # Errors
    /// - `NotFound` if the resource has been unexported.
    /// - `AlreadyArmed` if an interrupt is already active.
    /// - `InterruptUnavailable` if the line cannot deliver edges.
    pub fn arm_interrupt(&self) -> Result<()> {
        let state = self.registry.resolve(self.slot, self.token)?;
        bridge::arm(&state, self.subscriber)
    }

    /// Detach the resource's interrupt.
    ///
    /// # Errors
    /// - `NotFound` if the resource has been unexported.
    /// - `NotArmed` if no interrupt is active.
    pub fn disarm_interrupt(&self) -> Result<()> {
        let state = self.registry.resolve(self.slot, self.token)?;
        bridge::disarm(&state)
    }

    /// Suspend until the next notification for this resource.
    ///
    /// Best-effort delivery: one pending permit at most, no payload. After
    /// waking, re-sample with [`read`](LineHandle::read), which also
    /// surfaces `NotFound` if the wakeup came from an unexport eviction.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Close the handle: detach an interrupt this handle armed and stop
    /// notification delivery. Idempotent; a handle whose resource is already
    /// gone closes silently.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(state) = self.registry.resolve(self.slot, self.token) {
            bridge::disarm_if_owner(&state, self.subscriber);
            state.unsubscribe(self.subscriber);
        }
    }
}

impl Drop for LineHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", LineCommand::Set(Level::Low))]
    #[case("1", LineCommand::Set(Level::High))]
    #[case("in", LineCommand::SetDirection(Direction::Input))]
    #[case("out\n", LineCommand::SetDirection(Direction::Output))]
    fn test_line_command_parse(#[case] input: &str, #[case] expected: LineCommand) {
        assert_eq!(input.parse::<LineCommand>().unwrap(), expected);
    }

    #[rstest]
    #[case("2")]
    #[case("input")]
    #[case("")]
    fn test_line_command_rejects_garbage(#[case] input: &str) {
        assert!(matches!(
            input.parse::<LineCommand>(),
            Err(Error::InvalidArgument { .. })
        ));
    }
}
