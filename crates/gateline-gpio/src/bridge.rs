//! Interrupt/notification bridge.
//!
//! Converts a rising edge on a physical line into an asynchronous wakeup for
//! every consumer subscribed to the resource, as an out-of-band signal rather
//! than a blocking read. The design is strictly two-phase:
//!
//! - the **watcher task** (bottom half) consumes the pin's level stream and
//!   detects rising edges;
//! - the **producer phase** (top half) only stores notification permits via
//!   [`Notify::notify_one`] and never suspends.
//!
//! Delivery is best-effort and carries no payload: a fast burst of edges may
//! collapse into a single wakeup, and a woken consumer must re-sample the
//! line with `read()` to learn its state.

use crate::line::{IrqBinding, LineState, SubscriberId};
use gateline_core::{Error, Level, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace};

/// Bind a rising-edge interrupt to `state`, owned by `owner`.
///
/// # Errors
/// - `AlreadyArmed` if an interrupt is already bound to this resource.
/// - `InterruptUnavailable` if the physical line cannot deliver edges.
pub(crate) fn arm(state: &Arc<LineState>, owner: SubscriberId) -> Result<()> {
    let mut irq = state.irq.lock().expect("irq lock poisoned");
    if irq.is_some() {
        return Err(Error::already_armed(state.id().as_u32()));
    }
    if !state.chip_line().irq_capable() {
        return Err(Error::interrupt_unavailable(state.id().as_u32()));
    }

    let levels = state.chip_line().watch();
    let watcher = tokio::spawn(edge_watcher(levels, Arc::clone(state)));
    *irq = Some(IrqBinding { owner, watcher });
    debug!(line = %state.id(), "armed rising-edge interrupt");
    Ok(())
}

/// Detach the interrupt bound to `state`.
///
/// # Errors
/// Returns `NotArmed` if no interrupt is active.
pub(crate) fn disarm(state: &LineState) -> Result<()> {
    let mut irq = state.irq.lock().expect("irq lock poisoned");
    match irq.take() {
        Some(binding) => {
            binding.watcher.abort();
            debug!(line = %state.id(), "disarmed interrupt");
            Ok(())
        }
        None => Err(Error::not_armed(state.id().as_u32())),
    }
}

/// Detach the interrupt if `owner` armed it. Used by handle close.
pub(crate) fn disarm_if_owner(state: &LineState, owner: SubscriberId) {
    let mut irq = state.irq.lock().expect("irq lock poisoned");
    if irq.as_ref().is_some_and(|binding| binding.owner == owner)
        && let Some(binding) = irq.take()
    {
        binding.watcher.abort();
        debug!(line = %state.id(), "disarmed interrupt on close");
    }
}

/// Forcibly detach any interrupt and evict every subscriber.
///
/// Used on unexport and teardown; consumers blocked on a notification wake
/// and observe `NotFound` on their next registry call.
pub(crate) fn force_disarm(state: &LineState) {
    if let Some(binding) = state.irq.lock().expect("irq lock poisoned").take() {
        binding.watcher.abort();
    }
    state.evict_subscribers();
}

/// Watcher task: filter the level stream for rising edges.
///
/// Runs until disarmed (aborted) or the chip is dropped. The only action per
/// edge is the non-suspending notification fan-out; bit sampling and protocol
/// logic always run on the consumer's own task.
async fn edge_watcher(mut levels: watch::Receiver<Level>, state: Arc<LineState>) {
    let mut previous = *levels.borrow_and_update();
    while levels.changed().await.is_ok() {
        let current = *levels.borrow_and_update();
        let rising = previous == Level::Low && current == Level::High;
        previous = current;
        if rising {
            trace!(line = %state.id(), "rising edge");
            state.notify_subscribers();
        }
    }
}
