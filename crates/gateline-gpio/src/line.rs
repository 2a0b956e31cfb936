//! Per-resource state owned by the registry.

use crate::chip::SimLine;
use crate::handle::LineCommand;
use gateline_core::{Direction, Error, Level, LineId, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Identity of one consumer holding an open handle on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub(crate) fn new() -> Self {
        SubscriberId(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An armed edge interrupt: the watcher task and the handle that armed it.
pub(crate) struct IrqBinding {
    pub(crate) owner: SubscriberId,
    pub(crate) watcher: JoinHandle<()>,
}

/// One exported line's state.
///
/// Owned exclusively by the registry; handles reach it through a short table
/// lookup per call and never hold it across an unexport. All interior locks
/// guard in-memory state only and are never held across I/O or an await.
pub(crate) struct LineState {
    id: LineId,
    line: SimLine,
    direction: RwLock<Direction>,
    pub(crate) irq: Mutex<Option<IrqBinding>>,
    pub(crate) subscribers: Mutex<HashMap<SubscriberId, Arc<Notify>>>,
}

impl LineState {
    /// Wrap a freshly acquired chip line. Direction defaults to input.
    pub(crate) fn new(id: LineId, line: SimLine) -> Self {
        LineState {
            id,
            line,
            direction: RwLock::new(Direction::Input),
            irq: Mutex::new(None),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn id(&self) -> LineId {
        self.id
    }

    pub(crate) fn chip_line(&self) -> &SimLine {
        &self.line
    }

    /// Sample the current level. Non-blocking, always fresh.
    pub(crate) fn read(&self) -> Level {
        self.line.get()
    }

    pub(crate) fn direction(&self) -> Direction {
        *self.direction.read().expect("direction lock poisoned")
    }

    /// Apply a level or direction write.
    ///
    /// Writing a level while the direction is input fails with
    /// `PermissionDenied`. Switching to output drives the line low first.
    pub(crate) fn write(&self, command: LineCommand) -> Result<()> {
        match command {
            LineCommand::Set(level) => {
                if self.direction() == Direction::Input {
                    return Err(Error::permission_denied(format!(
                        "line {} is an input",
                        self.id
                    )));
                }
                self.line.set(level);
                Ok(())
            }
            LineCommand::SetDirection(direction) => {
                let mut current = self.direction.write().expect("direction lock poisoned");
                if *current == Direction::Input && direction == Direction::Output {
                    self.line.set(Level::Low);
                }
                *current = direction;
                Ok(())
            }
        }
    }

    /// Register a consumer's wakeup target.
    pub(crate) fn subscribe(&self, id: SubscriberId, notify: Arc<Notify>) {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .insert(id, notify);
    }

    /// Remove a consumer's wakeup target. Idempotent.
    pub(crate) fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .remove(&id);
    }

    /// Deliver one best-effort wakeup to every subscriber.
    ///
    /// Producer phase of the bridge: stores a single permit per subscriber,
    /// so a burst of edges collapses to one wakeup. Never suspends.
    pub(crate) fn notify_subscribers(&self) {
        let subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        for notify in subscribers.values() {
            notify.notify_one();
        }
    }

    /// Wake every subscriber without a permit and drop the subscriber set.
    ///
    /// Used on unexport/teardown so consumers blocked on a notification
    /// re-check the registry and observe `NotFound`.
    pub(crate) fn evict_subscribers(&self) {
        let mut subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        for notify in subscribers.values() {
            notify.notify_waiters();
        }
        subscribers.clear();
    }
}
