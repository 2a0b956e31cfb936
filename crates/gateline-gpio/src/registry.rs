//! Fixed-capacity registry of exported lines.
//!
//! The registry multiplexes one control surface over up to
//! [`MAX_LINES`](gateline_core::constants::MAX_LINES) physical lines. It is
//! the exclusive owner of all per-line state and interrupt wiring; consumers
//! hold non-owning [`LineHandle`]s that resolve through the table on every
//! call.
//!
//! # Concurrency
//!
//! One mutex guards the slot table and is held only for the duration of a
//! lookup or mutation, never across I/O. Per-resource operations on distinct
//! lines do not contend. Two concurrent exports of the same physical id
//! serialize on the table lock: exactly one wins, the loser observes
//! `AlreadyExported`. An unexport racing an in-flight read or write on the
//! same resource is safe: the loser resolves against a token that no longer
//! matches and observes `NotFound`.
//!
//! # Examples
//!
//! ```
//! use gateline_core::LineId;
//! use gateline_gpio::{LineRegistry, SimChip};
//!
//! let registry = LineRegistry::new(SimChip::new());
//!
//! let slot = registry.export(LineId::new(17)).unwrap();
//! let handle = registry.open(slot).unwrap();
//! let level = handle.read().unwrap();
//!
//! registry.unexport(LineId::new(17)).unwrap();
//! assert!(handle.read().is_err());
//! # let _ = level;
//! ```

use crate::bridge;
use crate::chip::SimChip;
use crate::handle::LineHandle;
use crate::line::{LineState, SubscriberId};
use gateline_core::{Error, LineId, Result, constants::MAX_LINES};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::info;

/// One occupied slot: the resource plus the export token a handle must
/// present to resolve it.
struct Slot {
    token: u64,
    state: Arc<LineState>,
}

/// The slot arena. Guarded by the registry's single table mutex.
struct Table {
    slots: [Option<Slot>; MAX_LINES],
    next_token: u64,
}

impl Table {
    fn find(&self, line: LineId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.state.id() == line))
    }
}

pub(crate) struct RegistryInner {
    chip: SimChip,
    table: Mutex<Table>,
}

impl RegistryInner {
    /// Resolve a handle's slot and token to its resource.
    ///
    /// Fails with `NotFound` once the resource has been unexported, even if
    /// the slot was since reused for a different line.
    pub(crate) fn resolve(&self, slot: usize, token: u64) -> Result<Arc<LineState>> {
        let table = self.table.lock().expect("line table poisoned");
        table
            .slots
            .get(slot)
            .and_then(|entry| entry.as_ref())
            .filter(|entry| entry.token == token)
            .map(|entry| Arc::clone(&entry.state))
            .ok_or_else(|| Error::not_found(format!("slot {slot}")))
    }
}

/// Registry of exported lines.
///
/// Cheap to clone; all clones share one table.
#[derive(Clone)]
pub struct LineRegistry {
    inner: Arc<RegistryInner>,
}

impl LineRegistry {
    /// Create a registry over `chip` with an empty table.
    #[must_use]
    pub fn new(chip: SimChip) -> Self {
        LineRegistry {
            inner: Arc::new(RegistryInner {
                chip,
                table: Mutex::new(Table {
                    slots: [const { None }; MAX_LINES],
                    next_token: 0,
                }),
            }),
        }
    }

    /// Export a physical line, making `line<id>` addressable.
    ///
    /// The new resource defaults to input direction and is immediately
    /// visible to subsequent calls. Returns the stable slot index.
    ///
    /// # Errors
    /// - `AlreadyExported` if a live resource holds this id.
    /// - `CapacityExceeded` if every slot is occupied.
    /// - `InvalidArgument` if the chip has no such pin.
    pub fn export(&self, line: LineId) -> Result<usize> {
        let mut table = self.inner.table.lock().expect("line table poisoned");

        if table.find(line).is_some() {
            return Err(Error::already_exported(line.as_u32()));
        }
        let slot = table
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| Error::capacity_exceeded(MAX_LINES))?;

        let chip_line = self.inner.chip.acquire(line)?;
        let token = table.next_token;
        table.next_token += 1;
        table.slots[slot] = Some(Slot {
            token,
            state: Arc::new(LineState::new(line, chip_line)),
        });

        info!(%line, slot, endpoint = %line.endpoint_name(), "exported line");
        Ok(slot)
    }

    /// Unexport a physical line.
    ///
    /// Forcibly disarms any interrupt, wakes and evicts every subscriber and
    /// frees the slot. Safe while consumers hold open handles: their next
    /// call observes `NotFound`.
    ///
    /// # Errors
    /// Returns `NotFound` if no live resource holds this id.
    pub fn unexport(&self, line: LineId) -> Result<()> {
        let slot = {
            let mut table = self.inner.table.lock().expect("line table poisoned");
            let index = table
                .find(line)
                .ok_or_else(|| Error::not_found(format!("line {line}")))?;
            table.slots[index].take()
        };
        // Table lock released; tear the resource down outside it.
        if let Some(slot) = slot {
            bridge::force_disarm(&slot.state);
            info!(%line, "unexported line");
        }
        Ok(())
    }

    /// Bind a consumer handle to the resource in `slot`.
    ///
    /// # Errors
    /// Returns `NotFound` if the slot is empty or out of range.
    pub fn open(&self, slot: usize) -> Result<LineHandle> {
        let table = self.inner.table.lock().expect("line table poisoned");
        let entry = table
            .slots
            .get(slot)
            .and_then(|entry| entry.as_ref())
            .ok_or_else(|| Error::not_found(format!("slot {slot}")))?;

        let subscriber = SubscriberId::new();
        let notify = Arc::new(Notify::new());
        entry.state.subscribe(subscriber, Arc::clone(&notify));

        Ok(LineHandle::new(
            Arc::clone(&self.inner),
            entry.state.id(),
            slot,
            entry.token,
            subscriber,
            notify,
        ))
    }

    /// Bind a consumer handle to the resource exported for `line`.
    ///
    /// # Errors
    /// Returns `NotFound` if the line is not exported.
    pub fn open_line(&self, line: LineId) -> Result<LineHandle> {
        let slot = self
            .find_slot(line)
            .ok_or_else(|| Error::not_found(format!("line {line}")))?;
        self.open(slot)
    }

    /// Slot index of the resource exported for `line`, if any.
    #[must_use]
    pub fn find_slot(&self, line: LineId) -> Option<usize> {
        self.inner.table.lock().expect("line table poisoned").find(line)
    }

    /// True if a live resource holds this line id.
    #[must_use]
    pub fn is_exported(&self, line: LineId) -> bool {
        self.find_slot(line).is_some()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn exported_count(&self) -> usize {
        self.inner
            .table
            .lock()
            .expect("line table poisoned")
            .slots
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    /// Unexport every live line, leaving the table empty.
    pub fn teardown(&self) {
        let drained: Vec<Slot> = {
            let mut table = self.inner.table.lock().expect("line table poisoned");
            table.slots.iter_mut().filter_map(Option::take).collect()
        };
        for slot in &drained {
            bridge::force_disarm(&slot.state);
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "registry teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateline_core::constants::MAX_LINES;

    fn registry() -> LineRegistry {
        LineRegistry::new(SimChip::with_pins(32))
    }

    #[test]
    fn test_export_then_duplicate_fails() {
        let registry = registry();
        registry.export(LineId::new(17)).unwrap();

        let second = registry.export(LineId::new(17));
        assert!(matches!(second, Err(Error::AlreadyExported { line: 17 })));
    }

    #[test]
    fn test_unexport_twice_fails() {
        let registry = registry();
        registry.export(LineId::new(17)).unwrap();
        registry.unexport(LineId::new(17)).unwrap();

        let second = registry.unexport(LineId::new(17));
        assert!(matches!(second, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_capacity_and_slot_reuse() {
        let registry = registry();
        for n in 0..MAX_LINES as u32 {
            registry.export(LineId::new(n)).unwrap();
        }
        assert!(matches!(
            registry.export(LineId::new(30)),
            Err(Error::CapacityExceeded { .. })
        ));

        registry.unexport(LineId::new(4)).unwrap();
        let slot = registry.export(LineId::new(30)).unwrap();
        assert_eq!(slot, 4);
    }

    #[test]
    fn test_export_unknown_pin() {
        let registry = registry();
        assert!(matches!(
            registry.export(LineId::new(99)),
            Err(Error::InvalidArgument { .. })
        ));
        // A failed export must not consume a slot.
        assert_eq!(registry.exported_count(), 0);
    }

    #[test]
    fn test_open_empty_slot_fails() {
        let registry = registry();
        assert!(matches!(registry.open(0), Err(Error::NotFound { .. })));
        assert!(matches!(
            registry.open(MAX_LINES + 3),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_open_line_lookup() {
        let registry = registry();
        registry.export(LineId::new(19)).unwrap();

        let handle = registry.open_line(LineId::new(19)).unwrap();
        assert_eq!(handle.line(), LineId::new(19));

        assert!(registry.open_line(LineId::new(20)).is_err());
    }

    #[test]
    fn test_teardown_empties_table() {
        let registry = registry();
        registry.export(LineId::new(1)).unwrap();
        registry.export(LineId::new(2)).unwrap();

        registry.teardown();
        assert_eq!(registry.exported_count(), 0);
        assert!(!registry.is_exported(LineId::new(1)));
    }
}
