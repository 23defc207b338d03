//! Deferred terrain reversion
//!
//! Per location: `Idle -> Scheduled -> Idle` either by firing (restore) or by
//! cancellation. All state sits behind one lock, so a firing timer and a
//! cancel for the same location resolve to exactly one outcome.

use crate::core::error::{ProtectionError, Result};
use crate::core::types::{TaskHandle, Tick};
use crate::host::{TerrainHost, TerrainSnapshot};
use crate::spatial::coord::BlockLocation;
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A scheduled restoration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReversion {
    pub handle: TaskHandle,
    pub location: BlockLocation,
    pub snapshot: TerrainSnapshot,
    pub due: Tick,
}

#[derive(Debug, Default)]
struct SchedulerState {
    now: Tick,
    next_handle: u64,
    pending: AHashMap<BlockLocation, PendingReversion>,
    queue: BTreeMap<(Tick, TaskHandle), BlockLocation>,
    placeholders: AHashSet<BlockLocation>,
}

impl SchedulerState {
    fn remove(&mut self, location: &BlockLocation) -> Option<PendingReversion> {
        let entry = self.pending.remove(location)?;
        self.queue.remove(&(entry.due, entry.handle));
        Some(entry)
    }
}

/// Tick-driven reversion queue, shareable across threads
#[derive(Debug, Clone, Default)]
pub struct ReversionScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl ReversionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current scheduler tick
    pub fn now(&self) -> Tick {
        self.lock().now
    }

    /// Restore `snapshot` at `location` after `delay` ticks
    ///
    /// Fails with `AlreadyScheduled` if a reversion is pending there; the
    /// existing entry is left untouched.
    pub fn schedule(
        &self,
        location: BlockLocation,
        snapshot: TerrainSnapshot,
        delay: Tick,
    ) -> Result<TaskHandle> {
        let mut state = self.lock();
        if state.pending.contains_key(&location) {
            return Err(ProtectionError::AlreadyScheduled(location));
        }

        state.next_handle += 1;
        let handle = TaskHandle(state.next_handle);
        let due = state.now.saturating_add(delay);
        tracing::debug!("Scheduled reversion {:?} at {} for tick {}", handle, location, due);

        state.queue.insert((due, handle), location.clone());
        state.pending.insert(
            location.clone(),
            PendingReversion {
                handle,
                location,
                snapshot,
                due,
            },
        );
        Ok(handle)
    }

    pub fn has_pending(&self, location: &BlockLocation) -> bool {
        self.lock().pending.contains_key(location)
    }

    pub fn pending(&self, location: &BlockLocation) -> Option<PendingReversion> {
        self.lock().pending.get(location).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Drop the pending reversion at `location` without restoring
    ///
    /// Returns false if nothing was pending (including when it already fired).
    pub fn cancel(&self, location: &BlockLocation) -> bool {
        let cancelled = self.lock().remove(location).is_some();
        if cancelled {
            tracing::debug!("Cancelled reversion at {}", location);
        }
        cancelled
    }

    pub fn cancel_task(&self, handle: TaskHandle) -> bool {
        let mut state = self.lock();
        let location = state
            .pending
            .values()
            .find(|p| p.handle == handle)
            .map(|p| p.location.clone());
        match location {
            Some(location) => state.remove(&location).is_some(),
            None => false,
        }
    }

    /// Advance the clock and restore every reversion now due, in due order
    ///
    /// Restoration is unconditional: whatever is at the location now is
    /// overwritten by the snapshot.
    pub fn advance(&self, ticks: Tick, terrain: &mut dyn TerrainHost) -> Vec<BlockLocation> {
        let mut state = self.lock();
        state.now = state.now.saturating_add(ticks);

        let mut fired = Vec::new();
        while let Some((&(due, handle), _)) = state.queue.first_key_value() {
            if due > state.now {
                break;
            }
            let Some(location) = state.queue.remove(&(due, handle)) else {
                break;
            };
            if let Some(entry) = state.pending.remove(&location) {
                terrain.restore(&entry.location, &entry.snapshot);
                tracing::debug!("Restored {} from reversion {:?}", entry.location, handle);
                fired.push(entry.location);
            }
        }
        fired
    }

    // === PLACEHOLDERS ===

    /// Mark a block as a temporary stand-in placed by the engine
    pub fn add_placeholder(&self, location: BlockLocation) {
        self.lock().placeholders.insert(location);
    }

    pub fn is_placeholder(&self, location: &BlockLocation) -> bool {
        self.lock().placeholders.contains(location)
    }

    pub fn remove_placeholder(&self, location: &BlockLocation) -> bool {
        self.lock().placeholders.remove(location)
    }
}
