//! # Status waiter registry.
//!
//! Keeps the pending [`Servd::wait_for_status`](crate::Servd::wait_for_status)
//! calls, grouped by the status they wait for. Each waiter owns a single-slot
//! [`oneshot`] channel that is completed at most once.
//!
//! ```text
//! register(Running) ──► { Running: [w1, w3], Stopped: [w2] }
//!                                   │
//! notify(Stopped) ─ drains every target <= Stopped ─► w1, w3, w2 woken with Stopped
//! ```
//!
//! ## Rules
//! - The registry is not synchronized itself; the owning service keeps it under
//!   the same lock as its status, so registration and notification never race.
//! - `notify` never blocks: a oneshot send either fills the slot or finds the
//!   receiver gone.
//! - `deregister` after the waiter was already drained is a no-op.

use std::collections::BTreeMap;

use tokio::sync::oneshot;

use crate::status::Status;

/// Handle identifying one registered waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WaiterId {
    target: Status,
    id: u64,
}

struct Waiter {
    id: u64,
    tx: oneshot::Sender<Status>,
}

/// Target status → waiters, in registration order.
#[derive(Default)]
pub(crate) struct Registry {
    next_id: u64,
    waiters: BTreeMap<Status, Vec<Waiter>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for `target` and returns its handle and wake receiver.
    pub(crate) fn register(&mut self, target: Status) -> (WaiterId, oneshot::Receiver<Status>) {
        let (tx, rx) = oneshot::channel();
        let id = self.next_id;
        self.next_id += 1;
        self.waiters.entry(target).or_default().push(Waiter { id, tx });
        (WaiterId { target, id }, rx)
    }

    /// Removes a waiter that gave up. Returns false if it was already woken.
    pub(crate) fn deregister(&mut self, waiter: WaiterId) -> bool {
        let Some(list) = self.waiters.get_mut(&waiter.target) else {
            return false;
        };
        let Some(pos) = list.iter().position(|w| w.id == waiter.id) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.waiters.remove(&waiter.target);
        }
        true
    }

    /// Wakes every waiter whose target has been reached by `status`.
    ///
    /// Returns the number of waiters drained.
    pub(crate) fn notify(&mut self, status: Status) -> usize {
        let mut woken = 0;
        self.waiters.retain(|target, list| {
            if *target > status {
                return true;
            }
            for w in list.drain(..) {
                // Receiver may be gone already; deregistration then finds nothing.
                let _ = w.tx.send(status);
                woken += 1;
            }
            false
        });
        woken
    }

    /// Number of pending waiters across all targets.
    pub(crate) fn len(&self) -> usize {
        self.waiters.values().map(Vec::len).sum()
    }
}
