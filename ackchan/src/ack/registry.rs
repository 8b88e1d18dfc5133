//! Ack waiter registry.
//!
//! # Slot lifecycle
//!
//! ```text
//! add_waiter(id) ──► pending ──fulfill(id)────► delivered to AckWaiter
//!                       │
//!                       └──remove_waiter(id)──► discarded (timeout, send
//!                                               failure, abandoned call)
//! ```
//!
//! `fulfill` and `remove_waiter` both take the slot out of the map under the
//! lock, so at most one of them ever sees a given slot.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};

use ackchan_core::AckId;
use tokio::sync::oneshot;

type ReplySlot = oneshot::Sender<String>;

/// Correlation id allocator and reply slot map for one channel.
#[derive(Debug)]
pub struct AckRegistry {
    next_id: AtomicU64,
    waiters: Mutex<HashMap<AckId, ReplySlot>>,
}

impl AckRegistry {
    /// Create an empty registry whose first id is 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a fresh correlation id.
    ///
    /// Ids strictly increase and are never reused for the registry's
    /// lifetime, even across concurrent callers.
    pub fn next_id(&self) -> AckId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a reply slot for `id` and return its receiving half.
    ///
    /// Must happen before the request carrying `id` is queued, otherwise a
    /// fast reply could find no slot.
    pub fn add_waiter(&self, id: AckId) -> AckWaiter {
        let (tx, rx) = oneshot::channel();
        if self.lock().insert(id, tx).is_some() {
            tracing::warn!(ack_id = id, "replaced an existing ack waiter");
        }
        tracing::trace!(ack_id = id, "ack waiter registered");
        AckWaiter {
            id,
            rx,
            done: false,
        }
    }

    /// Drop the slot for `id` if present. Returns whether one was removed.
    pub fn remove_waiter(&self, id: AckId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::trace!(ack_id = id, "ack waiter removed");
        }
        removed
    }

    /// Deliver a reply payload to the waiter registered under `id`.
    ///
    /// Returns `false` without side effects when no waiter is registered,
    /// which is the case for late replies to timed-out or abandoned acks.
    pub fn fulfill(&self, id: AckId, payload: String) -> bool {
        let Some(slot) = self.lock().remove(&id) else {
            tracing::debug!(ack_id = id, "reply for unknown ack id ignored");
            return false;
        };

        match slot.send(payload) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(ack_id = id, "ack waiter dropped before reply");
                false
            }
        }
    }

    /// Whether a waiter is registered under `id`.
    pub fn contains(&self, id: AckId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of registered waiters.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AckId, ReplySlot>> {
        // Critical sections never panic while holding the map in a broken state.
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller side of a reply slot.
///
/// Resolves to `Some(payload)` once the slot is fulfilled, or `None` if the
/// slot was removed from the registry without a reply. Polling again after
/// that yields `None`.
#[derive(Debug)]
pub struct AckWaiter {
    id: AckId,
    rx: oneshot::Receiver<String>,
    done: bool,
}

impl AckWaiter {
    /// Correlation id this waiter listens on.
    pub fn id(&self) -> AckId {
        self.id
    }
}

impl Future for AckWaiter {
    type Output = Option<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.done {
            return Poll::Ready(None);
        }
        let reply = ready!(Pin::new(&mut self.rx).poll(cx)).ok();
        self.done = true;
        Poll::Ready(reply)
    }
}

/// Removes a waiter from its registry when dropped.
///
/// Held by an in-flight ack so the slot goes away on every exit path,
/// including the caller dropping the ack future.
pub(crate) struct WaiterGuard<'a> {
    registry: &'a AckRegistry,
    id: AckId,
}

impl<'a> WaiterGuard<'a> {
    pub(crate) fn new(registry: &'a AckRegistry, id: AckId) -> Self {
        Self { registry, id }
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove_waiter(self.id);
    }
}
