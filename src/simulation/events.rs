//! Event notifications and subscriptions
//!
//! The simulator publishes at three well-defined points: once per merge
//! (`MergeEvent`, synchronously at the moment two bodies combine), once per
//! completed tick (`TickEvent`, carrying the published snapshot), and once
//! if the loop dies (`FaultEvent`). Observers register callbacks explicitly
//! and remove them with the returned [`Subscription`] handle; there is no
//! implicit lifetime-based cleanup.
//!
//! Callbacks run synchronously on the simulation thread. A slow or
//! blocking observer stalls subsequent ticks; that is a documented
//! constraint, not an error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::simulation::states::{Body, Snapshot};

/// Fired once per completed tick.
#[derive(Debug, Clone)]
pub struct TickEvent {
    pub tick: u64,
    pub bodies: Snapshot,
}

/// Fired synchronously when two bodies combine. `a` and `b` carry the
/// source identities so observers keyed on [`crate::BodyId`] can migrate
/// per-body state to `merged`.
#[derive(Debug, Clone)]
pub struct MergeEvent {
    pub a: Body,
    pub b: Body,
    pub merged: Body,
}

/// Fired when an uncaught fault terminates the background loop. The loop
/// does not restart; the simulator transitions to `Stopped`.
#[derive(Debug, Clone)]
pub struct FaultEvent {
    pub tick: u64,
    pub message: String,
}

/// Handle returned by the `on_*` registration calls; pass it to
/// `unsubscribe` to remove the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

/// One list of subscribers for a single event type.
pub(crate) struct Dispatcher<E> {
    entries: Mutex<Vec<(u64, Callback<E>)>>,
}

impl<E> Dispatcher<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, Arc::new(callback)));
        Subscription(id)
    }

    /// Returns true if the handle belonged to this list.
    pub(crate) fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(id, _)| *id != subscription.0);
        entries.len() != before
    }

    pub(crate) fn emit(&self, event: &E) {
        // Clone the list out so a callback may subscribe or unsubscribe
        // without deadlocking on the registry lock.
        let callbacks: Vec<Callback<E>> =
            self.entries.lock().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in callbacks {
            callback(event);
        }
    }
}
