//! Observer registration for activation state changes.
//!
//! Callbacks are stored in a shared list and invoked with a snapshot after
//! every transition. A [`Subscription`] removes its callback when dropped or
//! explicitly unsubscribed.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::activation::ActiveLocaleState;

type Callback = Arc<dyn Fn(&ActiveLocaleState) + Send + Sync>;

#[derive(Default)]
struct Entries {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

#[derive(Default)]
pub(crate) struct ObserverList {
    entries: Mutex<Entries>,
}

impl ObserverList {
    pub(crate) fn subscribe(self: &Arc<Self>, callback: Callback) -> Subscription {
        let mut entries = self.lock();
        let id = entries.next_id;
        entries.next_id = entries.next_id.wrapping_add(1);
        entries.callbacks.push((id, callback));
        Subscription {
            list: Arc::downgrade(self),
            id,
        }
    }

    /// Invoke every callback with `state`.
    ///
    /// Callbacks run after the list lock is released so they may subscribe,
    /// unsubscribe, or read controller state.
    pub(crate) fn notify(&self, state: &ActiveLocaleState) {
        let callbacks: Vec<Callback> = self
            .lock()
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(state);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().callbacks.len()
    }

    fn remove(&self, id: u64) {
        self.lock().callbacks.retain(|(entry, _)| *entry != id);
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Handle keeping a state-change callback registered.
///
/// Dropping the handle unsubscribes the callback.
#[must_use = "dropping a Subscription unsubscribes its callback immediately"]
pub struct Subscription {
    list: Weak<ObserverList>,
    id: u64,
}

impl Subscription {
    /// Remove the callback now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.remove(self.id);
        }
    }
}
