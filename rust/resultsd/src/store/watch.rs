use super::path::DbPath;
use super::ValueCallback;
use crate::subscription::{next_id, Subscription};
use parking_lot::{ReentrantMutex, RwLock};
use serde_json::Value;
use std::sync::{Arc, Weak};

pub struct Watch {
    pub id: u64,
    pub path: DbPath,
    callback: ValueCallback,
    /// Serializes deliveries to this watcher. Reentrant so a callback may
    /// write to the path it watches.
    gate: ReentrantMutex<()>,
}

impl Watch {
    /// Reads the value with `read` and hands it to the callback, both under
    /// the gate. The last delivery therefore never carries an older value
    /// than an earlier one.
    pub fn deliver<E>(
        &self,
        read: impl FnOnce(&DbPath) -> Result<Value, E>,
    ) -> Result<(), E> {
        let _gate = self.gate.lock();
        let value = read(&self.path)?;
        (self.callback)(&value);
        Ok(())
    }
}

/// Path-scoped value watchers. A write at `p` concerns every watcher whose
/// path is an ancestor or descendant of `p`.
#[derive(Default)]
pub struct Watchers {
    entries: RwLock<Vec<Arc<Watch>>>,
}

impl Watchers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds the watcher before anything is delivered to it, so no write
    /// that lands after this call can be missed.
    pub fn register(
        self: &Arc<Self>,
        path: DbPath,
        callback: ValueCallback,
    ) -> (Subscription, Arc<Watch>) {
        let id = next_id();
        let watch = Arc::new(Watch {
            id,
            path,
            callback,
            gate: ReentrantMutex::new(()),
        });
        self.entries.write().push(Arc::clone(&watch));
        let weak: Weak<Self> = Arc::downgrade(self);
        let sub = Subscription::new(id, move || {
            if let Some(w) = weak.upgrade() {
                w.entries.write().retain(|e| e.id != id);
            }
        });
        (sub, watch)
    }

    /// Watchers touched by a change at `changed`, in registration order.
    pub fn affected(&self, changed: &DbPath) -> Vec<Arc<Watch>> {
        self.entries
            .read()
            .iter()
            .filter(|w| w.path.overlaps(changed))
            .cloned()
            .collect()
    }

    /// True while the watcher has not been unsubscribed.
    pub fn is_live(&self, id: u64) -> bool {
        self.entries.read().iter().any(|w| w.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
