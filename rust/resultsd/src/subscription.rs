//! Subscription handles and a small observer registry.
//!
//! Every live callback registered with the store or the client is owned by a
//! [`Subscription`]. Dropping the handle (or calling
//! [`Subscription::unsubscribe`]) removes the callback; no callback outlives
//! its handle.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Handle to a registered callback. Unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle that owns nothing. Returned when registration was refused.
    pub(crate) fn inert() -> Self {
        Self { id: 0, cancel: None }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// False for a handle returned when registration was refused.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

pub(crate) fn next_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Fan-out of events of type `E` to registered callbacks.
pub struct ObserverSet<E> {
    observers: RwLock<Vec<(u64, Callback<E>)>>,
}

impl<E: 'static> ObserverSet<E> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            observers: RwLock::new(Vec::new()),
        })
    }

    pub fn subscribe(self: &Arc<Self>, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = next_id();
        let callback: Callback<E> = Arc::new(callback);
        self.observers.write().push((id, callback));
        let weak: Weak<Self> = Arc::downgrade(self);
        Subscription::new(id, move || {
            if let Some(set) = weak.upgrade() {
                set.remove(id);
            }
        })
    }

    /// Invokes every callback. Callbacks run outside the registry lock so they
    /// may subscribe or unsubscribe.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self
            .observers
            .read()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for cb in snapshot {
            cb(event);
        }
    }

    /// Calls only the callback registered under `id`.
    pub fn emit_to(&self, id: u64, event: &E) {
        let cb = self
            .observers
            .read()
            .iter()
            .find(|(oid, _)| *oid == id)
            .map(|(_, cb)| Arc::clone(cb));
        if let Some(cb) = cb {
            cb(event);
        }
    }

    pub fn clear(&self) {
        self.observers.write().clear();
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) {
        self.observers.write().retain(|(oid, _)| *oid != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn drop_unsubscribes() {
        let set = ObserverSet::<u32>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = set.subscribe(move |v| {
            h.fetch_add(*v as usize, Ordering::SeqCst);
        });
        set.emit(&2);
        assert_eq!(set.len(), 1);
        drop(sub);
        set.emit(&5);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(set.is_empty());
    }

    #[test]
    fn emit_to_targets_one_observer() {
        let set = ObserverSet::<u32>::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let (a2, b2) = (Arc::clone(&a), Arc::clone(&b));
        let sa = set.subscribe(move |_| {
            a2.fetch_add(1, Ordering::SeqCst);
        });
        let _sb = set.subscribe(move |_| {
            b2.fetch_add(1, Ordering::SeqCst);
        });
        set.emit_to(sa.id(), &0);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handle_outliving_registry_is_harmless() {
        let set = ObserverSet::<()>::new();
        let sub = set.subscribe(|_| {});
        drop(set);
        sub.unsubscribe();
    }
}
