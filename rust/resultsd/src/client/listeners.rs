use super::collections::Collection;
use super::normalize::coerce_list;
use super::ResultsClient;
use crate::store::DbPath;
use crate::subscription::Subscription;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

impl ResultsClient {
    /// Live view of a collection. `callback` gets the normalized value once
    /// right away and again after every change. An inactive handle is
    /// returned when the client is not connected or the store refused.
    pub fn listen(
        &self,
        collection: Collection,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Subscription {
        let path = match DbPath::parse(collection.path()) {
            Ok(p) => p,
            Err(_) => return Subscription::inert(),
        };
        let forward = Arc::new(move |raw: &Value| callback(&collection.normalize(raw.clone())));
        match self.guarded("watch", &path, |s| s.watch(&path, forward)) {
            Ok(sub) => {
                debug!(collection = collection.path(), id = sub.id(), "listening");
                sub
            }
            Err(e) => {
                warn!(collection = collection.path(), error = %e, "listener not registered");
                Subscription::inert()
            }
        }
    }

    pub fn listen_teachers(&self, callback: impl Fn(Vec<Value>) + Send + Sync + 'static) -> Subscription {
        self.listen_list(Collection::Teachers, callback)
    }

    pub fn listen_students(&self, callback: impl Fn(Vec<Value>) + Send + Sync + 'static) -> Subscription {
        self.listen_list(Collection::Students, callback)
    }

    pub fn listen_marks(&self, callback: impl Fn(Vec<Value>) + Send + Sync + 'static) -> Subscription {
        self.listen_list(Collection::Marks, callback)
    }

    fn listen_list(
        &self,
        collection: Collection,
        callback: impl Fn(Vec<Value>) + Send + Sync + 'static,
    ) -> Subscription {
        self.listen(collection, move |v| callback(coerce_list(v.clone())))
    }
}
