//! Realtime data store: a JSON tree addressed by slash-separated paths.
//!
//! The client facade only talks to [`DataStore`]. [`SqliteStore`] is the
//! workspace-backed implementation shipped with the daemon.

mod path;
mod sqlite;
mod value;
mod watch;

use crate::error::StoreResult;
use crate::subscription::Subscription;
use serde_json::Value;
use std::sync::Arc;

pub use path::{is_valid_key, sanitize_key, DbPath};
pub use sqlite::SqliteStore;
pub use value::server_timestamp;

/// Callback fed with the current value at a watched path (`Null` if absent).
pub type ValueCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// The four tree primitives the facade is built on.
pub trait DataStore: Send + Sync {
    /// Overwrites the value at `path`. Writing `Null` removes it.
    fn set(&self, path: &DbPath, value: Value) -> StoreResult<()>;

    /// Reads the value at `path` once. Absent values read as `Null`.
    fn get(&self, path: &DbPath) -> StoreResult<Value>;

    /// Deletes `path` and everything below it. Absent paths are not an error.
    fn remove(&self, path: &DbPath) -> StoreResult<()>;

    /// Calls `callback` with the current value, then after every change that
    /// touches `path`, until the returned handle is dropped.
    fn watch(&self, path: &DbPath, callback: ValueCallback) -> StoreResult<Subscription>;
}
