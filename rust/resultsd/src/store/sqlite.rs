use super::path::DbPath;
use super::value::{get_in, prepare_for_write, set_in};
use super::watch::Watchers;
use super::{DataStore, ValueCallback};
use crate::db;
use crate::error::{StoreError, StoreResult};
use crate::subscription::Subscription;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Tree store persisted in the workspace database, one row per top-level key.
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
    watchers: Arc<Watchers>,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self::from_connection(db::open_db(workspace)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::from_connection(db::open_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            watchers: Watchers::new(),
        }
    }

    /// Closes the connection. Every later call fails with
    /// [`StoreError::Closed`].
    pub fn close(&self) {
        if self.conn.lock().take().is_some() {
            debug!("tree store closed");
        }
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        f(conn)
    }

    fn write(&self, path: &DbPath, value: Value) -> StoreResult<()> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let value = prepare_for_write(path, value, now_ms)?;

        self.with_conn(|conn| {
            let Some(head) = path.head() else {
                return replace_root(conn, value);
            };
            let mut doc = read_row(conn, head)?;
            set_in(&mut doc, path.tail(), value);
            write_row(conn, head, &doc)
        })?;
        trace!(path = %path, "tree write committed");

        self.notify(path);
        Ok(())
    }

    fn notify(&self, changed: &DbPath) {
        for watch in self.watchers.affected(changed) {
            // An earlier callback in this batch may have unsubscribed it.
            if !self.watchers.is_live(watch.id) {
                continue;
            }
            if let Err(e) = watch.deliver(|path| self.get(path)) {
                debug!(path = %watch.path, error = %e, "watcher refresh failed");
            }
        }
    }
}

fn read_row(conn: &Connection, key: &str) -> StoreResult<Value> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM tree_nodes WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(serde_json::from_str(&s)?),
        None => Ok(Value::Null),
    }
}

fn write_row(conn: &Connection, key: &str, doc: &Value) -> StoreResult<()> {
    if doc.is_null() {
        conn.execute("DELETE FROM tree_nodes WHERE key = ?", [key])?;
        return Ok(());
    }
    let json = serde_json::to_string(doc)?;
    conn.execute(
        "INSERT INTO tree_nodes(key, value_json, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value_json = excluded.value_json,
           updated_at = excluded.updated_at",
        (key, &json, chrono::Utc::now().to_rfc3339()),
    )?;
    Ok(())
}

fn read_root(conn: &Connection) -> StoreResult<Value> {
    let mut stmt = conn.prepare("SELECT key, value_json FROM tree_nodes ORDER BY key")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Ok(Value::Null);
    }
    let mut root = Map::new();
    for (key, raw) in rows {
        root.insert(key, serde_json::from_str(&raw)?);
    }
    Ok(Value::Object(root))
}

fn replace_root(conn: &Connection, value: Value) -> StoreResult<()> {
    let entries = match value {
        Value::Null => Map::new(),
        Value::Object(obj) => obj,
        other => {
            return Err(StoreError::InvalidPath {
                path: String::new(),
                reason: format!("root must be an object, got {}", kind(&other)),
            })
        }
    };
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM tree_nodes", [])?;
    for (key, doc) in &entries {
        write_row(&tx, key, doc)?;
    }
    tx.commit()?;
    Ok(())
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl DataStore for SqliteStore {
    fn set(&self, path: &DbPath, value: Value) -> StoreResult<()> {
        debug!(path = %path, "set");
        self.write(path, value)
    }

    fn get(&self, path: &DbPath) -> StoreResult<Value> {
        self.with_conn(|conn| match path.head() {
            None => read_root(conn),
            Some(head) => Ok(get_in(&read_row(conn, head)?, path.tail())),
        })
    }

    fn remove(&self, path: &DbPath) -> StoreResult<()> {
        debug!(path = %path, "remove");
        self.write(path, Value::Null)
    }

    fn watch(&self, path: &DbPath, callback: ValueCallback) -> StoreResult<Subscription> {
        let (sub, watch) = self.watchers.register(path.clone(), callback);
        debug!(path = %path, id = sub.id(), "watch registered");
        // On failure `sub` is dropped here, which unregisters the watcher.
        watch.deliver(|path| self.get(path))?;
        Ok(sub)
    }
}
