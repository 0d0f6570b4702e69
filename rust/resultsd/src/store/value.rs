use super::path::{is_valid_key, DbPath};
use crate::error::{StoreError, StoreResult};
use serde_json::{json, Map, Value};

const SERVER_VALUE_KEY: &str = ".sv";

/// Placeholder replaced by the store with epoch milliseconds at write time.
pub fn server_timestamp() -> Value {
    json!({ SERVER_VALUE_KEY: "timestamp" })
}

fn is_server_timestamp(obj: &Map<String, Value>) -> bool {
    obj.len() == 1
        && obj
            .get(SERVER_VALUE_KEY)
            .and_then(|v| v.as_str())
            .map(|s| s == "timestamp")
            .unwrap_or(false)
}

/// Validates keys, resolves server values and drops nulls/empties. Returns
/// `Value::Null` when nothing storable is left.
pub fn prepare_for_write(path: &DbPath, value: Value, now_ms: i64) -> StoreResult<Value> {
    match value {
        Value::Object(obj) => {
            if is_server_timestamp(&obj) {
                return Ok(Value::from(now_ms));
            }
            let mut out = Map::new();
            for (k, v) in obj {
                if !is_valid_key(&k) {
                    return Err(StoreError::InvalidKey {
                        path: path.to_string(),
                        key: k,
                    });
                }
                let child = prepare_for_write(path, v, now_ms)?;
                if !child.is_null() {
                    out.insert(k, child);
                }
            }
            if out.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Object(out))
            }
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for v in items {
                out.push(prepare_for_write(path, v, now_ms)?);
            }
            if out.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Array(out))
            }
        }
        other => Ok(other),
    }
}

/// Value at `segments` below `doc`, or null.
pub fn get_in(doc: &Value, segments: &[String]) -> Value {
    let mut cur = doc;
    for seg in segments {
        let next = match cur {
            Value::Object(obj) => obj.get(seg),
            Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(v) => cur = v,
            None => return Value::Null,
        }
    }
    cur.clone()
}

/// Writes `value` at `segments` below `doc`, creating objects on the way.
/// A non-object on the way is replaced; arrays become index-keyed objects.
/// Writing null removes the entry and prunes parents left empty.
pub fn set_in(doc: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *doc = value;
        return;
    };

    if let Value::Array(items) = doc {
        let obj: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *doc = Value::Object(obj);
    }
    if !doc.is_object() {
        if value.is_null() {
            return;
        }
        *doc = Value::Object(Map::new());
    }

    if let Value::Object(obj) = doc {
        let mut child = obj.remove(first).unwrap_or(Value::Null);
        set_in(&mut child, rest, value);
        if !is_empty_value(&child) {
            obj.insert(first.clone(), child);
        }
        if obj.is_empty() {
            *doc = Value::Null;
        }
    }
}

fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(o) => o.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}
