use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Orders keys the way the tree lists children: integer-like keys first,
/// numerically, then the rest lexicographically.
fn key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// List-shaped read: arrays pass through without holes, objects become the
/// list of their values in key order, anything else is empty.
pub fn coerce_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
        Value::Object(obj) => {
            let mut entries: Vec<(String, Value)> = obj.into_iter().collect();
            entries.sort_by(|a, b| key_order(&a.0, &b.0));
            entries.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    }
}

/// Mapping-shaped read: objects pass through, arrays become index-keyed maps,
/// anything else is empty.
pub fn coerce_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(obj) => obj,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    }
}
