use serde_json::{Map, Value};
use std::collections::HashSet;

/// Keeps only the declared parameter names. Returns the retained map and the
/// removed keys, sorted.
pub fn retain_known_fields(
    args: Map<String, Value>,
    known: &HashSet<String>,
) -> (Map<String, Value>, Vec<String>) {
    let mut removed = Vec::new();
    let mut kept = Map::new();
    for (key, value) in args {
        if known.contains(&key) {
            kept.insert(key, value);
        } else {
            removed.push(key);
        }
    }
    removed.sort();
    (kept, removed)
}
