//! Layer merging
//!
//! Layers are folded in place into one JSON document. Tables merge key by
//! key, anything else in a later layer replaces what was there, and a null
//! overlay sets nothing.

use serde_json::Value;

/// Fold `overlay` into `base`.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(table), Value::Object(entries)) => {
            for (key, value) in entries {
                match table.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Merge layers lowest precedence first.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    merged
}
