//! Merge-variable normalization and resolution
//!
//! SES template data substitutes strings; anything else in a merge-variable
//! tree risks rendering literally or corrupting the template. [`normalize`]
//! coerces an arbitrary JSON value into a string-leaved tree of the same
//! shape, and [`resolve_merge_vars`] produces the serialized template data
//! for one send.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Recursively coerce a value into a template-safe shape.
///
/// `null` and `false` become the empty string; maps and arrays keep their
/// keys, order, and length with every leaf normalized; all other scalars
/// become their string representation (`true` included — only the falsy
/// values map to `""`). Total over any input depth; cyclic structures cannot
/// occur in `serde_json::Value`.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Null | Value::Bool(false) => Value::String(String::new()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), normalize(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::String(s) => Value::String(s.clone()),
        Value::Bool(true) => Value::String("true".to_string()),
        Value::Number(n) => Value::String(n.to_string()),
    }
}

/// Produce the serialized template data for one send.
///
/// Explicitly supplied merge vars win, even an empty map — presence is
/// presence. With no explicit vars, the mailer's bound fields are harvested
/// instead, with any leading `@` marker stripped from field names.
pub fn resolve_merge_vars(explicit: Option<&Value>, fields: &BTreeMap<String, Value>) -> String {
    let vars = match explicit {
        Some(value) => normalize(value),
        None => {
            let map: Map<String, Value> = fields
                .iter()
                .map(|(name, value)| (name.trim_start_matches('@').to_string(), normalize(value)))
                .collect();
            Value::Object(map)
        }
    };
    vars.to_string()
}
