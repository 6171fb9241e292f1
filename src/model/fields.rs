//! Lenient field readers for records delivered by the store.
//!
//! Replicated records are written by many client versions. A field with an
//! unexpected type is treated as missing rather than failing the record.

use serde_json::{Map, Value};

/// JavaScript-style truthiness, used for the `deleted` flag.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Non-empty string field.
pub fn string(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Integer field; floats are truncated and numeric strings parsed.
pub fn integer(fields: &Map<String, Value>, name: &str) -> Option<i64> {
    match fields.get(name)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

/// Tombstone flag.
pub fn deleted(fields: &Map<String, Value>) -> bool {
    is_truthy(fields.get("deleted"))
}
