//! Tolerant accessors over untyped upstream records.
//!
//! Sources disagree on key names and value types, so every lookup here returns `None`
//! instead of failing when a key is missing or carries something unusable.

use serde_json::{Map, Value};

/// One record exactly as an upstream source returned it.
pub type RawRecord = Map<String, Value>;

/// Read `key` as display text. Scalars are rendered as text, nested values as compact JSON.
pub fn text(record: &RawRecord, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Read `key` as an identifier: a non-blank string, kept as is, or a number coerced to a string.
pub fn identifier(record: &RawRecord, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => {
            if s.trim().is_empty() { None } else { Some(s.clone()) }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
