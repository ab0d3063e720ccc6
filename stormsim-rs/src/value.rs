//! Fallible accessors over dynamic appliance responses.
//!
//! The appliance answers most calls with loosely-shaped JSON. Call sites that
//! need a specific field go through these helpers so a wrong shape becomes an
//! [`Error::UnexpectedResponse`] instead of a panic. The lenient variants
//! mirror the appliance's habit of omitting zero/false fields.

use serde_json::Value;

use crate::error::{Error, Result};

/// Returns the field as a string slice, or a shape error naming the field.
pub fn require_str<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::UnexpectedResponse(format!("field {field:?} is not a string: {value}")))
}

/// Returns the value as an object's array field, or a shape error.
pub fn require_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::UnexpectedResponse(format!("{what} is not an array: {value}")))
}

/// Returns the value as an object, or a shape error.
pub fn require_object<'a>(value: &'a Value, what: &str) -> Result<&'a serde_json::Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::UnexpectedResponse(format!("{what} is not an object: {value}")))
}

/// Integer read tolerating integer, float, and numeric-string encodings.
/// Missing or non-numeric values read as zero.
pub fn i64_or_zero(value: &Value, field: &str) -> i64 {
    value.get(field).and_then(as_i64_lenient).unwrap_or(0)
}

/// Boolean read; missing or non-boolean values read as false.
pub fn bool_or_false(value: &Value, field: &str) -> bool {
    value.get(field).and_then(Value::as_bool).unwrap_or(false)
}

/// String read; missing values read as the empty string, non-strings are
/// rendered through their JSON form.
pub fn str_or_empty(value: &Value, field: &str) -> String {
    match value.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// The appliance is inconsistent about numeric encodings: run identifiers
/// arrive as integers, floats, or strings depending on the endpoint.
pub fn as_i64_lenient(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
