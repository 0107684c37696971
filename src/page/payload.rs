//! Typed accessors over a decoded JSON payload
//!
//! Page payloads are generic JSON objects. Lookups classify a key as a string,
//! null, missing or some other type, so callers can decide which of those are
//! acceptable instead of collapsing them into a single "not found".

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Outcome of looking up a string field in a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup<'a> {
    /// The key holds a string
    Str(&'a str),
    /// The key holds an explicit null
    Null,
    /// The key is not present
    Missing,
    /// The key holds a value of another type (named by the payload)
    WrongType(&'static str),
}

/// Look up `key` in `object` and classify its value
pub(crate) fn lookup_str<'a>(object: &'a Map<String, Value>, key: &str) -> Lookup<'a> {
    match object.get(key) {
        None => Lookup::Missing,
        Some(Value::Null) => Lookup::Null,
        Some(Value::String(s)) => Lookup::Str(s),
        Some(other) => Lookup::WrongType(type_name(other)),
    }
}

/// Look up a string field that must be present
///
/// # Errors
/// Returns a structural error when the key is missing or does not hold a string.
pub(crate) fn require_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    match lookup_str(object, key) {
        Lookup::Str(s) => Ok(s),
        Lookup::Missing => Err(Error::compat(format!(
            "Key '{}' does not exist in JSON object",
            key
        ))),
        Lookup::Null => Err(wrong_type(key, "null")),
        Lookup::WrongType(found) => Err(wrong_type(key, found)),
    }
}

/// Structural error for a key holding an unexpected JSON type
pub(crate) fn wrong_type(key: &str, found: &str) -> Error {
    Error::compat(format!("Can't convert '{}' (type: {}) to string", key, found))
}

/// Name of a JSON value's type, as used in error messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
