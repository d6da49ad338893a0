//! Presentation-key mapper.
//!
//! Storage rows carry snake_case keys; the API layer speaks camelCase. The
//! mapper is a pure, stateless rewrite applied recursively through nested
//! objects and arrays. Non-object values pass through untouched.

use serde::Serialize;
use serde_json::Value;

/// Rewrite one snake_case key to camelCase.
///
/// An underscore followed by an ASCII lowercase letter is collapsed into the
/// uppercased letter; any other underscore is kept as-is.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_lowercase() {
                    chars.next();
                    out.push(next.to_ascii_uppercase());
                    continue;
                }
            }
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

/// Rewrite every object key in a JSON value to camelCase, recursively.
pub fn camelize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (camel_case(&key), camelize(inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camelize).collect()),
        other => other,
    }
}

/// Serialize a storage-shaped value into its API representation.
pub fn to_api<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    Ok(camelize(serde_json::to_value(value)?))
}
