//! Value utilities shared by the rule types.
//!
//! This module provides the pure helpers the rules are built from: the
//! dot-path resolver, the truthiness classifier, key normalization, and
//! numeric-aware JSON equality.

use serde_json::Value;

/// Retrieve a nested value from a JSON document using a dot-separated path.
///
/// Objects are traversed by string key and arrays by base-10 integer index;
/// negative indices count from the end of the array. Empty path segments
/// (as in `"a..b"`) are ignored. Any shape mismatch, missing key,
/// out-of-range index, or non-integer segment against an array resolves to
/// `None` — callers decide what the default is.
///
/// # Examples
///
/// ```
/// use policyeval::value::deep_get;
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": [10, 20, 30]}});
/// assert_eq!(deep_get(&doc, "a.b.-1"), Some(&json!(30)));
/// assert_eq!(deep_get(&doc, "a.x"), None);
/// ```
pub fn deep_get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for part in path.split('.').filter(|p| !p.is_empty()) {
        cur = match cur {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => {
                let index: i64 = part.parse().ok()?;
                let len = items.len() as i64;
                let index = if index < 0 { index + len } else { index };
                if index < 0 || index >= len {
                    return None;
                }
                &items[index as usize]
            }
            _ => return None,
        };
    }
    Some(cur)
}

/// Normalize a string key for consistent lookup: trim surrounding
/// whitespace, lowercase, and replace hyphens with underscores, so that
/// `"User-Role"` and `"user_role"` address the same slot.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('-', "_")
}

/// Determine whether a JSON value is truthy.
///
/// `Null` is false; booleans are themselves; numbers are false iff
/// numerically zero; strings are false iff, trimmed and lowercased, they are
/// one of `""`, `"0"`, `"false"`, `"no"`, `"off"`; arrays and objects are
/// always true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        ),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JSON equality with numeric awareness: `1` and `1.0` compare equal, also
/// inside arrays and objects. Everything else falls back to structural
/// equality.
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Short human-readable label for a JSON value's type, used in error
/// messages.
pub(crate) fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
