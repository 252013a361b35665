use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::json_util::improve_json_error;

/// Key separator between a parent object key and its child keys.
pub const SEPARATOR: char = '.';

/// A flattened JSON object: dot-joined paths mapped to leaf values.
///
/// Arrays (and empty arrays) are kept as composite values.
pub type FlatMap = Map<String, Value>;

/// Borrowed counterpart of [`FlatMap`], for expanding values without copying them.
pub type FlatRefs<'v> = BTreeMap<String, &'v Value>;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Parses `text` as a JSON object and flattens all nested objects into `parent.child` keys.
///
/// # Errors
/// Fails if the text is not well-formed JSON or if its root is not an object.
pub fn flatten_str(text: &str) -> Result<FlatMap, ParseError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ParseError::Malformed(improve_json_error(&e, text).to_string()))?;
    match value {
        Value::Object(object) => Ok(flatten_object(object)),
        other => Err(ParseError::NotAnObject(kind_name(&other))),
    }
}

/// Flattens an already parsed object.
#[must_use]
pub fn flatten_object(object: Map<String, Value>) -> FlatMap {
    let mut flat = FlatMap::new();
    flatten_into(&mut flat, None, object);
    flat
}

fn flatten_into(flat: &mut FlatMap, prefix: Option<&str>, object: Map<String, Value>) {
    for (key, value) in object {
        let path = match prefix {
            Some(prefix) => format!("{prefix}{SEPARATOR}{key}"),
            None => key,
        };
        match value {
            Value::Object(child) => flatten_into(flat, Some(&path), child),
            leaf => {
                flat.insert(path, leaf);
            }
        }
    }
}

/// Flattens `object` into `flat` by reference, prefixing every path with `prefix`.
pub fn flatten_refs<'v>(
    flat: &mut FlatRefs<'v>,
    prefix: Option<&str>,
    object: &'v Map<String, Value>,
) {
    for (key, value) in object {
        let path = match prefix {
            Some(prefix) => format!("{prefix}{SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(child) => flatten_refs(flat, Some(&path), child),
            leaf => {
                flat.insert(path, leaf);
            }
        }
    }
}

#[must_use]
pub const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
