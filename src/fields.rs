use serde_json::{Map, Value};

use crate::{
    discord::embed::Field,
    flatten::{self, FlatMap, FlatRefs, ParseError, SEPARATOR},
    json_util::render_number,
};

/// Name of the single field used when a payload could not be parsed at all.
pub const FALLBACK_FIELD_NAME: &str = "MESSAGE";

/// Canonical positions pulled to the front of the output, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Id,
    Timestamp,
    From,
    To,
    Body,
}

impl Slot {
    const ALL: [Self; 5] = [Self::Id, Self::Timestamp, Self::From, Self::To, Self::Body];

    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Id => &["id", "data.id"],
            Self::Timestamp => &["timestamp"],
            Self::From => &["from", "data.attributes.from"],
            Self::To => &["to", "data.attributes.to"],
            Self::Body => &["body", "data.attributes.body"],
        }
    }

    fn recognize(key: &str, include_timestamp: bool) -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|slot| include_timestamp || *slot != Self::Timestamp)
            .find(|slot| slot.aliases().iter().any(|a| a.eq_ignore_ascii_case(key)))
    }
}

/// Parses, flattens and orders a JSON object payload into display fields.
///
/// # Errors
/// Fails if `raw` is not a well-formed JSON object. Nested values are expanded in place and cannot fail.
pub fn format_message(raw: &str, include_timestamp: bool) -> Result<Vec<Field>, ParseError> {
    let flat = flatten::flatten_str(raw)?;
    Ok(build_fields(&flat, include_timestamp))
}

/// Like [`format_message`], but degrades to one [`FALLBACK_FIELD_NAME`] field holding the raw text.
#[must_use]
pub fn format_or_fallback(raw: &str, include_timestamp: bool) -> Vec<Field> {
    format_message(raw, include_timestamp).unwrap_or_else(|e| {
        log::warn!("Could not format payload, forwarding it verbatim: {e}");
        vec![Field::new(FALLBACK_FIELD_NAME, raw)]
    })
}

/// Orders the keys of `flat` (canonical slots first, then the rest ascending)
/// and turns every value into one or more fields.
#[must_use]
pub fn build_fields(flat: &FlatMap, include_timestamp: bool) -> Vec<Field> {
    let refs: FlatRefs<'_> = flat.iter().map(|(key, value)| (key.clone(), value)).collect();
    build_from_refs(&refs, include_timestamp)
}

fn build_from_refs(flat: &FlatRefs<'_>, include_timestamp: bool) -> Vec<Field> {
    ordered(flat.keys().map(String::as_str), include_timestamp)
        .into_iter()
        .flat_map(|key| value_fields(key, flat[key], include_timestamp))
        .collect()
}

/// Returns the keys of `flat` in display order. Empty keys are dropped.
#[must_use]
pub fn order_keys(flat: &FlatMap, include_timestamp: bool) -> Vec<&str> {
    ordered(flat.keys().map(String::as_str), include_timestamp)
}

fn ordered<'k>(keys: impl Iterator<Item = &'k str>, include_timestamp: bool) -> Vec<&'k str> {
    let mut keys: Vec<&str> = keys.collect();
    keys.sort_unstable();

    let mut slots: [Option<&str>; Slot::ALL.len()] = [None; Slot::ALL.len()];
    for &key in &keys {
        if let Some(slot) = Slot::recognize(key, include_timestamp) {
            // Last match wins
            slots[slot as usize] = Some(key);
        }
    }

    let rest = keys
        .into_iter()
        .filter(|key| !slots.contains(&Some(*key)));

    slots
        .into_iter()
        .flatten()
        .chain(rest)
        .filter(|key| !key.is_empty())
        .collect()
}

fn value_fields(key: &str, value: &Value, include_timestamp: bool) -> Vec<Field> {
    match value {
        Value::String(string) => vec![Field::new(key, string.as_str())],
        Value::Number(number) => vec![Field::new(key, render_number(number))],
        Value::Bool(boolean) => vec![Field::new(key, boolean.to_string())],
        Value::Null => vec![Field::new(key, "null")],
        Value::Object(object) => object_fields(object, include_timestamp),
        Value::Array(items) => array_fields(key, items, include_timestamp),
    }
}

/// A nested object is flattened and ordered on its own, under its own keys.
fn object_fields(object: &Map<String, Value>, include_timestamp: bool) -> Vec<Field> {
    let mut flat = FlatRefs::new();
    flatten::flatten_refs(&mut flat, None, object);
    build_from_refs(&flat, include_timestamp)
}

/// Element `i` of array `key` is keyed `key.i`, so an array of objects expands into fields.
fn array_fields(key: &str, items: &[Value], include_timestamp: bool) -> Vec<Field> {
    let mut flat = FlatRefs::new();
    for (i, item) in items.iter().enumerate() {
        let path = format!("{key}{SEPARATOR}{i}");
        match item {
            Value::Object(object) => flatten::flatten_refs(&mut flat, Some(&path), object),
            leaf => {
                flat.insert(path, leaf);
            }
        }
    }
    build_from_refs(&flat, include_timestamp)
}
