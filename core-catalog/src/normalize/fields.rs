//! Ordered-alias field resolution over loosely typed JSON records.
//!
//! Every helper takes a list of aliases and returns the value of the first one
//! that is present and usable. Aliases may be dotted paths into nested
//! objects (`"data.episodes"`).

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A provider record: a JSON object with unknown, unstable keys.
pub type RawRecord = Map<String, Value>;

/// Title used when no title alias is present.
pub const UNTITLED: &str = "Untitled";

/// Resolves `path` inside `record`, descending through objects on each `.`.
pub fn lookup<'a>(record: &'a RawRecord, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Text form of a scalar: trimmed non-empty strings as-is, numbers in their
/// JSON textual form. Everything else is unusable.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First alias holding a usable scalar, coerced to a string.
pub fn first_text(record: &RawRecord, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| lookup(record, alias).and_then(scalar_text))
}

/// First alias holding a non-negative count, as a number or numeric string.
pub fn first_count(record: &RawRecord, aliases: &[&str]) -> Option<u32> {
    aliases.iter().find_map(|alias| match lookup(record, alias)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// First alias holding a non-empty array.
///
/// Falls back to the first empty array when no alias carries any entries.
pub fn first_list<'a>(record: &'a RawRecord, aliases: &[&str]) -> Option<&'a [Value]> {
    let mut arrays = aliases
        .iter()
        .filter_map(|alias| lookup(record, alias)?.as_array().map(Vec::as_slice));
    let first = arrays.next()?;
    if !first.is_empty() {
        return Some(first);
    }
    arrays.find(|list| !list.is_empty()).or(Some(first))
}

/// First alias holding a list of labels.
///
/// Accepts an array of strings, an array of objects carrying a `name` or
/// `title`, or a single comma-separated string.
pub fn first_labels(record: &RawRecord, aliases: &[&str]) -> Vec<String> {
    for alias in aliases {
        let labels: Vec<String> = match lookup(record, alias) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|value| match value {
                    Value::Object(obj) => first_text(obj, &["name", "title", "tagName"]),
                    other => scalar_text(other),
                })
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect(),
            _ => continue,
        };

        if !labels.is_empty() {
            return labels;
        }
    }
    Vec::new()
}

/// Last non-empty path segment of a URL, ignoring query string and fragment.
///
/// `https://site/anime/one-piece-sub-indo/` → `one-piece-sub-indo`
pub fn last_path_segment(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = match without_query.find("://") {
        Some(idx) => {
            let after_scheme = &without_query[idx + 3..];
            after_scheme.find('/').map_or("", |slash| &after_scheme[slash..])
        }
        None => without_query,
    };

    path.split('/')
        .rev()
        .find(|segment| !segment.trim().is_empty())
        .map(|segment| segment.trim().to_string())
}

/// Deterministic identifier for a record that carries none of its own.
///
/// `serde_json` keeps object keys sorted, so equal records always serialize
/// (and therefore hash) identically.
pub fn derived_id(record: &RawRecord) -> String {
    let canonical = serde_json::to_string(record).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
    format!("h{}", hex)
}

/// Resolves a record identifier: id aliases first, then the last path segment
/// of a URL alias, then a hash of the whole record.
pub fn resolve_id(record: &RawRecord, id_aliases: &[&str], url_aliases: &[&str]) -> String {
    first_text(record, id_aliases)
        .or_else(|| {
            first_text(record, url_aliases).and_then(|url| last_path_segment(&url))
        })
        .unwrap_or_else(|| derived_id(record))
}

/// Unwraps `{ "data": { ... } }` envelopes around a single record.
///
/// The outer object is kept when it already looks like the record itself
/// (it carries one of `identity_aliases`).
pub fn unwrap_record<'a>(value: &'a Value, identity_aliases: &[&str]) -> Option<&'a RawRecord> {
    let outer = value.as_object()?;
    if identity_aliases.iter().any(|alias| outer.contains_key(*alias)) {
        return Some(outer);
    }

    ["data", "result", "detail"]
        .iter()
        .find_map(|key| outer.get(*key)?.as_object())
        .or(Some(outer))
}

/// Extracts the entries of a list payload.
///
/// Accepts a bare array or an object wrapping one under `data`, `results`,
/// `items` or `list` (one level of nesting, so `{ "data": { "list": [...] } }`
/// works too). Returns `None` for any other shape.
pub fn list_entries(payload: &Value) -> Option<&[Value]> {
    const ENVELOPE_KEYS: [&str; 4] = ["data", "results", "items", "list"];

    match payload {
        Value::Array(values) => Some(values.as_slice()),
        Value::Object(outer) => ENVELOPE_KEYS.iter().find_map(|key| match outer.get(*key)? {
            Value::Array(values) => Some(values.as_slice()),
            Value::Object(inner) => ENVELOPE_KEYS
                .iter()
                .find_map(|key| inner.get(*key)?.as_array().map(Vec::as_slice)),
            _ => None,
        }),
        _ => None,
    }
}
