//! Canonical JSON serialization for deterministic hashing
//!
//! Object keys are sorted recursively and output is compact, so two equal
//! values always serialize to the same bytes. Artifact files are written in
//! this form and their BLAKE3 digests are recorded in the manifest.

use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = canonicalize(serde_json::to_value(value)?);
    serde_json::to_string(&canonical)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, val) in entries {
                sorted.insert(key, canonicalize(val));
            }
            Value::Object(sorted)
        }
        Value::Array(elements) => Value::Array(elements.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// BLAKE3 digest of raw bytes as lowercase hex
pub fn hash_bytes_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// BLAKE3 digest of the canonical JSON form as lowercase hex
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(hash_bytes_hex(to_canonical_json(value)?.as_bytes()))
}
