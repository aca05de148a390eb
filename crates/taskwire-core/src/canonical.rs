use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Serializes `value` with object keys sorted at every depth and no
/// insignificant whitespace. Two structurally equal documents always
/// produce the same bytes.
pub fn canonical_json_bytes(value: &Value) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&normalize_value(value))
}

/// The lowercase-hex SHA-256 of the canonical encoding. Used as the
/// idempotency key when submitting a task.
pub fn digest_hex(value: &Value) -> serde_json::Result<String> {
    let bytes = canonical_json_bytes(value)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{digest:x}"))
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(object) => normalize_object(object),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        _ => value.clone(),
    }
}

fn normalize_object(object: &Map<String, Value>) -> Value {
    let mut ordered = BTreeMap::new();
    for (key, value) in object {
        ordered.insert(key.clone(), normalize_value(value));
    }

    let mut out = Map::new();
    for (key, value) in ordered {
        out.insert(key, value);
    }
    Value::Object(out)
}

#[cfg(test)]
#[path = "canonical_test.rs"]
mod tests;
