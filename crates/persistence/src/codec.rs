//! JSON codec for the persisted mapping.
//!
//! The whole mapping travels as one compact JSON object. Decoding never
//! fails: anything that is not a JSON object yields an empty mapping, so a
//! tampered or truncated cookie simply starts the visitor over.

use serde_json::{Map, Value};

use crate::errors::PersistenceError;

/// Ordered string-keyed mapping persisted in the cookie.
pub type PersistedMapping = Map<String, Value>;

/// Serialize the mapping to compact JSON, preserving in-memory key order.
pub fn encode(mapping: &PersistedMapping) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(mapping)?)
}

/// Parse JSON text into a mapping; malformed, empty or non-object input
/// gives an empty mapping.
pub fn decode(text: &str) -> PersistedMapping {
    try_decode(text).unwrap_or_default()
}

/// Like [`decode`] but reports why the text was rejected.
pub fn try_decode(text: &str) -> Result<PersistedMapping, serde_json::Error> {
    serde_json::from_str(text)
}
