//! Document Module
//!
//! The JSON document model.
//!
//! ## Responsibilities
//! - Decode/encode stored documents (one JSON object per file)
//! - Assign the `uuid` identifier field on first write
//! - Shallow merge of update payloads
//! - Equality predicates for filtering
//! - Validation of collection/document names
//!
//! ## Merge Semantics
//! ```text
//!   stored   {uuid: U, a: 1, b: 2}
//!   payload  {b: 3, c: 4}
//!   result   {uuid: U, a: 1, b: 3, c: 4}
//! ```
//! Only top-level keys are touched; nested objects are replaced, never merged.

mod filter;
mod name;

pub use filter::Filter;
pub use name::{validate_name, MAX_NAME_LEN};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AtlasError, Result};

/// A stored document: a JSON object keyed by field name
pub type Document = Map<String, Value>;

/// Name of the identifier field stored inside every document
pub const IDENTIFIER_FIELD: &str = "uuid";

/// Decode a stored document
///
/// Anything other than a well-formed JSON object is reported as `Corrupt`.
pub fn decode(collection: &str, name: &str, bytes: &[u8]) -> Result<Document> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AtlasError::Corrupt(format!(
            "{}/{}: stored value is not a JSON object",
            collection, name
        ))),
        Err(e) => Err(AtlasError::Corrupt(format!("{}/{}: {}", collection, name, e))),
    }
}

/// Encode a document for storage
///
/// Compact JSON followed by a newline.
pub fn encode(document: &Document) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(document)
        .map_err(|e| AtlasError::InvalidPayload(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Turn a request payload into an object, rejecting any other JSON value
pub fn into_object(payload: Value) -> Result<Document> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(AtlasError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            value_kind(&other)
        ))),
    }
}

/// Give the document an identifier if it does not have one yet
///
/// Returns true if a new identifier was generated.
pub fn ensure_identifier(document: &mut Document) -> bool {
    if document.contains_key(IDENTIFIER_FIELD) {
        return false;
    }
    document.insert(
        IDENTIFIER_FIELD.to_string(),
        Value::String(Uuid::new_v4().to_string()),
    );
    true
}

/// Shallow merge: payload keys overwrite, everything else is kept
///
/// The identifier field is never overwritten once present.
pub fn merge(document: &mut Document, payload: Document) {
    for (key, value) in payload {
        if key == IDENTIFIER_FIELD && document.contains_key(IDENTIFIER_FIELD) {
            continue;
        }
        document.insert(key, value);
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
