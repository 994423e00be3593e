//! Query-string construction from flat parameter objects.

use serde::Serialize;
use serde_json::Value;

use crate::client::{ApiError, Result};

/// Flattens `params` into `(name, value)` pairs.
///
/// `params` must serialise to a JSON object (a struct or map) or to `null`.
/// `null` members are dropped, strings are used verbatim and other scalars
/// are rendered with their JSON text. Arrays repeat the parameter name.
pub fn query_pairs<Q: Serialize + ?Sized>(params: &Q) -> Result<Vec<(String, String)>> {
    let object = match serde_json::to_value(params)? {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(ApiError::InvalidUrl(format!(
                "query parameters must be an object, got {other}"
            )))
        }
    };

    let mut pairs = Vec::with_capacity(object.len());
    for (name, value) in object {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push((name.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((name, text));
                }
            }
        }
    }
    Ok(pairs)
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
