// ABOUTME: Form encoding of a job's return value for the success ping body.
// ABOUTME: Accepts maps and sequences of key/value pairs, rejects other shapes.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("failed to serialize diagnostics: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("not a mapping or sequence of pairs: got {0}")]
    UnsupportedShape(&'static str),
}

/// Encode `value` as `application/x-www-form-urlencoded` bytes.
///
/// Maps and structs encode in insertion/declaration order; sequences of
/// `[key, value]` pairs keep their order. Strings, numbers, booleans, null
/// and sequences of anything other than pairs are rejected.
pub fn encode_diagnostics<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, DiagnosticsError> {
    let pairs = match serde_json::to_value(value)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| (k, render(&v)))
            .collect::<Vec<_>>(),
        Value::Array(items) => items
            .iter()
            .map(as_pair)
            .collect::<Option<Vec<_>>>()
            .ok_or(DiagnosticsError::UnsupportedShape("a sequence that is not all pairs"))?,
        other => return Err(DiagnosticsError::UnsupportedShape(shape_name(&other))),
    };

    let encoded = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", form_escape(k), form_escape(v)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(Bytes::from(encoded))
}

/// Like [`encode_diagnostics`], but logs and drops unencodable values.
pub fn try_encode_diagnostics<T: Serialize + ?Sized>(value: &T) -> Option<Bytes> {
    match encode_diagnostics(value) {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::warn!("Ignoring diagnostics: {}", e);
            None
        }
    }
}

fn as_pair(item: &Value) -> Option<(String, String)> {
    match item {
        Value::Array(pair) if pair.len() == 2 => Some((render(&pair[0]), render(&pair[1]))),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a map",
    }
}

// Form encoding writes spaces as `+`.
fn form_escape(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}
