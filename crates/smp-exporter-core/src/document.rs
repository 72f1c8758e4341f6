//! Aggregated telemetry document returned by one batched fetch.
//!
//! The device answers `/api/swis/resources` with an array of envelopes:
//!
//! ```text
//! [
//!   {"meta": {"uri": "/unit/name"}, "result": "Lecture Hall 1"},
//!   {"meta": {"uri": "/unit/cpu_usage"}, "result": [12.5, 10.1]},
//!   ...
//! ]
//! ```
//!
//! Envelopes without `meta.uri` are identified by their position in the
//! request and get the URI filled in, so path expressions can always
//! filter on it.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("telemetry document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("telemetry document must be an array of envelopes, got {0}")]
    Shape(&'static str),
}

/// One probe's raw telemetry. Request-scoped, never shared.
#[derive(Debug, Clone)]
pub struct TelemetryDocument {
    root: Value,
}

impl TelemetryDocument {
    /// Parse a response body. `requested` is the URI list of the fetch, in
    /// request order.
    pub fn parse(bytes: &[u8], requested: &[&str]) -> Result<Self, DocumentError> {
        let root: Value = serde_json::from_slice(bytes)?;
        Self::from_value(root, requested)
    }

    pub fn from_value(mut root: Value, requested: &[&str]) -> Result<Self, DocumentError> {
        let envelopes = match &mut root {
            Value::Array(envelopes) => envelopes,
            other => return Err(DocumentError::Shape(json_type_name(other))),
        };
        for (envelope, uri) in envelopes.iter_mut().zip(requested) {
            let Value::Object(envelope) = envelope else {
                continue;
            };
            let meta = envelope
                .entry("meta")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(meta) = meta {
                meta.entry("uri")
                    .or_insert_with(|| Value::String((*uri).to_string()));
            }
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.root.as_array().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The envelope for `uri`, if the device returned one.
    pub fn envelope(&self, uri: &str) -> Option<&Value> {
        self.envelopes().find(|e| envelope_uri(e) == Some(uri))
    }

    pub fn has_envelope(&self, uri: &str) -> bool {
        self.envelope(uri).is_some()
    }

    /// The `result` payload for `uri`, singleton-unwrapped. `null` counts as
    /// missing.
    pub fn result(&self, uri: &str) -> Option<&Value> {
        let result = unwrap_singleton(self.envelope(uri)?.get("result")?);
        (!result.is_null()).then_some(result)
    }

    /// The `result` payload for `uri` as text. Numbers and booleans are
    /// rendered; arrays and objects are not text.
    pub fn result_text(&self, uri: &str) -> Option<String> {
        match self.result(uri)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn envelopes(&self) -> impl Iterator<Item = &Value> {
        self.root.as_array().into_iter().flatten()
    }
}

fn envelope_uri(envelope: &Value) -> Option<&str> {
    envelope.get("meta")?.get("uri")?.as_str()
}

/// Reduce one-element arrays to their element, repeatedly.
pub(crate) fn unwrap_singleton(mut value: &Value) -> &Value {
    while let Value::Array(items) = value {
        match items.as_slice() {
            [only] => value = only,
            _ => break,
        }
    }
    value
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
