//! Telemetry extraction: resolve every metric's path against the document.
//!
//! Extraction never fails. A path that matches nothing yields
//! [`RawValue::Absent`] and the remaining metrics are still resolved.

use log::debug;
use serde_json::Value;

use crate::document::{TelemetryDocument, unwrap_singleton};
use crate::model::Extraction;
use crate::registry::Metric;

/// A resolved value before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// The path did not match, or matched `null`.
    Absent,
    String(String),
    Boolean(bool),
    Number(f64),
    /// Several matches, or a multi-valued field. Normalized to its length.
    Array(Vec<RawValue>),
    /// A nested object. Normalized as a single match.
    Object,
}

impl RawValue {
    /// Convert a JSON value, unwrapping one-element arrays.
    pub fn from_json(value: &Value) -> Self {
        match unwrap_singleton(value) {
            Value::Null => Self::Absent,
            Value::Bool(b) => Self::Boolean(*b),
            // Without arbitrary precision every JSON number has an f64 form.
            Value::Number(n) => n.as_f64().map_or(Self::Absent, Self::Number),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(_) => Self::Object,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// One metric with its resolved raw value.
#[derive(Debug, Clone)]
pub struct Extracted<'a> {
    pub metric: &'a Metric,
    pub value: RawValue,
}

/// Resolve every metric against the document, in declaration order.
pub fn extract<'a>(document: &TelemetryDocument, metrics: &'a [Metric]) -> Vec<Extracted<'a>> {
    metrics
        .iter()
        .map(|metric| {
            let value = extract_one(document, metric);
            if value.is_absent() {
                debug!("metric {} skipped: no match", metric.name());
            }
            Extracted { metric, value }
        })
        .collect()
}

/// Resolve a single metric.
pub fn extract_one(document: &TelemetryDocument, metric: &Metric) -> RawValue {
    let nodes = metric.path().query(document.root()).all();
    match metric.spec().extraction {
        Extraction::Value => match nodes.as_slice() {
            [] => RawValue::Absent,
            [only] => RawValue::from_json(only),
            many => RawValue::Array(many.iter().map(|v| RawValue::from_json(v)).collect()),
        },
        Extraction::Count => {
            // Zero matches is a real count only if the device answered the
            // resource at all.
            if nodes.is_empty() && !metric.uris().iter().any(|u| document.has_envelope(u)) {
                RawValue::Absent
            } else {
                RawValue::Array(nodes.iter().map(|v| RawValue::from_json(v)).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetricSpec, ModelKey, ModelSpec};
    use crate::registry::ModelDescriptor;
    use serde_json::json;

    static FIXTURE: ModelSpec = ModelSpec {
        key: ModelKey::Smp300,
        identities: &[],
        uris: &[
            "/unit/name",
            "/unit/location",
            "/unit/temp/cpu",
            "/unit/cpu_usage",
            "/record/state",
            "/schedule",
            "/player/1",
        ],
        metrics: &[
            MetricSpec::value("temp", "", r#"$[?@.meta.uri=="/unit/temp/cpu"].result"#),
            MetricSpec::value("cpu", "", r#"$[?@.meta.uri=="/unit/cpu_usage"].result"#),
            MetricSpec::value("cpu0", "", r#"$[?@.meta.uri=="/unit/cpu_usage"].result[0]"#),
            MetricSpec::value("state", "", r#"$[?@.meta.uri=="/record/state"].result"#),
            MetricSpec::count(
                "upcoming",
                "",
                r#"$[?@.meta.uri=="/schedule"].result[?@.state==0].state"#,
            ),
            MetricSpec::count(
                "skipped",
                "",
                r#"$[?@.meta.uri=="/schedule"].result[?@.state==11].state"#,
            ),
            MetricSpec::value("player", "", r#"$[?@.meta.uri=="/player/1"].result"#),
        ],
    };

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor::compile(&FIXTURE).unwrap()
    }

    fn document(value: Value) -> TelemetryDocument {
        TelemetryDocument::from_value(value, &[]).unwrap()
    }

    fn value_of(extracted: &[Extracted<'_>], name: &str) -> RawValue {
        extracted
            .iter()
            .find(|e| e.metric.name() == name)
            .map(|e| e.value.clone())
            .unwrap()
    }

    #[test]
    fn test_scalar_match_is_unwrapped() {
        let d = descriptor();
        let doc = document(json!([{"meta": {"uri": "/unit/temp/cpu"}, "result": 48.5}]));
        let out = extract(&doc, d.metrics());
        assert_eq!(value_of(&out, "temp"), RawValue::Number(48.5));
    }

    #[test]
    fn test_singleton_array_is_unwrapped() {
        let d = descriptor();
        let doc = document(json!([{"meta": {"uri": "/record/state"}, "result": ["5"]}]));
        let out = extract(&doc, d.metrics());
        assert_eq!(value_of(&out, "state"), RawValue::String("5".into()));
    }

    #[test]
    fn test_multi_valued_field_kept_as_array() {
        let d = descriptor();
        let doc = document(json!([{"meta": {"uri": "/unit/cpu_usage"}, "result": [12.0, 7.5, 3.0]}]));
        let out = extract(&doc, d.metrics());
        assert_eq!(
            value_of(&out, "cpu"),
            RawValue::Array(vec![
                RawValue::Number(12.0),
                RawValue::Number(7.5),
                RawValue::Number(3.0)
            ])
        );
        assert_eq!(value_of(&out, "cpu0"), RawValue::Number(12.0));
    }

    #[test]
    fn test_missing_envelope_is_absent_and_isolated() {
        let d = descriptor();
        let doc = document(json!([{"meta": {"uri": "/unit/temp/cpu"}, "result": 40}]));
        let out = extract(&doc, d.metrics());
        assert_eq!(out.len(), d.metrics().len());
        assert_eq!(value_of(&out, "temp"), RawValue::Number(40.0));
        assert!(value_of(&out, "state").is_absent());
        assert!(value_of(&out, "cpu0").is_absent());
        assert!(value_of(&out, "upcoming").is_absent());
    }

    #[test]
    fn test_wrong_shape_is_absent() {
        let d = descriptor();
        // cpu0 indexes into an array; a scalar result has no index 0.
        let doc = document(json!([{"meta": {"uri": "/unit/cpu_usage"}, "result": 12}]));
        let out = extract(&doc, d.metrics());
        assert!(value_of(&out, "cpu0").is_absent());
        assert_eq!(value_of(&out, "cpu"), RawValue::Number(12.0));
    }

    #[test]
    fn test_count_single_match_is_not_unwrapped() {
        let d = descriptor();
        let doc = document(json!([{"meta": {"uri": "/schedule"}, "result": [
            {"db_id": 1, "state": 11},
            {"db_id": 2, "state": 0},
            {"db_id": 3, "state": 0},
        ]}]));
        let out = extract(&doc, d.metrics());
        assert_eq!(value_of(&out, "skipped"), RawValue::Array(vec![RawValue::Number(11.0)]));
        assert_eq!(
            value_of(&out, "upcoming"),
            RawValue::Array(vec![RawValue::Number(0.0), RawValue::Number(0.0)])
        );
    }

    #[test]
    fn test_count_without_matches_is_zero_when_envelope_present() {
        let d = descriptor();
        let doc = document(json!([{"meta": {"uri": "/schedule"}, "result": []}]));
        let out = extract(&doc, d.metrics());
        assert_eq!(value_of(&out, "upcoming"), RawValue::Array(vec![]));
    }

    #[test]
    fn test_object_and_boolean_values() {
        let d = descriptor();
        let doc = document(json!([
            {"meta": {"uri": "/player/1"}, "result": {"play_state": "playing"}},
            {"meta": {"uri": "/record/state"}, "result": true},
        ]));
        let out = extract(&doc, d.metrics());
        assert_eq!(value_of(&out, "player"), RawValue::Object);
        assert_eq!(value_of(&out, "state"), RawValue::Boolean(true));
    }

    #[test]
    fn test_null_is_absent() {
        assert!(RawValue::from_json(&json!(null)).is_absent());
        assert!(RawValue::from_json(&json!([null])).is_absent());
    }
}
