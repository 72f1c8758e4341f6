//! Probe orchestration: descriptor → fetch → extract → normalize → report.
//!
//! A probe holds no state between requests. Absent metrics are dropped
//! silently; the first value that cannot be normalized fails the probe.

use std::future::Future;

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::document::TelemetryDocument;
use crate::extract::extract;
use crate::model::ModelKey;
use crate::models::{TIMEZONE_OFFSET_URI, UNIT_LOCATION_URI, UNIT_NAME_URI};
use crate::normalize::{NormalizeContext, NormalizeError, normalize};
use crate::registry::{ModelDescriptor, ModelRegistry};

/// Where a probe's aggregated document comes from.
pub trait TelemetrySource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch all `uris` in one batched request.
    fn fetch(
        &self,
        uris: &[&'static str],
    ) -> impl Future<Output = Result<TelemetryDocument, Self::Error>> + Send;
}

#[derive(Debug, Error)]
pub enum ProbeError<E: std::error::Error + 'static> {
    #[error("telemetry fetch failed: {0}")]
    Fetch(#[source] E),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("unit did not report {0}")]
    MissingUnitIdentity(&'static str),
}

/// The device's self-reported name and location, used as labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitIdentity {
    pub name: String,
    pub location: String,
}

/// One canonical reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub name: &'static str,
    pub help: &'static str,
    pub value: f64,
}

/// Everything a successful probe hands to the emitter.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub model: ModelKey,
    pub unit: UnitIdentity,
    pub readings: Vec<Reading>,
}

impl ProbeReport {
    pub fn reading(&self, name: &str) -> Option<f64> {
        self.readings.iter().find(|r| r.name == name).map(|r| r.value)
    }
}

/// Resolve the descriptor for `identity`, fetch its URIs from `source` and
/// evaluate the document.
pub async fn run_probe<S: TelemetrySource>(
    registry: &ModelRegistry,
    identity: &str,
    source: &S,
) -> Result<ProbeReport, ProbeError<S::Error>> {
    let descriptor = registry.resolve(identity);
    info!("probing model {identity:?} with {} descriptor", descriptor.key());
    probe_descriptor(descriptor, source).await
}

/// Fetch the URIs of an already resolved descriptor and evaluate them.
pub async fn probe_descriptor<S: TelemetrySource>(
    descriptor: &ModelDescriptor,
    source: &S,
) -> Result<ProbeReport, ProbeError<S::Error>> {
    let document = source
        .fetch(descriptor.uris())
        .await
        .map_err(ProbeError::Fetch)?;
    evaluate(descriptor, &document)
}

/// Extract and normalize every metric of `descriptor` from `document`.
pub fn evaluate<E: std::error::Error + 'static>(
    descriptor: &ModelDescriptor,
    document: &TelemetryDocument,
) -> Result<ProbeReport, ProbeError<E>> {
    let unit = unit_identity(document)?;
    let offset = document.result_text(TIMEZONE_OFFSET_URI);
    debug!(
        "handling unit {:?} at {:?}, offset {:?}",
        unit.name, unit.location, offset
    );

    let ctx = NormalizeContext::new(descriptor.key(), offset.as_deref());
    let mut readings = Vec::with_capacity(descriptor.metrics().len());
    for extracted in extract(document, descriptor.metrics()) {
        let spec = extracted.metric.spec();
        match normalize(spec, &extracted.value, &ctx) {
            Ok(Some(value)) => readings.push(Reading {
                name: spec.name,
                help: spec.help,
                value,
            }),
            Ok(None) => {}
            Err(e) => {
                warn!("{e}");
                return Err(e.into());
            }
        }
    }

    debug!(
        "{} of {} metrics resolved for {}",
        readings.len(),
        descriptor.metrics().len(),
        descriptor.key()
    );
    Ok(ProbeReport {
        model: descriptor.key(),
        unit,
        readings,
    })
}

fn unit_identity<E: std::error::Error + 'static>(
    document: &TelemetryDocument,
) -> Result<UnitIdentity, ProbeError<E>> {
    let name = document
        .result_text(UNIT_NAME_URI)
        .ok_or(ProbeError::MissingUnitIdentity(UNIT_NAME_URI))?;
    let location = document
        .result_text(UNIT_LOCATION_URI)
        .ok_or(ProbeError::MissingUnitIdentity(UNIT_LOCATION_URI))?;
    Ok(UnitIdentity { name, location })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Error = ProbeError<std::io::Error>;

    fn registry() -> ModelRegistry {
        ModelRegistry::builtin().unwrap()
    }

    fn doc(value: serde_json::Value) -> TelemetryDocument {
        TelemetryDocument::from_value(value, &[]).unwrap()
    }

    #[test]
    fn test_evaluate_reads_identity_and_metrics() {
        let reg = registry();
        let d = doc(json!([
            {"meta": {"uri": "/unit/name"}, "result": "SMP-Hall-1"},
            {"meta": {"uri": "/unit/location"}, "result": "Building A"},
            {"meta": {"uri": "/unit/temp/cpu"}, "result": 55},
        ]));
        let report: ProbeReport = evaluate::<std::io::Error>(reg.resolve(""), &d).unwrap();
        assert_eq!(report.model, ModelKey::Smp300);
        assert_eq!(report.unit.name, "SMP-Hall-1");
        assert_eq!(report.unit.location, "Building A");
        assert_eq!(report.readings.len(), 1);
        assert_eq!(report.reading("extron_temp_cpu"), Some(55.0));
    }

    #[test]
    fn test_evaluate_requires_unit_name() {
        let reg = registry();
        let d = doc(json!([{"meta": {"uri": "/unit/location"}, "result": "A"}]));
        let err: Error = evaluate(reg.resolve(""), &d).unwrap_err();
        assert!(matches!(err, ProbeError::MissingUnitIdentity("/unit/name")));
    }

    #[test]
    fn test_evaluate_fails_on_unparseable_value() {
        let reg = registry();
        let d = doc(json!([
            {"meta": {"uri": "/unit/name"}, "result": "n"},
            {"meta": {"uri": "/unit/location"}, "result": "l"},
            {"meta": {"uri": "/unit/temp/cpu"}, "result": 40},
            {"meta": {"uri": "/unit/temp/internal"}, "result": "n/a"},
        ]));
        let err: Error = evaluate(reg.resolve(""), &d).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Normalize(NormalizeError::Unparseable {
                metric: "extron_temp_internal",
                ..
            })
        ));
    }

    #[test]
    fn test_date_uses_document_offset() {
        let reg = registry();
        let d = doc(json!([
            {"meta": {"uri": "/unit/name"}, "result": "n"},
            {"meta": {"uri": "/unit/location"}, "result": "l"},
            {"meta": {"uri": "/xtime/date"}, "result": "Tue, 25 Nov 2025 16:04:05"},
            {"meta": {"uri": "/xtime/timezone_offset"}, "result": "+01:00"},
        ]));
        let report = evaluate::<std::io::Error>(reg.resolve("SMP 401"), &d).unwrap();
        assert_eq!(report.reading("extron_xtime_date"), Some(1_764_083_045.0));
    }
}
