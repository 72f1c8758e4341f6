//! Prometheus exposition for one probe.
//!
//! Every probe gets a fresh [`Registry`], so nothing leaks between targets.

use std::time::Duration;

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

use crate::probe::ProbeReport;

pub const UNIT_LABELS: [&str; 2] = ["unit_name", "unit_location"];

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

/// A populated per-probe registry.
pub struct ProbeExposition {
    registry: Registry,
}

impl ProbeExposition {
    /// Register `probe_success`, `probe_duration_seconds` and one gauge per
    /// reading of `report`.
    pub fn new(report: &ProbeReport, duration: Duration) -> Result<Self, EmitError> {
        let registry = Registry::new();

        let success = Gauge::new("probe_success", "Displays whether or not the probe was a success")?;
        registry.register(Box::new(success.clone()))?;
        let elapsed = Gauge::new(
            "probe_duration_seconds",
            "Returns how long the probe took to complete in seconds",
        )?;
        registry.register(Box::new(elapsed.clone()))?;

        let labels = [report.unit.name.as_str(), report.unit.location.as_str()];
        for reading in &report.readings {
            let gauge = GaugeVec::new(Opts::new(reading.name, reading.help), &UNIT_LABELS)?;
            registry.register(Box::new(gauge.clone()))?;
            gauge.get_metric_with_label_values(&labels)?.set(reading.value);
        }

        success.set(1.0);
        elapsed.set(duration.as_secs_f64());
        Ok(Self { registry })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition format.
    pub fn encode_text(&self) -> Result<String, EmitError> {
        encode_registry(&self.registry)
    }
}

/// Encode any registry in the text exposition format.
pub fn encode_registry(registry: &Registry) -> Result<String, EmitError> {
    let encoder = TextEncoder::new();
    let families = registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| EmitError::Encoding(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| EmitError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelKey;
    use crate::probe::{Reading, UnitIdentity};

    fn report(readings: Vec<Reading>) -> ProbeReport {
        ProbeReport {
            model: ModelKey::Smp300,
            unit: UnitIdentity {
                name: "SMP-Hall-1".into(),
                location: "Building A".into(),
            },
            readings,
        }
    }

    #[test]
    fn test_exposition_contains_labeled_readings() {
        let r = report(vec![
            Reading {
                name: "extron_record_state",
                help: "Recording state",
                value: 2.0,
            },
            Reading {
                name: "extron_temp_cpu",
                help: "CPU temperature",
                value: 51.5,
            },
        ]);
        let text = ProbeExposition::new(&r, Duration::from_millis(250))
            .unwrap()
            .encode_text()
            .unwrap();
        assert!(text.contains("probe_success 1"));
        assert!(text.contains("probe_duration_seconds 0.25"));
        assert!(text.contains("# HELP extron_record_state Recording state"));
        assert!(text.contains(
            r#"extron_record_state{unit_location="Building A",unit_name="SMP-Hall-1"} 2"#
        ));
        assert!(text.contains(
            r#"extron_temp_cpu{unit_location="Building A",unit_name="SMP-Hall-1"} 51.5"#
        ));
    }

    #[test]
    fn test_empty_report_still_reports_success() {
        let text = ProbeExposition::new(&report(vec![]), Duration::ZERO)
            .unwrap()
            .encode_text()
            .unwrap();
        assert!(text.contains("probe_success 1"));
        assert!(!text.contains("extron_"));
    }

    #[test]
    fn test_duplicate_reading_fails_registration() {
        let dup = Reading {
            name: "extron_temp_cpu",
            help: "CPU temperature",
            value: 1.0,
        };
        let err = ProbeExposition::new(&report(vec![dup.clone(), dup]), Duration::ZERO);
        assert!(matches!(err, Err(EmitError::Registration(_))));
    }

    #[test]
    fn test_each_probe_gets_a_fresh_registry() {
        let r = report(vec![Reading {
            name: "extron_cpu_usage",
            help: "CPU usage",
            value: 12.0,
        }]);
        let a = ProbeExposition::new(&r, Duration::ZERO).unwrap();
        let b = ProbeExposition::new(&r, Duration::ZERO).unwrap();
        assert_eq!(a.registry().gather().len(), 3);
        assert_eq!(b.registry().gather().len(), 3);
    }
}
