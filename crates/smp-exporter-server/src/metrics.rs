//! Exporter self-metrics served on `/metrics`.
//!
//! These live for the whole process, unlike the per-probe registries built
//! by [`smp_exporter_core::ProbeExposition`].

use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use smp_exporter_core::{EmitError, encode_registry};

/// Probe outcome label values.
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UPSTREAM: &str = "upstream_error";
    pub const PARSE: &str = "parse_error";
    pub const INTERNAL: &str = "internal_error";
}

/// Model label used before the model is known.
pub const UNKNOWN_MODEL: &str = "unknown";

pub struct ExporterMetrics {
    registry: Registry,
    probes_total: IntCounterVec,
    probe_duration: HistogramVec,
}

impl ExporterMetrics {
    pub fn new() -> Result<Self, EmitError> {
        let registry = Registry::new();

        let probes_total = IntCounterVec::new(
            Opts::new("smp_exporter_probes_total", "Probes handled, by model and outcome"),
            &["model", "outcome"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration = HistogramVec::new(
            HistogramOpts::new(
                "smp_exporter_probe_duration_seconds",
                "Wall time of a probe including all device requests",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["model"],
        )?;
        registry.register(Box::new(probe_duration.clone()))?;

        Ok(Self {
            registry,
            probes_total,
            probe_duration,
        })
    }

    pub fn observe(&self, model: &str, outcome: &str, elapsed: Duration) {
        self.probes_total
            .with_label_values(&[model, outcome])
            .inc();
        self.probe_duration
            .with_label_values(&[model])
            .observe(elapsed.as_secs_f64());
    }

    pub fn encode_text(&self) -> Result<String, EmitError> {
        encode_registry(&self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_model_and_outcome() {
        let m = ExporterMetrics::new().unwrap();
        m.observe("smp400", outcome::SUCCESS, Duration::from_millis(300));
        m.observe("smp400", outcome::SUCCESS, Duration::from_millis(200));
        m.observe(UNKNOWN_MODEL, outcome::BAD_REQUEST, Duration::ZERO);

        let text = m.encode_text().unwrap();
        assert!(text.contains(r#"smp_exporter_probes_total{model="smp400",outcome="success"} 2"#));
        assert!(text.contains(
            r#"smp_exporter_probes_total{model="unknown",outcome="bad_request"} 1"#
        ));
        assert!(text.contains(r#"smp_exporter_probe_duration_seconds_count{model="smp400"} 2"#));
    }

    #[test]
    fn test_empty_registry_encodes() {
        let m = ExporterMetrics::new().unwrap();
        assert!(!m.encode_text().unwrap().contains("outcome="));
    }
}
