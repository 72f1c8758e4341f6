//! Model descriptor registry.
//!
//! Static [`ModelSpec`] tables are compiled once into [`ModelDescriptor`]s:
//! every path expression is parsed, metric names are checked for uniqueness
//! and every envelope a path selects must be part of the model's batched
//! request. The registry is read-only afterwards and can be shared across
//! concurrent probes without locking.

use std::collections::HashSet;

use log::{debug, warn};
use serde_json_path::JsonPath;
use thiserror::Error;

use crate::model::{Lexicon, MetricSpec, ModelKey, ModelSpec};
use crate::models::{self, TIMEZONE_OFFSET_URI, UNIT_LOCATION_URI, UNIT_NAME_URI};

/// Errors found while compiling the model tables.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry has no models")]
    Empty,

    #[error("{model}: model identity {identity:?} is already claimed by another model")]
    DuplicateIdentity {
        model: ModelKey,
        identity: &'static str,
    },

    #[error("{model}: metric {metric} is declared twice")]
    DuplicateMetric {
        model: ModelKey,
        metric: &'static str,
    },

    #[error("{model}: invalid path for {metric}: {source}")]
    InvalidPath {
        model: ModelKey,
        metric: &'static str,
        #[source]
        source: serde_json_path::ParseError,
    },

    #[error("{model}: path for {metric} does not select an envelope by meta.uri")]
    UnanchoredPath {
        model: ModelKey,
        metric: &'static str,
    },

    #[error("{model}: metric {metric} reads {uri}, which is not in the request set")]
    UnrequestedUri {
        model: ModelKey,
        metric: &'static str,
        uri: String,
    },

    #[error("{model}: required uri {uri} is not in the request set")]
    MissingRequiredUri { model: ModelKey, uri: &'static str },
}

/// A metric declaration with its compiled path.
#[derive(Debug, Clone)]
pub struct Metric {
    spec: MetricSpec,
    path: JsonPath,
    uris: Vec<&'static str>,
}

impl Metric {
    pub fn spec(&self) -> &MetricSpec {
        &self.spec
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Envelope URIs the path expression selects.
    pub fn uris(&self) -> &[&'static str] {
        &self.uris
    }
}

/// One validated, immutable appliance variant.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    key: ModelKey,
    identities: &'static [&'static str],
    uris: &'static [&'static str],
    metrics: Vec<Metric>,
}

impl ModelDescriptor {
    /// Compile and validate a static model declaration.
    pub fn compile(spec: &'static ModelSpec) -> Result<Self, RegistryError> {
        let model = spec.key;
        let requested: HashSet<&str> = spec.uris.iter().copied().collect();

        for uri in [UNIT_NAME_URI, UNIT_LOCATION_URI] {
            if !requested.contains(uri) {
                return Err(RegistryError::MissingRequiredUri { model, uri });
            }
        }
        let needs_offset = spec
            .metrics
            .iter()
            .any(|m| matches!(m.lexicon, Lexicon::Timestamp(_)));
        if needs_offset && !requested.contains(TIMEZONE_OFFSET_URI) {
            return Err(RegistryError::MissingRequiredUri {
                model,
                uri: TIMEZONE_OFFSET_URI,
            });
        }

        let mut seen = HashSet::new();
        let mut metrics = Vec::with_capacity(spec.metrics.len());
        for m in spec.metrics {
            if !seen.insert(m.name) {
                return Err(RegistryError::DuplicateMetric {
                    model,
                    metric: m.name,
                });
            }
            let path = JsonPath::parse(m.path).map_err(|source| RegistryError::InvalidPath {
                model,
                metric: m.name,
                source,
            })?;
            let uris = referenced_uris(m.path);
            if uris.is_empty() {
                return Err(RegistryError::UnanchoredPath {
                    model,
                    metric: m.name,
                });
            }
            if let Some(uri) = uris.iter().find(|u| !requested.contains(**u)) {
                return Err(RegistryError::UnrequestedUri {
                    model,
                    metric: m.name,
                    uri: uri.to_string(),
                });
            }
            metrics.push(Metric {
                spec: *m,
                path,
                uris,
            });
        }

        Ok(Self {
            key: model,
            identities: spec.identities,
            uris: spec.uris,
            metrics,
        })
    }

    pub fn key(&self) -> ModelKey {
        self.key
    }

    pub fn identities(&self) -> &'static [&'static str] {
        self.identities
    }

    /// URIs of the batched fetch, in request order.
    pub fn uris(&self) -> &'static [&'static str] {
        self.uris
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name() == name)
    }
}

/// Read-only lookup from device model name to descriptor.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// The three built-in models, SMP 300 series as the fallback.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_specs(&models::all_models())
    }

    /// Build a registry from static declarations. The first one is the
    /// fallback for unrecognized identities.
    pub fn from_specs(specs: &[&'static ModelSpec]) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut identities = HashSet::new();
        let mut models = Vec::with_capacity(specs.len());
        for &spec in specs {
            for identity in spec.identities {
                if !identities.insert(*identity) {
                    return Err(RegistryError::DuplicateIdentity {
                        model: spec.key,
                        identity: *identity,
                    });
                }
            }
            models.push(ModelDescriptor::compile(spec)?);
        }
        Ok(Self { models })
    }

    /// Descriptor for a reported model name; exact match only.
    pub fn lookup(&self, identity: &str) -> Option<&ModelDescriptor> {
        self.models
            .iter()
            .find(|m| m.identities.iter().any(|i| *i == identity))
    }

    /// Descriptor for a reported model name, falling back to the default
    /// model when the name is empty or unknown.
    pub fn resolve(&self, identity: &str) -> &ModelDescriptor {
        match self.lookup(identity) {
            Some(descriptor) => {
                debug!("model {identity:?} -> {}", descriptor.key);
                descriptor
            }
            None => {
                let fallback = self.default_descriptor();
                warn!(
                    "unrecognized model {identity:?}, using {} uris and sources",
                    fallback.key
                );
                fallback
            }
        }
    }

    pub fn get(&self, key: ModelKey) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.key == key)
    }

    pub fn default_descriptor(&self) -> &ModelDescriptor {
        // Non-empty by construction.
        &self.models[0]
    }

    pub fn descriptors(&self) -> &[ModelDescriptor] {
        &self.models
    }
}

/// URIs a path expression selects through `meta.uri == "<uri>"` filters.
pub fn referenced_uris(path: &str) -> Vec<&str> {
    const NEEDLE: &str = "meta.uri";
    let mut out = Vec::new();
    let mut rest = path;
    while let Some(pos) = rest.find(NEEDLE) {
        rest = &rest[pos + NEEDLE.len()..];
        let after_op = match rest.trim_start().strip_prefix("==") {
            Some(s) => s.trim_start(),
            None => continue,
        };
        let Some(quote) = after_op.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let literal = &after_op[1..];
        if let Some(end) = literal.find(quote) {
            out.push(&literal[..end]);
            rest = &literal[end + 1..];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Extraction, TimestampFormat};

    // -----------------------------------------------------------------------
    // Built-in tables
    // -----------------------------------------------------------------------

    #[test]
    fn test_builtin_registry_compiles() {
        let registry = ModelRegistry::builtin().unwrap();
        assert_eq!(registry.descriptors().len(), 3);
        assert_eq!(registry.default_descriptor().key(), ModelKey::Smp300);
    }

    #[test]
    fn test_builtin_paths_reference_only_requested_uris() {
        let registry = ModelRegistry::builtin().unwrap();
        for descriptor in registry.descriptors() {
            for metric in descriptor.metrics() {
                assert!(!metric.uris().is_empty(), "{} is unanchored", metric.name());
                for uri in metric.uris() {
                    assert!(
                        descriptor.uris().contains(uri),
                        "{}: {} reads {uri}, which is not requested",
                        descriptor.key(),
                        metric.name()
                    );
                }
            }
        }
    }

    #[test]
    fn test_builtin_request_sets_have_unit_identity() {
        let registry = ModelRegistry::builtin().unwrap();
        for descriptor in registry.descriptors() {
            assert!(descriptor.uris().contains(&UNIT_NAME_URI));
            assert!(descriptor.uris().contains(&UNIT_LOCATION_URI));
            assert!(descriptor.uris().contains(&TIMEZONE_OFFSET_URI));
        }
    }

    #[test]
    fn test_smp400_stream_slots_are_permuted() {
        let registry = ModelRegistry::builtin().unwrap();
        let smp400 = registry.get(ModelKey::Smp400).unwrap();
        let uris = |name: &str| smp400.metric(name).unwrap().uris().to_vec();
        assert_eq!(uris("extron_encoder_1_stream_enabled"), ["/streamer/control/2/mode"]);
        assert_eq!(uris("extron_encoder_2_stream_enabled"), ["/streamer/control/3/mode"]);
        assert_eq!(uris("extron_encoder_3_stream_enabled"), ["/streamer/control/1/mode"]);
    }

    #[test]
    fn test_schedule_metrics_are_counts() {
        let registry = ModelRegistry::builtin().unwrap();
        for descriptor in registry.descriptors() {
            for metric in descriptor.metrics() {
                let is_schedule = metric.name().starts_with("extron_schedule_state_");
                assert_eq!(
                    metric.spec().extraction == Extraction::Count,
                    is_schedule,
                    "{}",
                    metric.name()
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // resolve
    // -----------------------------------------------------------------------

    #[test]
    fn test_resolve_known_identities() {
        let registry = ModelRegistry::builtin().unwrap();
        assert_eq!(registry.resolve("SMP 401").key(), ModelKey::Smp400);
        assert_eq!(registry.resolve("SMD 101").key(), ModelKey::Smd101);
        assert_eq!(registry.resolve("SMP 352").key(), ModelKey::Smp300);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_default() {
        let registry = ModelRegistry::builtin().unwrap();
        assert_eq!(registry.resolve("").key(), ModelKey::Smp300);
        assert_eq!(registry.resolve("SMP 9000").key(), ModelKey::Smp300);
        // Exact comparison only.
        assert_eq!(registry.resolve("smp 401").key(), ModelKey::Smp300);
        assert!(registry.lookup("smp 401").is_none());
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    static DUPLICATE_METRIC: ModelSpec = ModelSpec {
        key: ModelKey::Smp300,
        identities: &[],
        uris: &["/unit/name", "/unit/location", "/unit/temp/cpu"],
        metrics: &[
            MetricSpec::value("t", "", r#"$[?@.meta.uri=="/unit/temp/cpu"].result"#),
            MetricSpec::value("t", "", r#"$[?@.meta.uri=="/unit/temp/cpu"].result"#),
        ],
    };

    static UNREQUESTED: ModelSpec = ModelSpec {
        key: ModelKey::Smp400,
        identities: &[],
        uris: &["/unit/name", "/unit/location"],
        metrics: &[MetricSpec::value(
            "t",
            "",
            r#"$[?@.meta.uri=="/unit/temp/cpu"].result"#,
        )],
    };

    static UNPARSEABLE: ModelSpec = ModelSpec {
        key: ModelKey::Smd101,
        identities: &[],
        uris: &["/unit/name", "/unit/location"],
        metrics: &[MetricSpec::value("t", "", r#"$[?@.meta.uri=="/unit/name"].result[["#)],
    };

    static UNANCHORED: ModelSpec = ModelSpec {
        key: ModelKey::Smd101,
        identities: &[],
        uris: &["/unit/name", "/unit/location"],
        metrics: &[MetricSpec::value("t", "", "$[0].result")],
    };

    static MISSING_OFFSET: ModelSpec = ModelSpec {
        key: ModelKey::Smd101,
        identities: &[],
        uris: &["/unit/name", "/unit/location", "/xtime/date"],
        metrics: &[MetricSpec::value("d", "", r#"$[?@.meta.uri=="/xtime/date"].result"#)
            .with_lexicon(Lexicon::Timestamp(TimestampFormat::HttpDate))],
    };

    static MISSING_LOCATION: ModelSpec = ModelSpec {
        key: ModelKey::Smd101,
        identities: &[],
        uris: &["/unit/name"],
        metrics: &[],
    };

    static CLAIMS_SMP401: ModelSpec = ModelSpec {
        key: ModelKey::Smd101,
        identities: &["SMP 401"],
        uris: &["/unit/name", "/unit/location"],
        metrics: &[],
    };

    #[test]
    fn test_duplicate_metric_rejected() {
        let err = ModelDescriptor::compile(&DUPLICATE_METRIC).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateMetric { metric: "t", .. }));
    }

    #[test]
    fn test_unrequested_uri_rejected() {
        let err = ModelDescriptor::compile(&UNREQUESTED).unwrap_err();
        match err {
            RegistryError::UnrequestedUri { uri, .. } => assert_eq!(uri, "/unit/temp/cpu"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparseable_path_rejected() {
        let err = ModelDescriptor::compile(&UNPARSEABLE).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath { .. }));
    }

    #[test]
    fn test_unanchored_path_rejected() {
        let err = ModelDescriptor::compile(&UNANCHORED).unwrap_err();
        assert!(matches!(err, RegistryError::UnanchoredPath { .. }));
    }

    #[test]
    fn test_timestamp_metric_requires_offset_uri() {
        let err = ModelDescriptor::compile(&MISSING_OFFSET).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingRequiredUri {
                uri: TIMEZONE_OFFSET_URI,
                ..
            }
        ));
    }

    #[test]
    fn test_unit_location_uri_required() {
        let err = ModelDescriptor::compile(&MISSING_LOCATION).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingRequiredUri {
                uri: UNIT_LOCATION_URI,
                ..
            }
        ));
    }

    #[test]
    fn test_identity_claimed_twice_rejected() {
        let err = ModelRegistry::from_specs(&[&models::smp400::SMP400, &CLAIMS_SMP401]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateIdentity {
                identity: "SMP 401",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(matches!(
            ModelRegistry::from_specs(&[]),
            Err(RegistryError::Empty)
        ));
    }

    // -----------------------------------------------------------------------
    // referenced_uris
    // -----------------------------------------------------------------------

    #[test]
    fn test_referenced_uris_compact_filter() {
        let path = r#"$[?@.meta.uri=="/schedule/schedule?format=json&field=db_id,state"].result[?@.state==0].state"#;
        assert_eq!(
            referenced_uris(path),
            ["/schedule/schedule?format=json&field=db_id,state"]
        );
    }

    #[test]
    fn test_referenced_uris_spaced_and_single_quoted() {
        assert_eq!(
            referenced_uris(r#"$[? @.meta.uri == '/unit/name'].result"#),
            ["/unit/name"]
        );
    }

    #[test]
    fn test_referenced_uris_multiple() {
        let path = r#"$[?@.meta.uri=="/a" || @.meta.uri=="/b"].result"#;
        assert_eq!(referenced_uris(path), ["/a", "/b"]);
    }

    #[test]
    fn test_referenced_uris_none() {
        assert!(referenced_uris("$[0].result").is_empty());
        assert!(referenced_uris("$[?@.meta.uri].result").is_empty());
    }
}
