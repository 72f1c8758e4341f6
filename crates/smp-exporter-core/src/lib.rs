//! # smp-exporter-core
//!
//! Model-aware telemetry extraction and normalization for Extron SMP 300,
//! SMP 401 and SMD 101 streaming appliances.
//!
//! ## Quick Start
//!
//! ```no_run
//! use smp_exporter_core::{ModelRegistry, TelemetryDocument, evaluate};
//!
//! let registry = ModelRegistry::builtin().unwrap();
//! let descriptor = registry.resolve("SMP 401");
//! let body = br#"[{"meta":{"uri":"/unit/name"},"result":"Hall 1"},
//!                 {"meta":{"uri":"/unit/location"},"result":"Building A"}]"#;
//! let document = TelemetryDocument::parse(body, descriptor.uris()).unwrap();
//! let report = evaluate::<std::io::Error>(descriptor, &document).unwrap();
//! println!("{} readings from {}", report.readings.len(), report.unit.name);
//! ```
//!
//! ## Architecture
//!
//! Registry → Fetch (one batched request) → Extract → Normalize → Emit
//!
//! Each supported model is a static table of metric rules (see [`models`]).
//! The [`ModelRegistry`] compiles every table at startup and rejects
//! inconsistent ones, so a probe only ever runs against validated paths.
//! Fetching sits behind the [`TelemetrySource`] trait; the HTTP client lives
//! in the server crate.

pub mod document;
pub mod emit;
pub mod extract;
pub mod model;
pub mod models;
pub mod normalize;
pub mod probe;
pub mod registry;

pub use document::{DocumentError, TelemetryDocument};
pub use emit::{EmitError, ProbeExposition, UNIT_LABELS, encode_registry};
pub use extract::{Extracted, RawValue, extract, extract_one};
pub use model::{
    Correction, Extraction, Lexicon, MetricSpec, ModelKey, ModelSpec, TimestampFormat,
};
pub use normalize::{NormalizeContext, NormalizeError, normalize};
pub use probe::{
    ProbeError, ProbeReport, Reading, TelemetrySource, UnitIdentity, evaluate, probe_descriptor,
    run_probe,
};
pub use registry::{Metric, ModelDescriptor, ModelRegistry, RegistryError};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
