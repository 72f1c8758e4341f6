//! Static per-model tables for the three supported appliance variants.
//!
//! Path expressions select an envelope by its `meta.uri` and project into
//! its `result`. The unit identity and timezone URIs are requested by every
//! model but are read directly by the probe, not through a metric.

pub mod smd101;
pub mod smp300;
pub mod smp400;

use crate::model::ModelSpec;

/// Unit name, used as the `unit_name` label.
pub const UNIT_NAME_URI: &str = "/unit/name";
/// Unit location, used as the `unit_location` label.
pub const UNIT_LOCATION_URI: &str = "/unit/location";
/// Offset string paired with timestamp metrics, e.g. `+01:00`.
pub const TIMEZONE_OFFSET_URI: &str = "/xtime/timezone_offset";

/// Every built-in model. The first entry is the fallback for unknown devices.
pub fn all_models() -> [&'static ModelSpec; 3] {
    [&smp300::SMP300, &smp400::SMP400, &smd101::SMD101]
}
