//! Declarative model tables: model keys, per-metric declarations and the
//! small rule enums attached to each metric.
//!
//! Every appliance variant is described by a static [`ModelSpec`]. The
//! registry compiles those declarations into [`crate::registry::ModelDescriptor`]s
//! once at startup.

use std::fmt;

use serde::Serialize;

/// Stable key of a hardware/firmware variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKey {
    /// SMP 351 / 352 streaming media processors (baseline firmware).
    Smp300,
    /// SMP 401 streaming media processor.
    Smp400,
    /// SMD 101 streaming media decoder.
    Smd101,
}

impl ModelKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smp300 => "smp300",
            Self::Smp400 => "smp400",
            Self::Smd101 => "smd101",
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the matches of a path expression become a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// A single value. One match is unwrapped; several matches are kept as
    /// an array (and end up counted).
    Value,
    /// The number of matches. Never unwrapped, so one match counts as 1.
    Count,
}

/// Calendar layout of a timestamp string, paired with the unit's
/// timezone offset before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `Tue, 25 Nov 2025 16:4:5`, as served by `/xtime/date`.
    HttpDate,
    /// `2025-11-25T16:04:53Z`, as served by the player history. The trailing
    /// `Z` is literal; the unit's own offset applies.
    IsoLocal,
}

impl TimestampFormat {
    /// chrono format string for `"<timestamp> <offset>"`.
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::HttpDate => "%a, %d %b %Y %H:%M:%S %:z",
            Self::IsoLocal => "%Y-%m-%dT%H:%M:%SZ %:z",
        }
    }

    /// The pattern actually parsed, after the weekday of an HTTP date has
    /// been dropped.
    pub fn dated_pattern(&self) -> &'static str {
        match self {
            Self::HttpDate => "%d %b %Y %H:%M:%S %:z",
            Self::IsoLocal => self.pattern(),
        }
    }
}

/// Lexical override applied to string values before digit stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lexicon {
    /// Strip everything but digits and `.` and parse.
    Digits,
    /// `recording`=2, `paused`=1, `stopped`=0, anything else -1.
    RecordState,
    /// `playing`=2, `paused`=1, `stopped`=0, anything else -1.
    PlayState,
    /// Empty string is 0, otherwise digits.
    ElapsedTime,
    /// Epoch seconds of a formatted timestamp.
    Timestamp(TimestampFormat),
}

/// Correction applied to every parsed reading so every model reports the
/// same encoding for the same metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    None,
    /// Canonical {0 = disabled, 1 = enabled}; the SMP 401 reports 2 for enabled.
    StreamEnabled,
    /// Canonical meter levels are non-positive; the SMP 401 reports positive.
    MeterLevel,
    /// Canonical paused = 1; the SMP 401 reports 3.
    RecordState,
}

impl Correction {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::None => value,
            Self::StreamEnabled if value == 2.0 => 1.0,
            Self::MeterLevel if value > 0.0 => -value,
            Self::RecordState if value == 3.0 => value - 2.0,
            _ => value,
        }
    }
}

/// Declaration of one canonical metric for one model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSpec {
    /// Canonical metric name, identical across models for the same quantity.
    pub name: &'static str,
    /// Help text exposed with the gauge.
    pub help: &'static str,
    /// JSONPath expression into the aggregated document.
    pub path: &'static str,
    pub extraction: Extraction,
    pub lexicon: Lexicon,
    pub correction: Correction,
}

impl MetricSpec {
    /// A plain single-value metric: digits lexicon, no correction.
    pub const fn value(name: &'static str, help: &'static str, path: &'static str) -> Self {
        Self {
            name,
            help,
            path,
            extraction: Extraction::Value,
            lexicon: Lexicon::Digits,
            correction: Correction::None,
        }
    }

    /// A match-count metric.
    pub const fn count(name: &'static str, help: &'static str, path: &'static str) -> Self {
        Self {
            extraction: Extraction::Count,
            ..Self::value(name, help, path)
        }
    }

    pub const fn with_lexicon(self, lexicon: Lexicon) -> Self {
        Self { lexicon, ..self }
    }

    pub const fn with_correction(self, correction: Correction) -> Self {
        Self { correction, ..self }
    }
}

/// Static declaration of one appliance variant.
#[derive(Debug)]
pub struct ModelSpec {
    pub key: ModelKey,
    /// Model names the device reports for this variant.
    pub identities: &'static [&'static str],
    /// URIs requested in the batched fetch, in request order.
    pub uris: &'static [&'static str],
    pub metrics: &'static [MetricSpec],
}
