//! Value normalization: one canonical `f64` per raw value.
//!
//! Dispatch is on the raw value's shape:
//!
//! | Raw value | Canonical reading |
//! |-----------|-------------------|
//! | string    | lexical override, else digits and `.` only, parsed; then the correction |
//! | boolean   | `true` = 1, `false` = 0 |
//! | array     | element count |
//! | object    | 1 (a single match) |
//! | number    | as-is, then the metric's [`Correction`](crate::model::Correction) |
//!
//! A present value that cannot be reduced to a finite number is an error,
//! and the probe that produced it fails as a whole.

use chrono::{DateTime, Weekday};
use thiserror::Error;

use crate::extract::RawValue;
use crate::model::{Lexicon, MetricSpec, ModelKey, TimestampFormat};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("{model}: value {raw:?} of {metric} could not be parsed to f64")]
    Unparseable {
        model: ModelKey,
        metric: &'static str,
        raw: String,
    },

    #[error("{model}: timestamp {raw:?} of {metric} does not match {pattern:?}: {source}")]
    Timestamp {
        model: ModelKey,
        metric: &'static str,
        raw: String,
        pattern: &'static str,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{model}: {metric} is a timestamp but the unit reported no timezone offset")]
    MissingTimezoneOffset {
        model: ModelKey,
        metric: &'static str,
    },

    #[error("{model}: {metric} normalized to non-finite value {value}")]
    NonFinite {
        model: ModelKey,
        metric: &'static str,
        value: f64,
    },
}

/// Per-probe context shared by all metrics.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub model: ModelKey,
    /// The unit's offset from UTC, e.g. `+01:00`.
    pub timezone_offset: Option<&'a str>,
}

impl<'a> NormalizeContext<'a> {
    pub fn new(model: ModelKey, timezone_offset: Option<&'a str>) -> Self {
        Self {
            model,
            timezone_offset,
        }
    }
}

/// Normalize one raw value. `Ok(None)` means the metric is absent.
pub fn normalize(
    spec: &MetricSpec,
    raw: &RawValue,
    ctx: &NormalizeContext<'_>,
) -> Result<Option<f64>, NormalizeError> {
    let value = match raw {
        RawValue::Absent => return Ok(None),
        RawValue::String(text) => spec.correction.apply(normalize_text(spec, text, ctx)?),
        RawValue::Boolean(true) => 1.0,
        RawValue::Boolean(false) => 0.0,
        RawValue::Array(items) => items.len() as f64,
        RawValue::Object => 1.0,
        RawValue::Number(n) => spec.correction.apply(*n),
    };
    if !value.is_finite() {
        return Err(NormalizeError::NonFinite {
            model: ctx.model,
            metric: spec.name,
            value,
        });
    }
    Ok(Some(value))
}

fn normalize_text(
    spec: &MetricSpec,
    text: &str,
    ctx: &NormalizeContext<'_>,
) -> Result<f64, NormalizeError> {
    match spec.lexicon {
        Lexicon::Digits => parse_digits(spec, text, ctx),
        Lexicon::RecordState => Ok(match text {
            "recording" => 2.0,
            "paused" => 1.0,
            "stopped" => 0.0,
            _ => -1.0,
        }),
        Lexicon::PlayState => Ok(match text {
            "playing" => 2.0,
            "paused" => 1.0,
            "stopped" => 0.0,
            _ => -1.0,
        }),
        Lexicon::ElapsedTime if text.is_empty() => Ok(0.0),
        Lexicon::ElapsedTime => parse_digits(spec, text, ctx),
        Lexicon::Timestamp(format) => parse_timestamp(spec, text, format, ctx),
    }
}

/// Keep digits and `.`, then parse.
fn parse_digits(
    spec: &MetricSpec,
    text: &str,
    ctx: &NormalizeContext<'_>,
) -> Result<f64, NormalizeError> {
    let digits: String = strip_to_number(text);
    digits.parse::<f64>().map_err(|_| NormalizeError::Unparseable {
        model: ctx.model,
        metric: spec.name,
        raw: text.to_string(),
    })
}

pub(crate) fn strip_to_number(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

fn parse_timestamp(
    spec: &MetricSpec,
    text: &str,
    format: TimestampFormat,
    ctx: &NormalizeContext<'_>,
) -> Result<f64, NormalizeError> {
    let offset = ctx
        .timezone_offset
        .ok_or(NormalizeError::MissingTimezoneOffset {
            model: ctx.model,
            metric: spec.name,
        })?;
    let text = match format {
        TimestampFormat::HttpDate => skip_weekday(spec, text.trim(), ctx)?,
        TimestampFormat::IsoLocal => text.trim(),
    };
    let joined = format!("{} {}", text, offset.trim());
    let pattern = format.dated_pattern();
    let parsed = DateTime::parse_from_str(&joined, pattern).map_err(|source| {
        NormalizeError::Timestamp {
            model: ctx.model,
            metric: spec.name,
            raw: joined.clone(),
            pattern,
            source,
        }
    })?;
    Ok(parsed.timestamp() as f64)
}

/// The weekday of an HTTP date must name a day but need not agree with the
/// date itself.
fn skip_weekday<'t>(
    spec: &MetricSpec,
    text: &'t str,
    ctx: &NormalizeContext<'_>,
) -> Result<&'t str, NormalizeError> {
    match text.split_once(',') {
        Some((day, rest)) if day.trim().parse::<Weekday>().is_ok() => Ok(rest.trim_start()),
        Some(_) => Err(NormalizeError::Unparseable {
            model: ctx.model,
            metric: spec.name,
            raw: text.to_string(),
        }),
        None => Ok(text),
    }
}
