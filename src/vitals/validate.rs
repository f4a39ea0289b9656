use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;

use super::Sample;

const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Thermal,
    Battery,
    Memory,
}

impl Metric {
    pub fn field(self) -> &'static str {
        match self {
            Metric::Thermal => "thermal_value",
            Metric::Battery => "battery_level",
            Metric::Memory => "memory_usage",
        }
    }

    pub fn bounds(self) -> RangeInclusive<i64> {
        match self {
            Metric::Thermal => 0..=3,
            Metric::Battery | Metric::Memory => 0..=100,
        }
    }

    fn rejection(self) -> &'static str {
        match self {
            Metric::Thermal => "Invalid thermal value",
            Metric::Battery => "Invalid battery level",
            Metric::Memory => "Invalid memory usage",
        }
    }
}

/// Why a submitted sample was refused. The `Display` text is the client-facing reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("{}", .0.rejection())]
    OutOfRange(Metric),
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Timestamp cannot be in the future")]
    FutureTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<&Result<T, ValidationError>> for ValidationResult {
    fn from(outcome: &Result<T, ValidationError>) -> Self {
        match outcome {
            Ok(_) => Self {
                valid: true,
                error: None,
            },
            Err(err) => Self {
                valid: false,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Accept/reject decision for a raw submission, without keeping the typed sample.
pub fn validate(candidate: &Value, now: DateTime<Utc>) -> ValidationResult {
    ValidationResult::from(&parse_sample(candidate, now))
}

/// Runs every admission check in order and promotes the raw body to a [`Sample`].
///
/// Checks short-circuit: presence, thermal range, battery range, memory range,
/// then the timestamp (parse, then not after `now`). Only the first failure is
/// reported.
pub fn parse_sample(candidate: &Value, now: DateTime<Utc>) -> Result<Sample, ValidationError> {
    let Some(body) = candidate.as_object() else {
        return Err(ValidationError::MissingFields);
    };

    let device_id = non_empty_text(body, "device_id");
    let timestamp = non_empty_text(body, "timestamp");
    let thermal = integer_field(body, Metric::Thermal);
    let battery = integer_field(body, Metric::Battery);
    let memory = integer_field(body, Metric::Memory);

    let (Some(device_id), Some(timestamp)) = (device_id, timestamp) else {
        return Err(ValidationError::MissingFields);
    };
    if [&thermal, &battery, &memory]
        .iter()
        .any(|field| matches!(field, RawInteger::Missing))
    {
        return Err(ValidationError::MissingFields);
    }

    let thermal_value = within_bounds(Metric::Thermal, thermal)?;
    let battery_level = within_bounds(Metric::Battery, battery)?;
    let memory_usage = within_bounds(Metric::Memory, memory)?;

    let timestamp = parse_timestamp(timestamp).ok_or(ValidationError::InvalidTimestamp)?;
    if timestamp > now {
        return Err(ValidationError::FutureTimestamp);
    }

    Ok(Sample {
        device_id: device_id.to_string(),
        timestamp,
        thermal_value,
        battery_level,
        memory_usage,
    })
}

/// Parses an ISO-8601 instant. Values without an offset are read as UTC.
///
/// Only four-digit years are admitted; stored text must sort chronologically.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    parse_iso8601(raw.trim()).filter(|ts| (0..=9999).contains(&ts.year()))
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

enum RawInteger {
    Missing,
    Integer(i64),
    Malformed,
}

fn non_empty_text<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn integer_field(body: &Map<String, Value>, metric: Metric) -> RawInteger {
    match body.get(metric.field()) {
        None | Some(Value::Null) => RawInteger::Missing,
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.is_finite() && value.fract() == 0.0)
                    .map(|value| value as i64)
            })
            .map_or(RawInteger::Malformed, RawInteger::Integer),
        Some(_) => RawInteger::Malformed,
    }
}

fn within_bounds(metric: Metric, raw: RawInteger) -> Result<u8, ValidationError> {
    match raw {
        RawInteger::Integer(value) if metric.bounds().contains(&value) => {
            u8::try_from(value).map_err(|_| ValidationError::OutOfRange(metric))
        }
        _ => Err(ValidationError::OutOfRange(metric)),
    }
}
