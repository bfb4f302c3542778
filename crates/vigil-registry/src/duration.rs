//! Duration strings used by flags, the try endpoint, and probe records.
//!
//! Accepts Go-style strings such as `"300ms"`, `"1.5s"`, `"2m30s"`, `"1h"`,
//! `"10us"`, and `"5ns"`. Every number needs a unit; the only unitless
//! value accepted is `"0"`.

use std::time::Duration;

use thiserror::Error;

/// A duration string that could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid duration {input:?}: {reason}")]
pub struct ParseDurationError {
    input: String,
    reason: &'static str,
}

impl ParseDurationError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Unit suffixes and their length in nanoseconds, longest suffix first.
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1e3),
    ("µs", 1e3),
    ("μs", 1e3),
    ("ms", 1e6),
    ("s", 1e9),
    ("m", 60e9),
    ("h", 3600e9),
];

/// Parse a duration string like `"5s"`, `"500ms"`, or `"1m30s"`.
pub fn parse_duration(s: &str) -> Result<Duration, ParseDurationError> {
    let input = s.trim();
    if input.is_empty() {
        return Err(ParseDurationError::new(s, "empty string"));
    }
    if input.starts_with('-') {
        return Err(ParseDurationError::new(s, "negative durations are not allowed"));
    }
    let rest = input.strip_prefix('+').unwrap_or(input);

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.parse::<f64>().is_ok() {
        return Err(ParseDurationError::new(s, "missing unit"));
    }

    let mut rest = rest;
    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return Err(ParseDurationError::new(s, "expected a number"));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| ParseDurationError::new(s, "malformed number"))?;

        let (unit, scale) = UNITS
            .iter()
            .filter(|(unit, _)| tail.starts_with(unit))
            .max_by_key(|(unit, _)| unit.len())
            .ok_or_else(|| ParseDurationError::new(s, "missing or unknown unit"))?;

        total_nanos += value * scale;
        rest = &tail[unit.len()..];
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(ParseDurationError::new(s, "duration out of range"));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Render a duration for a probe record (e.g. `"12.345ms"`, `"1.2s"`).
pub fn format_duration(d: Duration) -> String {
    format!("{d:?}")
}
