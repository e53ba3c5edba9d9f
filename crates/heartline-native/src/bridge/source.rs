//! Recorded sample streams
//!
//! Parses line-oriented recordings into [`Sample`]s for replay. Supported
//! line formats:
//!
//! - `value`: timestamp assigned from the sampling period
//! - `timestamp_ms,value`
//! - JSON `{"ecg_value": 2048, "timestamp_ms": 120}` where `ecg_value` may be
//!   a number or a decimal string and `timestamp_ms` is optional
//!
//! Blank lines and lines starting with `#` are skipped. Range validation is
//! left to the engine so out-of-range readings surface as rejections.

use std::io::BufRead;

use serde::Deserialize;
use thiserror::Error;

use heartline_core::error::SampleError;
use heartline_core::math;
use heartline_core::types::Sample;

/// Errors while reading a recorded stream.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Line does not match any supported format
    #[error("Malformed line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// Timestamp column is not a non-negative integer
    #[error("Bad timestamp on line {line}: {text:?}")]
    BadTimestamp {
        /// 1-based line number
        line: usize,
        /// Offending text
        text: String,
    },

    /// Sample value is not an integer
    #[error("Invalid sample: {0}")]
    InvalidSample(#[from] SampleError),

    /// Underlying reader failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonValue {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
struct JsonLine {
    ecg_value: JsonValue,
    timestamp_ms: Option<u64>,
}

fn parse_value(text: &str) -> Result<i32, SampleError> {
    text.trim().parse().map_err(|_| SampleError::NonNumeric)
}

/// Stateful line parser assigning timestamps and sequence numbers.
#[derive(Clone, Debug)]
pub struct SampleParser {
    period_ms: f64,
    line: usize,
    sequence: u32,
    next_timestamp_ms: f64,
}

impl SampleParser {
    /// Create a parser for a stream recorded at `sampling_rate_hz`.
    #[must_use]
    pub fn new(sampling_rate_hz: u32) -> Self {
        Self {
            period_ms: math::sample_period_ms(sampling_rate_hz),
            line: 0,
            sequence: 0,
            next_timestamp_ms: 0.0,
        }
    }

    /// Parse one line. Returns `Ok(None)` for blank and comment lines.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] for malformed lines, bad timestamps and
    /// non-numeric sample values. The parser stays usable afterwards.
    pub fn parse_line(&mut self, text: &str) -> Result<Option<Sample>, SourceError> {
        self.line += 1;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(None);
        }

        let (timestamp_ms, value) = if text.starts_with('{') {
            self.parse_json(text)?
        } else {
            self.parse_csv(text)?
        };

        let timestamp_ms = timestamp_ms.unwrap_or(math::round(self.next_timestamp_ms) as u64);
        self.next_timestamp_ms = timestamp_ms as f64 + self.period_ms;

        let sample = Sample::new(value, timestamp_ms, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(sample))
    }

    fn parse_json(&self, text: &str) -> Result<(Option<u64>, i32), SourceError> {
        let parsed: JsonLine = serde_json::from_str(text).map_err(|e| SourceError::Malformed {
            line: self.line,
            reason: e.to_string(),
        })?;
        let value = match parsed.ecg_value {
            JsonValue::Number(n) => i32::try_from(n).map_err(|_| SampleError::OutOfRange {
                value: if n < 0 { i32::MIN } else { i32::MAX },
                min: math::constants::ADC_MIN,
                max: math::constants::ADC_MAX,
            })?,
            JsonValue::Text(s) => parse_value(&s)?,
        };
        Ok((parsed.timestamp_ms, value))
    }

    fn parse_csv(&self, text: &str) -> Result<(Option<u64>, i32), SourceError> {
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        match fields.as_slice() {
            [value] => Ok((None, parse_value(value)?)),
            [timestamp, value] => {
                let ts = timestamp.parse().map_err(|_| SourceError::BadTimestamp {
                    line: self.line,
                    text: (*timestamp).to_string(),
                })?;
                Ok((Some(ts), parse_value(value)?))
            }
            _ => Err(SourceError::Malformed {
                line: self.line,
                reason: format!("expected 1 or 2 fields, got {}", fields.len()),
            }),
        }
    }

    /// Lines consumed so far.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Read every line of `reader`, yielding one result per non-blank line.
pub fn read_samples<R: BufRead>(
    reader: R,
    sampling_rate_hz: u32,
) -> impl Iterator<Item = Result<Sample, SourceError>> {
    let mut parser = SampleParser::new(sampling_rate_hz);
    reader.lines().filter_map(move |line| match line {
        Ok(text) => parser.parse_line(&text).transpose(),
        Err(e) => Some(Err(SourceError::Io(e))),
    })
}
