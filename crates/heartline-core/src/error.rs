//! Error types for the Heartline ECG monitor
//!
//! These errors work in `no_std` environments and carry enough context to be
//! reported to an operator without heap allocation.

use core::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Sample Errors
// ============================================================================

/// A raw reading that cannot enter the analysis buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleError {
    /// The transport delivered text that is not an integer
    NonNumeric,
    /// The reading lies outside the ADC range
    OutOfRange {
        /// Value that was received
        value: i32,
        /// Smallest accepted value
        min: i32,
        /// Largest accepted value
        max: i32,
    },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonNumeric => write!(f, "Sample is not numeric"),
            Self::OutOfRange { value, min, max } => {
                write!(f, "Sample {value} outside ADC range [{min}, {max}]")
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SampleError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NonNumeric => defmt::write!(f, "Non-numeric sample"),
            Self::OutOfRange { value, .. } => defmt::write!(f, "Sample {} out of range", value),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SampleError {}

// ============================================================================
// Analysis Errors
// ============================================================================

/// Reasons a beat analysis request could not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisError {
    /// Fewer than ten seconds of signal are buffered
    InsufficientData {
        /// Additional whole seconds of signal required
        seconds_needed: u32,
        /// Whole seconds currently buffered
        seconds_available: u32,
    },
    /// The analysis window contains no usable R peak
    NoBeatFound,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData {
                seconds_needed,
                seconds_available,
            } => write!(
                f,
                "Insufficient data: {seconds_available}s buffered, {seconds_needed}s more needed"
            ),
            Self::NoBeatFound => write!(f, "No beat found in analysis window"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AnalysisError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::InsufficientData { seconds_needed, .. } => {
                defmt::write!(f, "Need {}s more data", seconds_needed);
            }
            Self::NoBeatFound => defmt::write!(f, "No beat found"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AnalysisError {}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Invalid monitor configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Sampling rate must be positive
    ZeroSamplingRate,
    /// Sampling rate exceeds the supported maximum
    SamplingRateTooHigh {
        /// Requested rate in Hz
        rate_hz: u32,
        /// Maximum rate in Hz
        max_hz: u32,
    },
    /// The analysis window would need an oversized buffer
    WindowTooLarge {
        /// Samples the window would hold
        samples: u64,
        /// Largest accepted buffer
        max_samples: u64,
    },
    /// A window length is zero or the display window exceeds the analysis window
    InvalidWindow {
        /// Display window in seconds
        display_s: u32,
        /// Analysis window in seconds
        analysis_s: u32,
    },
    /// BPM acceptance bounds are inverted or zero
    InvalidBpmRange {
        /// Lower bound
        min: u16,
        /// Upper bound
        max: u16,
    },
    /// Refractory period is not shorter than the maximum beat gap
    InvalidRefractory {
        /// Refractory period in milliseconds
        refractory_ms: u64,
        /// Maximum beat gap in milliseconds
        max_gap_ms: u64,
    },
    /// A count parameter must be positive
    ZeroCount {
        /// Parameter name
        field: &'static str,
    },
    /// A threshold multiplier or divisor must be positive and finite
    InvalidFactor {
        /// Parameter name
        field: &'static str,
        /// Supplied value
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSamplingRate => write!(f, "Sampling rate must be positive"),
            Self::SamplingRateTooHigh { rate_hz, max_hz } => {
                write!(f, "Sampling rate {rate_hz} Hz exceeds {max_hz} Hz")
            }
            Self::WindowTooLarge {
                samples,
                max_samples,
            } => write!(
                f,
                "Analysis window needs {samples} samples, limit is {max_samples}"
            ),
            Self::InvalidWindow {
                display_s,
                analysis_s,
            } => write!(
                f,
                "Invalid windows: display {display_s}s, analysis {analysis_s}s"
            ),
            Self::InvalidBpmRange { min, max } => {
                write!(f, "Invalid BPM range: {min}-{max}")
            }
            Self::InvalidRefractory {
                refractory_ms,
                max_gap_ms,
            } => write!(
                f,
                "Refractory {refractory_ms}ms must be shorter than max gap {max_gap_ms}ms"
            ),
            Self::ZeroCount { field } => write!(f, "{field} must be positive"),
            Self::InvalidFactor { field, value } => {
                write!(f, "{field} must be positive and finite, got {value}")
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ZeroSamplingRate => defmt::write!(f, "Zero sampling rate"),
            Self::SamplingRateTooHigh { rate_hz, .. } => {
                defmt::write!(f, "Sampling rate {} too high", rate_hz);
            }
            Self::WindowTooLarge { samples, .. } => {
                defmt::write!(f, "Window too large: {} samples", samples);
            }
            Self::InvalidWindow { .. } => defmt::write!(f, "Invalid window"),
            Self::InvalidBpmRange { min, max } => defmt::write!(f, "Invalid BPM {}-{}", min, max),
            Self::InvalidRefractory { refractory_ms, .. } => {
                defmt::write!(f, "Invalid refractory {}ms", refractory_ms);
            }
            Self::ZeroCount { field } => defmt::write!(f, "{} is zero", field),
            Self::InvalidFactor { field, .. } => defmt::write!(f, "Invalid {}", field),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_sample_error_display() {
        let err = SampleError::OutOfRange {
            value: 5000,
            min: 0,
            max: 4095,
        };
        assert_eq!(err.to_string(), "Sample 5000 outside ADC range [0, 4095]");
        assert_eq!(SampleError::NonNumeric.to_string(), "Sample is not numeric");
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = AnalysisError::InsufficientData {
            seconds_needed: 4,
            seconds_available: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data: 6s buffered, 4s more needed"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidBpmRange { min: 200, max: 40 };
        assert_eq!(err.to_string(), "Invalid BPM range: 200-40");

        let err = ConfigError::WindowTooLarge {
            samples: 2_000_000,
            max_samples: 1_000_000,
        };
        assert_eq!(
            err.to_string(),
            "Analysis window needs 2000000 samples, limit is 1000000"
        );
    }
}
