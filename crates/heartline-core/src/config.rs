//! Monitor configuration
//!
//! All window lengths are declared in milliseconds or seconds and converted to
//! sample counts through one canonical sampling rate.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::{self, constants};

// ============================================================================
// Policies
// ============================================================================

/// What to report when an interval cannot be measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Report unmeasured intervals as missing
    #[default]
    Disabled,
    /// Substitute heart-rate based estimates, tagged as estimated
    HeartRateEstimate,
}

/// How the beat segmenter picks the R peak inside the analysis window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatSelection {
    /// Tallest sample of the whole window
    #[default]
    GlobalMaximum,
    /// Tallest sample near the most recent tracked beat, falling back to
    /// the global maximum when no tracked beat has full context
    TrackedBeat,
}

// ============================================================================
// Component Configuration
// ============================================================================

/// Adaptive R-peak detector settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakDetectorConfig {
    /// Number of recent values used for the adaptive threshold
    pub history_len: usize,
    /// Values required before the adaptive threshold replaces the default
    pub warmup: usize,
    /// Standard deviations above the mean
    pub threshold_factor: f64,
    /// Threshold used during warm-up (raw ADC units)
    pub default_threshold: f64,
    /// Minimum gap between peaks
    pub refractory_ms: u64,
    /// Largest gap that still produces a BPM reading
    pub max_gap_ms: u64,
    /// Lowest accepted BPM
    pub min_bpm: u16,
    /// Highest accepted BPM
    pub max_bpm: u16,
}

impl Default for PeakDetectorConfig {
    fn default() -> Self {
        Self {
            history_len: 50,
            warmup: 10,
            threshold_factor: 1.5,
            default_threshold: 2500.0,
            refractory_ms: constants::REFRACTORY_MS,
            max_gap_ms: constants::MAX_RR_MS,
            min_bpm: 40,
            max_bpm: 200,
        }
    }
}

/// Signal-quality estimator settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Raw samples required before a score is produced
    pub min_samples: usize,
    /// Number of recent raw values in the variance window
    pub window: usize,
    /// Variance units per quality percentage point
    pub variance_divisor: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            window: 20,
            variance_divisor: 1000.0,
        }
    }
}

/// Abnormality detection thresholds and alert rate limiting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum time between two emitted alerts
    pub cooldown_ms: u64,
    /// Heart rate strictly below this is bradycardia
    pub bradycardia_bpm: u16,
    /// Heart rate strictly above this is tachycardia
    pub tachycardia_bpm: u16,
    /// Number of recent BPM readings checked for irregularity
    pub irregular_window: usize,
    /// BPM variance above which the rhythm is irregular
    pub irregular_variance: f64,
    /// Quality percentage strictly below this is poor
    pub poor_quality_percent: u8,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 10_000,
            bradycardia_bpm: constants::BRADYCARDIA_BPM,
            tachycardia_bpm: constants::TACHYCARDIA_BPM,
            irregular_window: 5,
            irregular_variance: 400.0,
            poor_quality_percent: 70,
        }
    }
}

/// Interval calculator settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    /// Behaviour for unmeasurable intervals
    pub fallback: FallbackPolicy,
}

// ============================================================================
// Monitor Configuration
// ============================================================================

/// Complete engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Canonical sampling rate in Hz
    pub sampling_rate_hz: u32,
    /// Length of the display (raw) buffer in seconds
    pub display_window_s: u32,
    /// Length of the analysis buffer in seconds
    pub analysis_window_s: u32,
    /// Peak detection
    pub peaks: PeakDetectorConfig,
    /// Signal quality
    pub quality: QualityConfig,
    /// Abnormality alerts
    pub alerts: AlertConfig,
    /// Interval measurement
    pub intervals: IntervalConfig,
    /// R-peak selection for beat analysis
    pub beat_selection: BeatSelection,
    /// Minimum R-peak height above the window median (raw units)
    pub min_r_prominence: u16,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: constants::DEFAULT_SAMPLING_RATE_HZ,
            display_window_s: 4,
            analysis_window_s: constants::BEAT_ANALYSIS_MIN_SECONDS,
            peaks: PeakDetectorConfig::default(),
            quality: QualityConfig::default(),
            alerts: AlertConfig::default(),
            intervals: IntervalConfig::default(),
            beat_selection: BeatSelection::default(),
            min_r_prominence: 100,
        }
    }
}

impl MonitorConfig {
    /// Set the sampling rate.
    #[must_use]
    pub const fn with_sampling_rate(mut self, rate_hz: u32) -> Self {
        self.sampling_rate_hz = rate_hz;
        self
    }

    /// Set the interval fallback policy.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.intervals.fallback = fallback;
        self
    }

    /// Set the beat selection strategy.
    #[must_use]
    pub const fn with_beat_selection(mut self, selection: BeatSelection) -> Self {
        self.beat_selection = selection;
        self
    }

    /// Set the peak detector refractory period.
    #[must_use]
    pub const fn with_refractory_ms(mut self, refractory_ms: u64) -> Self {
        self.peaks.refractory_ms = refractory_ms;
        self
    }

    /// Set the alert cooldown.
    #[must_use]
    pub const fn with_alert_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.alerts.cooldown_ms = cooldown_ms;
        self
    }

    /// Capacity of the display buffer in samples.
    #[inline]
    #[must_use]
    pub const fn raw_capacity(&self) -> usize {
        math::seconds_to_samples(self.display_window_s, self.sampling_rate_hz) as usize
    }

    /// Capacity of the analysis buffer in samples.
    #[inline]
    #[must_use]
    pub const fn analysis_capacity(&self) -> usize {
        math::seconds_to_samples(self.analysis_window_s, self.sampling_rate_hz) as usize
    }

    /// Samples required before beat analysis runs.
    #[inline]
    #[must_use]
    pub const fn beat_analysis_samples(&self) -> usize {
        self.samples_for_ms(constants::BEAT_ANALYSIS_MIN_SECONDS * 1000)
    }

    /// Convert milliseconds to samples at the configured rate.
    #[inline]
    #[must_use]
    pub const fn samples_for_ms(&self, ms: u32) -> usize {
        math::ms_to_samples(ms, self.sampling_rate_hz)
    }

    /// Duration of one sample in milliseconds.
    #[inline]
    #[must_use]
    pub fn sample_period_ms(&self) -> f64 {
        math::sample_period_ms(self.sampling_rate_hz)
    }

    /// Check the configuration for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_rate_hz == 0 {
            return Err(ConfigError::ZeroSamplingRate);
        }
        if self.sampling_rate_hz > constants::MAX_SAMPLING_RATE_HZ {
            return Err(ConfigError::SamplingRateTooHigh {
                rate_hz: self.sampling_rate_hz,
                max_hz: constants::MAX_SAMPLING_RATE_HZ,
            });
        }
        if self.display_window_s == 0
            || self.analysis_window_s < constants::BEAT_ANALYSIS_MIN_SECONDS
            || self.display_window_s > self.analysis_window_s
        {
            return Err(ConfigError::InvalidWindow {
                display_s: self.display_window_s,
                analysis_s: self.analysis_window_s,
            });
        }
        let samples = math::seconds_to_samples(self.analysis_window_s, self.sampling_rate_hz);
        if samples > constants::MAX_WINDOW_SAMPLES {
            return Err(ConfigError::WindowTooLarge {
                samples,
                max_samples: constants::MAX_WINDOW_SAMPLES,
            });
        }

        let peaks = &self.peaks;
        if peaks.min_bpm == 0 || peaks.min_bpm > peaks.max_bpm {
            return Err(ConfigError::InvalidBpmRange {
                min: peaks.min_bpm,
                max: peaks.max_bpm,
            });
        }
        if peaks.refractory_ms >= peaks.max_gap_ms {
            return Err(ConfigError::InvalidRefractory {
                refractory_ms: peaks.refractory_ms,
                max_gap_ms: peaks.max_gap_ms,
            });
        }

        let counts = [
            ("peaks.history_len", peaks.history_len),
            ("peaks.warmup", peaks.warmup),
            ("quality.min_samples", self.quality.min_samples),
            ("quality.window", self.quality.window),
            ("alerts.irregular_window", self.alerts.irregular_window),
        ];
        for (field, count) in counts {
            if count == 0 {
                return Err(ConfigError::ZeroCount { field });
            }
        }

        let factors = [
            ("peaks.threshold_factor", peaks.threshold_factor),
            ("quality.variance_divisor", self.quality.variance_divisor),
        ];
        for (field, value) in factors {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidFactor { field, value });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
