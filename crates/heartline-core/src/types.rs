//! Core types for the Heartline ECG monitor
//!
//! This module provides the data model shared by every analysis stage:
//! - Raw ADC samples and their validation
//! - Heart-rate statistics with a bounded history
//! - Clinical interval sets (PR/QRS/QT/QTc/RR) with measured/estimated tagging
//! - P/QRS/T wave morphology and rhythm classification
//! - Abnormality conditions and alerts
//! - Output payloads consumed by chart and report collaborators

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use heapless::Deque;
use serde::{Deserialize, Serialize};

use crate::error::SampleError;
use crate::math::{self, constants};

// ============================================================================
// Samples
// ============================================================================

/// One single-channel ECG reading as delivered by the transport collaborator.
///
/// `value` is kept as a signed integer so that out-of-range readings can be
/// represented and rejected by [`Sample::validated`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Raw ADC reading, valid range 0..=4095
    pub value: i32,
    /// Monotonic timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Transport sequence number
    pub sequence: u32,
}

impl Sample {
    /// Create a new sample.
    #[inline]
    #[must_use]
    pub const fn new(value: i32, timestamp_ms: u64, sequence: u32) -> Self {
        Self {
            value,
            timestamp_ms,
            sequence,
        }
    }

    /// Parse a textual reading (the transport delivers decimal strings).
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::NonNumeric`] if `text` is not an integer and
    /// [`SampleError::OutOfRange`] if it lies outside the 12-bit ADC range.
    pub fn parse(text: &str, timestamp_ms: u64, sequence: u32) -> Result<Self, SampleError> {
        let value: i32 = text.trim().parse().map_err(|_| SampleError::NonNumeric)?;
        let sample = Self::new(value, timestamp_ms, sequence);
        sample.validated()?;
        Ok(sample)
    }

    /// Validate the reading and return it as an ADC count.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::OutOfRange`] if the value is outside 0..=4095.
    pub const fn validated(&self) -> Result<u16, SampleError> {
        if self.value < constants::ADC_MIN || self.value > constants::ADC_MAX {
            return Err(SampleError::OutOfRange {
                value: self.value,
                min: constants::ADC_MIN,
                max: constants::ADC_MAX,
            });
        }
        Ok(self.value as u16)
    }
}

/// A validated sample stored in the analysis buffers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSample {
    /// ADC count (0..=4095)
    pub value: u16,
    /// Monotonic timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Running index since the session started (1-based)
    pub index: u64,
}

/// One point of the live chart stream.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EcgPoint {
    /// Position on the time axis in seconds since the session started
    pub t: f64,
    /// Raw ADC amplitude
    pub amplitude: u16,
}

// ============================================================================
// Heart Rate Statistics
// ============================================================================

/// Heart-rate statistics over a bounded history of accepted BPM readings.
///
/// `min`/`max` are recomputed from the history on every update, so values
/// that fall out of the history no longer influence the extremes.
#[derive(Clone, Debug, Default)]
pub struct BpmStats {
    /// Most recent accepted BPM (0 before the first beat pair)
    pub current: u16,
    /// Rounded mean of the history
    pub average: u16,
    /// Minimum of the history
    pub min: Option<u16>,
    /// Maximum of the history
    pub max: Option<u16>,
    history: Deque<u16, { constants::BPM_HISTORY_CAPACITY }>,
}

impl BpmStats {
    /// Create empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted BPM reading, dropping the oldest when full.
    pub fn record(&mut self, bpm: u16) {
        if self.history.is_full() {
            self.history.pop_front();
        }
        // Capacity was just ensured above
        let _ = self.history.push_back(bpm);
        self.current = bpm;
        self.recompute();
    }

    fn recompute(&mut self) {
        if self.history.is_empty() {
            self.average = 0;
            self.min = None;
            self.max = None;
            return;
        }
        let sum: u32 = self.history.iter().map(|&b| u32::from(b)).sum();
        let avg = f64::from(sum) / self.history.len() as f64;
        self.average = math::round(avg) as u16;
        self.min = self.history.iter().min().copied();
        self.max = self.history.iter().max().copied();
    }

    /// History length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether no BPM has been accepted yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Iterate the history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = u16> + '_ {
        self.history.iter().copied()
    }

    /// The last `n` readings, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<u16> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).copied().collect()
    }

    /// Snapshot for the `BPMUpdate` output.
    #[must_use]
    pub fn snapshot(&self) -> BpmUpdate {
        BpmUpdate {
            current: self.current,
            average: self.average,
            min: self.min,
            max: self.max,
        }
    }

    /// Discard all readings.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Heart-rate update pushed to display collaborators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmUpdate {
    /// Most recent BPM
    pub current: u16,
    /// Mean of the history
    pub average: u16,
    /// Minimum of the history
    pub min: Option<u16>,
    /// Maximum of the history
    pub max: Option<u16>,
}

/// Signal-quality update (integer percentage).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityUpdate {
    /// Heuristic quality score, 0-100
    pub percent: u8,
}

// ============================================================================
// Intervals
// ============================================================================

/// An interval value in milliseconds, tagged with how it was obtained.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", content = "ms", rename_all = "snake_case")]
pub enum IntervalValue {
    /// Measured from the signal
    Measured(u32),
    /// Substituted from heart rate by the fallback policy
    Estimated(u32),
}

impl IntervalValue {
    /// Value in milliseconds regardless of origin.
    #[inline]
    #[must_use]
    pub const fn ms(self) -> u32 {
        match self {
            Self::Measured(ms) | Self::Estimated(ms) => ms,
        }
    }

    /// Whether the value is a heart-rate based estimate.
    #[inline]
    #[must_use]
    pub const fn is_estimated(self) -> bool {
        matches!(self, Self::Estimated(_))
    }
}

impl fmt::Display for IntervalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured(ms) => write!(f, "{ms} ms"),
            Self::Estimated(ms) => write!(f, "~{ms} ms (estimated)"),
        }
    }
}

/// Clinical intervals of one analysed beat. `None` means "could not be measured".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSet {
    /// PR interval
    pub pr: Option<IntervalValue>,
    /// QRS duration
    pub qrs: Option<IntervalValue>,
    /// QT interval
    pub qt: Option<IntervalValue>,
    /// Bazett-corrected QT
    pub qtc: Option<IntervalValue>,
    /// Most recent RR interval from beat tracking, milliseconds
    pub rr: Option<u32>,
}

impl IntervalSet {
    /// Output payload without the RR interval.
    #[must_use]
    pub const fn update(&self) -> IntervalUpdate {
        IntervalUpdate {
            pr: self.pr,
            qrs: self.qrs,
            qt: self.qt,
            qtc: self.qtc,
        }
    }
}

/// Interval update pushed to display collaborators.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalUpdate {
    /// PR interval
    pub pr: Option<IntervalValue>,
    /// QRS duration
    pub qrs: Option<IntervalValue>,
    /// QT interval
    pub qt: Option<IntervalValue>,
    /// Bazett-corrected QT
    pub qtc: Option<IntervalValue>,
}

// ============================================================================
// Beat Window
// ============================================================================

/// A single beat cut out around its R peak.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatWindow {
    /// Raw ADC values
    pub values: Vec<u16>,
    /// Timestamps relative to the R peak in milliseconds (R peak at 0)
    pub timestamps_ms: Vec<i64>,
    /// Index of the R peak within `values`
    pub r_peak_index: usize,
    /// ADC value at the R peak
    pub r_peak_value: u16,
}

impl BeatWindow {
    /// Number of samples in the window.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the window holds no samples.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Morphology
// ============================================================================

/// P-wave shape classification.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PWaveShape {
    /// Single smooth positive deflection
    Normal,
    /// Dips below baseline on either side of the peak
    Biphasic,
    /// Peak outside the middle 40 % of the wave
    Asymmetric,
    /// Not classified
    #[default]
    Unknown,
}

impl PWaveShape {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Biphasic => "Biphasic",
            Self::Asymmetric => "Asymmetric",
            Self::Unknown => "Unknown",
        }
    }
}

/// P-wave detection result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PWave {
    /// Whether a valid P wave was found
    pub detected: bool,
    /// Peak height above baseline in display volts
    pub amplitude: f64,
    /// Onset-to-offset duration in milliseconds
    pub duration_ms: u32,
    /// Onset time relative to the R peak (ms)
    pub onset_ms: Option<i64>,
    /// Offset time relative to the R peak (ms)
    pub offset_ms: Option<i64>,
    /// Shape classification
    pub shape: PWaveShape,
}

/// QRS amplitude classification.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QrsClass {
    /// Peak-to-peak amplitude within 500..=1500 raw units
    Normal,
    /// Peak-to-peak amplitude above 1500 raw units
    HighAmplitude,
    /// Peak-to-peak amplitude below 500 raw units
    LowAmplitude,
    /// Not classified
    #[default]
    Unknown,
}

impl QrsClass {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::HighAmplitude => "High amplitude",
            Self::LowAmplitude => "Low amplitude",
            Self::Unknown => "Unknown",
        }
    }
}

/// QRS complex result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QrsComplex {
    /// Always true once a beat window exists
    pub detected: bool,
    /// Peak-to-peak amplitude in display volts
    pub amplitude: f64,
    /// Peak-to-peak amplitude in raw ADC units
    pub amplitude_raw: u16,
    /// Amplitude classification
    pub class: QrsClass,
}

/// T-wave polarity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TWavePolarity {
    /// Deflection above baseline
    Positive,
    /// Deflection below baseline
    Negative,
    /// Not detected
    #[default]
    Unknown,
}

impl TWavePolarity {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Unknown => "Unknown",
        }
    }
}

/// T-wave result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TWave {
    /// Whether the deflection exceeded the detection threshold
    pub detected: bool,
    /// Deflection magnitude in display volts
    pub amplitude: f64,
    /// Polarity of the dominant deflection
    pub polarity: TWavePolarity,
}

/// RR regularity classification.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regularity {
    /// RR variability below 10 %
    Regular,
    /// RR variability in 10..20 %
    SlightlyIrregular,
    /// RR variability of 20 % or more
    Irregular,
    /// Fewer than three tracked beats
    InsufficientData,
    /// Not yet evaluated
    #[default]
    Unknown,
}

impl Regularity {
    /// Classify an RR variability percentage (`stddev / mean * 100`).
    #[must_use]
    pub fn from_variability(percent: f64) -> Self {
        if percent < 10.0 {
            Self::Regular
        } else if percent < 20.0 {
            Self::SlightlyIrregular
        } else {
            Self::Irregular
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::SlightlyIrregular => "Slightly irregular",
            Self::Irregular => "Irregular",
            Self::InsufficientData => "Insufficient data",
            Self::Unknown => "Unknown",
        }
    }
}

/// Heart-rate based rhythm label.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhythmClass {
    /// 60..=100 BPM
    NormalSinus,
    /// Below 60 BPM
    Bradycardia,
    /// Above 100 BPM
    Tachycardia,
    /// Not yet evaluated
    #[default]
    Unknown,
}

impl RhythmClass {
    /// Classify a heart rate.
    #[must_use]
    pub const fn from_bpm(bpm: u16) -> Self {
        if bpm < constants::BRADYCARDIA_BPM {
            Self::Bradycardia
        } else if bpm > constants::TACHYCARDIA_BPM {
            Self::Tachycardia
        } else {
            Self::NormalSinus
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NormalSinus => "Normal Sinus Rhythm",
            Self::Bradycardia => "Bradycardia",
            Self::Tachycardia => "Tachycardia",
            Self::Unknown => "Unknown",
        }
    }
}

/// Rhythm summary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rhythm {
    /// RR regularity
    pub regularity: Regularity,
    /// Heart-rate classification
    pub classification: RhythmClass,
    /// RR variability percentage, when enough beats were tracked
    pub variability_percent: Option<f64>,
}

/// Morphology of the most recently analysed beat plus the live rhythm.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphologyState {
    /// P wave
    pub p_wave: PWave,
    /// QRS complex
    pub qrs_complex: QrsComplex,
    /// T wave
    pub t_wave: TWave,
    /// Rhythm
    pub rhythm: Rhythm,
}

/// Morphology update pushed to display collaborators.
pub type MorphologyUpdate = MorphologyState;

// ============================================================================
// Abnormalities
// ============================================================================

/// Alert severity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Needs attention
    Warning,
    /// Needs immediate attention
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Abnormal condition, in alert priority order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbnormalityKind {
    /// Heart rate below 60 BPM
    Bradycardia,
    /// Heart rate above 100 BPM
    Tachycardia,
    /// High variance of recent BPM readings
    IrregularRhythm,
    /// Signal quality below 70 %
    PoorSignalQuality,
}

impl AbnormalityKind {
    /// Severity attached to alerts of this kind.
    #[must_use]
    pub const fn severity(self) -> AlertSeverity {
        match self {
            Self::Bradycardia | Self::Tachycardia => AlertSeverity::Critical,
            Self::IrregularRhythm | Self::PoorSignalQuality => AlertSeverity::Warning,
        }
    }

    /// Alert title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Bradycardia => "Bradycardia Detected",
            Self::Tachycardia => "Tachycardia Detected",
            Self::IrregularRhythm => "Irregular Rhythm Detected",
            Self::PoorSignalQuality => "Poor Signal Quality",
        }
    }
}

/// Current abnormality flags. Updated on every evaluation, even when alert
/// emission is suppressed by the cooldown.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbnormalityConditions {
    /// Heart rate below the bradycardia limit
    pub bradycardia: bool,
    /// Heart rate above the tachycardia limit
    pub tachycardia: bool,
    /// Recent BPM variance above the irregularity limit
    pub irregular_rhythm: bool,
    /// Signal quality below the acceptable limit
    pub poor_signal_quality: bool,
}

impl AbnormalityConditions {
    /// Whether any condition is active.
    #[inline]
    #[must_use]
    pub const fn any(&self) -> bool {
        self.bradycardia || self.tachycardia || self.irregular_rhythm || self.poor_signal_quality
    }

    /// Highest-priority active condition.
    #[must_use]
    pub const fn first_active(&self) -> Option<AbnormalityKind> {
        if self.bradycardia {
            Some(AbnormalityKind::Bradycardia)
        } else if self.tachycardia {
            Some(AbnormalityKind::Tachycardia)
        } else if self.irregular_rhythm {
            Some(AbnormalityKind::IrregularRhythm)
        } else if self.poor_signal_quality {
            Some(AbnormalityKind::PoorSignalQuality)
        } else {
            None
        }
    }
}

/// Alert pushed to UI collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbnormalityAlert {
    /// Severity
    pub severity: AlertSeverity,
    /// Condition that produced the alert
    pub kind: AbnormalityKind,
    /// Short title
    pub title: String,
    /// Operator-facing message
    pub message: String,
    /// Sample timestamp of the triggering evaluation (ms)
    pub at_ms: u64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_validation() {
        assert_eq!(Sample::new(0, 0, 0).validated(), Ok(0));
        assert_eq!(Sample::new(4095, 0, 0).validated(), Ok(4095));
        assert!(matches!(
            Sample::new(4096, 0, 0).validated(),
            Err(SampleError::OutOfRange { value: 4096, .. })
        ));
        assert!(Sample::new(-1, 0, 0).validated().is_err());
    }

    #[test]
    fn test_sample_parse() {
        assert_eq!(Sample::parse(" 2100 ", 5, 1).map(|s| s.value), Ok(2100));
        assert_eq!(Sample::parse("abc", 5, 1), Err(SampleError::NonNumeric));
        assert!(matches!(
            Sample::parse("9000", 5, 1),
            Err(SampleError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_bpm_stats_recompute() {
        let mut stats = BpmStats::new();
        stats.record(60);
        stats.record(80);
        stats.record(71);

        assert_eq!(stats.current, 71);
        assert_eq!(stats.average, 70);
        assert_eq!(stats.min, Some(60));
        assert_eq!(stats.max, Some(80));
    }

    #[test]
    fn test_bpm_stats_bounded_history() {
        let mut stats = BpmStats::new();
        stats.record(45);
        for _ in 0..constants::BPM_HISTORY_CAPACITY {
            stats.record(75);
        }

        // The 45 was evicted, so the minimum follows the remaining history
        assert_eq!(stats.len(), constants::BPM_HISTORY_CAPACITY);
        assert_eq!(stats.min, Some(75));
        assert_eq!(stats.recent(3), [75, 75, 75]);
    }

    #[test]
    fn test_interval_value() {
        assert_eq!(IntervalValue::Measured(160).ms(), 160);
        assert!(IntervalValue::Estimated(90).is_estimated());
        assert!(!IntervalValue::Measured(90).is_estimated());
    }

    #[test]
    fn test_regularity_boundaries() {
        assert_eq!(Regularity::from_variability(9.99), Regularity::Regular);
        assert_eq!(Regularity::from_variability(10.0), Regularity::SlightlyIrregular);
        assert_eq!(Regularity::from_variability(20.0), Regularity::Irregular);
    }

    #[test]
    fn test_rhythm_class() {
        assert_eq!(RhythmClass::from_bpm(59), RhythmClass::Bradycardia);
        assert_eq!(RhythmClass::from_bpm(60), RhythmClass::NormalSinus);
        assert_eq!(RhythmClass::from_bpm(100), RhythmClass::NormalSinus);
        assert_eq!(RhythmClass::from_bpm(101), RhythmClass::Tachycardia);
    }

    #[test]
    fn test_condition_priority() {
        let conditions = AbnormalityConditions {
            bradycardia: false,
            tachycardia: true,
            irregular_rhythm: true,
            poor_signal_quality: true,
        };
        assert_eq!(conditions.first_active(), Some(AbnormalityKind::Tachycardia));
        assert_eq!(
            AbnormalityKind::Tachycardia.severity(),
            AlertSeverity::Critical
        );
        assert_eq!(
            AbnormalityKind::PoorSignalQuality.severity(),
            AlertSeverity::Warning
        );
        assert!(!AbnormalityConditions::default().any());
    }
}
