//! Ten-second report summary
//!
//! A read-only aggregate over the analysis window, independent of the live
//! interval state. Report generation consumes this structure; rendering is
//! not part of this crate.

use std::fmt;

use serde::Serialize;

use heartline_core::config::MonitorConfig;
use heartline_core::math;
use heartline_core::types::{IntervalSet, IntervalValue, MorphologyState, Regularity, RhythmClass};

use crate::processing::{BeatSegmenter, IntervalCalculator};

const PEAK_NEIGHBOURHOOD_MS: u32 = 50;
const PEAK_SKIP_MS: u32 = 300;
const PEAK_EDGE_MS: u32 = 100;
const PEAK_THRESHOLD_FACTOR: f64 = 1.5;
const RR_RANGE_MS: (f64, f64) = (300.0, 2000.0);

const POOR_QUALITY: u8 = 70;
const EXCELLENT_QUALITY: u8 = 90;

// ============================================================================
// Normal Ranges
// ============================================================================

/// Agreement of a measured interval with its normal range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalStatus {
    /// Inside the normal range
    Normal,
    /// Outside the range by at most 10 %
    Borderline,
    /// Further outside the range
    Abnormal,
}

/// Report wording for an interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalAssessment {
    /// Below the normal range
    Short,
    /// Inside the normal range
    Normal,
    /// Above the normal range
    Prolonged,
    /// No value available
    NotMeasured,
}

impl IntervalAssessment {
    /// Report label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Short => "Short",
            Self::Normal => "Normal",
            Self::Prolonged => "Prolonged",
            Self::NotMeasured => "Not measured",
        }
    }
}

/// Normal range of a clinical interval in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NormalRange {
    /// Lower bound (inclusive)
    pub low_ms: u32,
    /// Upper bound (inclusive)
    pub high_ms: u32,
}

impl NormalRange {
    /// PR interval.
    pub const PR: Self = Self::new(120, 200);
    /// QRS duration.
    pub const QRS: Self = Self::new(80, 120);
    /// QT interval.
    pub const QT: Self = Self::new(350, 450);
    /// Bazett-corrected QT.
    pub const QTC: Self = Self::new(300, 440);

    const fn new(low_ms: u32, high_ms: u32) -> Self {
        Self { low_ms, high_ms }
    }

    /// Whether `ms` lies inside the range.
    #[must_use]
    pub const fn contains(&self, ms: u32) -> bool {
        ms >= self.low_ms && ms <= self.high_ms
    }

    /// Normal, borderline (within 10 % outside) or abnormal.
    #[must_use]
    pub fn status(&self, ms: u32) -> IntervalStatus {
        if self.contains(ms) {
            return IntervalStatus::Normal;
        }
        let value = f64::from(ms);
        let low = f64::from(self.low_ms) * 0.9;
        let high = f64::from(self.high_ms) * 1.1;
        if value >= low && value <= high {
            IntervalStatus::Borderline
        } else {
            IntervalStatus::Abnormal
        }
    }

    /// Short, normal, prolonged or not measured.
    #[must_use]
    pub fn assess(&self, ms: Option<u32>) -> IntervalAssessment {
        match ms {
            None => IntervalAssessment::NotMeasured,
            Some(ms) if ms < self.low_ms => IntervalAssessment::Short,
            Some(ms) if ms > self.high_ms => IntervalAssessment::Prolonged,
            Some(_) => IntervalAssessment::Normal,
        }
    }
}

/// One row of the interval table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IntervalReport {
    /// Interval name
    pub name: &'static str,
    /// Value in milliseconds
    pub value_ms: Option<u32>,
    /// Whether the value is a heart-rate estimate
    pub estimated: bool,
    /// Normal range
    pub range: NormalRange,
    /// Report wording
    pub assessment: IntervalAssessment,
    /// Range agreement, when measured
    pub status: Option<IntervalStatus>,
}

// ============================================================================
// Clinical Notes
// ============================================================================

/// Signal quality grade used in notes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    /// Below 70 %
    Poor,
    /// 70 % to 90 %
    Good,
    /// Above 90 %
    Excellent,
}

impl QualityGrade {
    /// Grade a quality percentage.
    #[must_use]
    pub const fn from_percent(percent: u8) -> Self {
        if percent < POOR_QUALITY {
            Self::Poor
        } else if percent > EXCELLENT_QUALITY {
            Self::Excellent
        } else {
            Self::Good
        }
    }
}

/// Structured interpretation note.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClinicalNote {
    /// Heart-rate band
    HeartRate {
        /// Heart rate in BPM
        bpm: u16,
        /// Band
        class: RhythmClass,
    },
    /// RR regularity
    Rhythm {
        /// Regularity
        regularity: Regularity,
    },
    /// Signal quality
    SignalQuality {
        /// Quality percentage
        percent: u8,
        /// Grade
        grade: QualityGrade,
    },
    /// Length of the analysed window
    AnalysisWindow {
        /// Seconds of signal
        seconds: f64,
    },
    /// Non-diagnostic disclaimer
    Disclaimer,
}

impl fmt::Display for ClinicalNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeartRate { bpm, class } => match class {
                RhythmClass::Bradycardia => write!(
                    f,
                    "Heart rate of {bpm} BPM is below the normal range (bradycardia)."
                ),
                RhythmClass::Tachycardia => write!(
                    f,
                    "Heart rate of {bpm} BPM is above the normal range (tachycardia)."
                ),
                RhythmClass::NormalSinus => {
                    write!(f, "Heart rate of {bpm} BPM is within the normal range (60-100 BPM).")
                }
                RhythmClass::Unknown => write!(f, "Heart rate could not be determined."),
            },
            Self::Rhythm { regularity } => match regularity {
                Regularity::Regular => write!(f, "Rhythm appears regular."),
                Regularity::SlightlyIrregular => write!(f, "Rhythm appears slightly irregular."),
                Regularity::Irregular => {
                    write!(f, "Rhythm appears irregular; consider a longer recording.")
                }
                Regularity::InsufficientData | Regularity::Unknown => {
                    write!(f, "Not enough beats to assess rhythm regularity.")
                }
            },
            Self::SignalQuality { percent, grade } => match grade {
                QualityGrade::Poor => write!(
                    f,
                    "Signal quality is poor ({percent}%); measurements may be unreliable."
                ),
                QualityGrade::Good => write!(f, "Signal quality is good ({percent}%)."),
                QualityGrade::Excellent => write!(f, "Signal quality is excellent ({percent}%)."),
            },
            Self::AnalysisWindow { seconds } => {
                write!(f, "Analysis based on {seconds:.1} seconds of single-lead ECG.")
            }
            Self::Disclaimer => write!(
                f,
                "This summary is not a medical diagnosis. Consult a healthcare professional."
            ),
        }
    }
}

// ============================================================================
// Peak Finding
// ============================================================================

/// R peaks in a recorded window.
///
/// A peak exceeds `mean + 1.5 * stddev`, is the strict maximum within
/// +/-50 ms, and is followed by a 300 ms skip. Peaks within 100 ms of either
/// edge are ignored.
#[must_use]
pub fn find_r_peaks(values: &[u16], rate_hz: u32) -> Vec<usize> {
    let neighbourhood = math::ms_to_samples(PEAK_NEIGHBOURHOOD_MS, rate_hz);
    let skip = math::ms_to_samples(PEAK_SKIP_MS, rate_hz).max(1);
    let edge = math::ms_to_samples(PEAK_EDGE_MS, rate_hz).max(neighbourhood);
    if values.len() <= 2 * edge {
        return Vec::new();
    }

    let threshold = math::mean(values) + PEAK_THRESHOLD_FACTOR * math::std_dev(values);
    let mut peaks = Vec::new();
    let mut i = edge;
    while i < values.len() - edge {
        let v = values[i];
        let is_peak = f64::from(v) > threshold
            && (i - neighbourhood..=i + neighbourhood).all(|j| j == i || values[j] < v);
        if is_peak {
            peaks.push(i);
            i += skip;
        } else {
            i += 1;
        }
    }
    peaks
}

/// Consecutive peak gaps in milliseconds within the plausible RR range.
#[must_use]
pub fn valid_rr_intervals(peaks: &[usize], rate_hz: u32) -> Vec<f64> {
    peaks
        .windows(2)
        .map(|w| math::samples_to_ms((w[1] - w[0]) as f64, rate_hz))
        .filter(|rr| (RR_RANGE_MS.0..=RR_RANGE_MS.1).contains(rr))
        .collect()
}

// ============================================================================
// Ten-Second Summary
// ============================================================================

/// Report aggregate over the last ten seconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TenSecondSummary {
    /// Samples in the window
    pub data_points: usize,
    /// Seconds of signal in the window
    pub duration_seconds: f64,
    /// Heart rate from the window's RR intervals, else the live BPM
    pub heart_rate: u16,
    /// R peaks found in the window
    pub r_peak_count: usize,
    /// Intervals measured on the most recent peak
    pub intervals: IntervalSet,
    /// Live signal quality
    pub signal_quality: u8,
    /// Morphology of the last analysed beat
    pub morphology: MorphologyState,
    /// Whether a full ten seconds were available
    pub complete: bool,
}

impl TenSecondSummary {
    /// Summarise an analysis window.
    #[must_use]
    pub fn from_window(
        values: &[u16],
        config: &MonitorConfig,
        current_bpm: u16,
        signal_quality: u8,
        morphology: MorphologyState,
    ) -> Self {
        let rate = config.sampling_rate_hz;
        let complete = values.len() >= config.beat_analysis_samples();
        let peaks = find_r_peaks(values, rate);
        let rr = valid_rr_intervals(&peaks, rate);

        let heart_rate = if rr.is_empty() {
            current_bpm
        } else {
            math::bpm_from_rr_ms(math::mean(&rr)) as u16
        };

        let intervals = match peaks.last() {
            Some(&last) if complete => {
                let beat = BeatSegmenter::new(config).window_around(values, last);
                let last_rr = rr.last().map(|&ms| math::round(ms) as u32);
                IntervalCalculator::new(rate, config.intervals.fallback).calculate(
                    &beat,
                    last_rr,
                    heart_rate,
                )
            }
            _ => IntervalSet::default(),
        };

        Self {
            data_points: values.len(),
            duration_seconds: values.len() as f64 / f64::from(rate.max(1)),
            heart_rate,
            r_peak_count: peaks.len(),
            intervals,
            signal_quality,
            morphology,
            complete,
        }
    }

    /// Interval table rows in PR, QRS, QT, QTc order.
    #[must_use]
    pub fn interval_report(&self) -> [IntervalReport; 4] {
        let row = |name, value: Option<IntervalValue>, range: NormalRange| {
            let value_ms = value.map(IntervalValue::ms);
            IntervalReport {
                name,
                value_ms,
                estimated: value.is_some_and(IntervalValue::is_estimated),
                range,
                assessment: range.assess(value_ms),
                status: value_ms.map(|ms| range.status(ms)),
            }
        };
        [
            row("PR", self.intervals.pr, NormalRange::PR),
            row("QRS", self.intervals.qrs, NormalRange::QRS),
            row("QT", self.intervals.qt, NormalRange::QT),
            row("QTc", self.intervals.qtc, NormalRange::QTC),
        ]
    }

    /// Interpretation notes, disclaimer last.
    #[must_use]
    pub fn clinical_notes(&self) -> Vec<ClinicalNote> {
        let class = if self.heart_rate == 0 {
            RhythmClass::Unknown
        } else {
            RhythmClass::from_bpm(self.heart_rate)
        };
        vec![
            ClinicalNote::HeartRate {
                bpm: self.heart_rate,
                class,
            },
            ClinicalNote::Rhythm {
                regularity: self.morphology.rhythm.regularity,
            },
            ClinicalNote::SignalQuality {
                percent: self.signal_quality,
                grade: QualityGrade::from_percent(self.signal_quality),
            },
            ClinicalNote::AnalysisWindow {
                seconds: self.duration_seconds,
            },
            ClinicalNote::Disclaimer,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::test_fixtures::synthetic_values;

    #[test]
    fn test_find_r_peaks_regular_rhythm() {
        let values = synthetic_values(1000, 60, 80);
        let peaks = find_r_peaks(&values, 100);

        assert_eq!(peaks.len(), 12);
        assert_eq!(peaks[0], 60);
        assert_eq!(valid_rr_intervals(&peaks, 100), vec![800.0; 11]);
    }

    #[test]
    fn test_full_window_summary() {
        let values = synthetic_values(1000, 60, 80);
        let summary = TenSecondSummary::from_window(
            &values,
            &MonitorConfig::default(),
            0,
            95,
            MorphologyState::default(),
        );

        assert!(summary.complete);
        assert_eq!(summary.data_points, 1000);
        assert!((summary.duration_seconds - 10.0).abs() < 1e-9);
        assert_eq!(summary.heart_rate, 75);
        assert_eq!(summary.r_peak_count, 12);
        assert_eq!(summary.intervals.pr, Some(IntervalValue::Measured(170)));
        assert_eq!(summary.intervals.qtc, Some(IntervalValue::Measured(391)));

        let rows = summary.interval_report();
        assert_eq!(rows[0].assessment, IntervalAssessment::Normal);
        assert_eq!(rows[1].assessment, IntervalAssessment::Short);
        assert_eq!(rows[1].status, Some(IntervalStatus::Abnormal));
        assert_eq!(rows[2].assessment, IntervalAssessment::Normal);
    }

    #[test]
    fn test_partial_window_summary() {
        let values = synthetic_values(300, 60, 80);
        let summary = TenSecondSummary::from_window(
            &values,
            &MonitorConfig::default(),
            72,
            80,
            MorphologyState::default(),
        );

        assert!(!summary.complete);
        assert_eq!(summary.intervals, IntervalSet::default());
        assert_eq!(summary.heart_rate, 75);
    }

    #[test]
    fn test_empty_window_falls_back_to_live_bpm() {
        let summary = TenSecondSummary::from_window(
            &[],
            &MonitorConfig::default(),
            64,
            0,
            MorphologyState::default(),
        );
        assert_eq!(summary.heart_rate, 64);
        assert_eq!(summary.r_peak_count, 0);
    }

    #[test]
    fn test_range_status() {
        assert_eq!(NormalRange::PR.status(160), IntervalStatus::Normal);
        assert_eq!(NormalRange::PR.status(210), IntervalStatus::Borderline);
        assert_eq!(NormalRange::PR.status(110), IntervalStatus::Borderline);
        assert_eq!(NormalRange::PR.status(260), IntervalStatus::Abnormal);
        assert_eq!(NormalRange::QT.assess(None), IntervalAssessment::NotMeasured);
        assert_eq!(NormalRange::QT.assess(Some(480)).label(), "Prolonged");
    }

    #[test]
    fn test_clinical_notes() {
        let summary = TenSecondSummary {
            heart_rate: 48,
            signal_quality: 95,
            duration_seconds: 10.0,
            ..TenSecondSummary::default()
        };
        let notes = summary.clinical_notes();

        assert_eq!(
            notes[0],
            ClinicalNote::HeartRate {
                bpm: 48,
                class: RhythmClass::Bradycardia
            }
        );
        assert_eq!(
            notes[2].to_string(),
            "Signal quality is excellent (95%)."
        );
        assert_eq!(
            notes[3].to_string(),
            "Analysis based on 10.0 seconds of single-lead ECG."
        );
        assert_eq!(notes.last(), Some(&ClinicalNote::Disclaimer));
    }
}
