//! P/QRS/T wave morphology
//!
//! Detection runs on raw ADC values of one [`BeatWindow`]. Amplitudes are
//! converted to display volts only when building the result.

use heartline_core::math;
use heartline_core::types::{
    BeatWindow, PWave, PWaveShape, QrsClass, QrsComplex, TWave, TWavePolarity,
};

// P-wave search, relative to R
const P_SEARCH_START_MS: u32 = 300;
const P_SEARCH_END_MS: u32 = 80;
const P_PEAK_SEARCH_MS: u32 = 120;
const P_OFFSET_SEARCH_MS: u32 = 60;
const P_MIN_DURATION_MS: u32 = 60;
const P_MAX_DURATION_MS: u32 = 120;
const P_THRESHOLD_FACTOR: f64 = 0.3;
const P_BIPHASIC_DIP: f64 = 20.0;

// Isoelectric TP segment after R
const TP_START_MS: u32 = 400;
const TP_END_MS: u32 = 600;

const QRS_HALF_WIDTH_MS: u32 = 50;
const QRS_HIGH_AMPLITUDE: u16 = 1500;
const QRS_LOW_AMPLITUDE: u16 = 500;

const T_START_MS: u32 = 100;
const T_END_MS: u32 = 300;
const T_MIN_AMPLITUDE: f64 = 30.0;

/// Wave morphology of one beat.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaveMorphology {
    /// P wave
    pub p_wave: PWave,
    /// QRS complex
    pub qrs_complex: QrsComplex,
    /// T wave
    pub t_wave: TWave,
}

/// Detects P, QRS and T waves in a beat window.
#[derive(Clone, Debug)]
pub struct MorphologyAnalyzer {
    rate_hz: u32,
}

impl MorphologyAnalyzer {
    /// Create an analyzer for the given sampling rate.
    #[must_use]
    pub fn new(rate_hz: u32) -> Self {
        Self { rate_hz }
    }

    fn samples(&self, ms: u32) -> usize {
        math::ms_to_samples(ms, self.rate_hz)
    }

    /// Analyze all three waves.
    #[must_use]
    pub fn analyze(&self, beat: &BeatWindow) -> WaveMorphology {
        WaveMorphology {
            p_wave: self.p_wave(beat),
            qrs_complex: self.qrs_complex(beat),
            t_wave: self.t_wave(beat),
        }
    }

    /// P-wave baseline: mean of the TP segment, else the window median.
    fn p_baseline(&self, beat: &BeatWindow) -> f64 {
        let values = &beat.values;
        let last = values.len().saturating_sub(1);
        let r = beat.r_peak_index;
        let start = (r + self.samples(TP_START_MS)).min(last);
        let end = (r + self.samples(TP_END_MS)).min(last);
        if end > start {
            math::mean(&values[start..end])
        } else {
            math::median(values)
        }
    }

    /// Detect the P wave before the R peak.
    #[must_use]
    pub fn p_wave(&self, beat: &BeatWindow) -> PWave {
        let not_detected = PWave::default();
        let values = &beat.values;
        let r = beat.r_peak_index;

        let start = r.saturating_sub(self.samples(P_SEARCH_START_MS));
        let end = r.saturating_sub(self.samples(P_SEARCH_END_MS));
        if end <= start || end > values.len() {
            return not_detected;
        }

        let region = &values[start..end];
        let baseline = self.p_baseline(beat);
        let threshold = P_THRESHOLD_FACTOR * math::std_dev(region);
        let slope = math::derivative(region);

        let Some(onset) = (1..region.len().saturating_sub(1))
            .find(|&i| slope[i] > threshold && slope[i - 1] <= threshold)
        else {
            return not_detected;
        };

        let peak_end = (onset + self.samples(P_PEAK_SEARCH_MS)).min(region.len());
        let Some(peak) = (onset..peak_end)
            .filter(|&i| f64::from(region[i]) > baseline + threshold)
            .fold(None, |best: Option<usize>, i| match best {
                Some(b) if region[b] >= region[i] => Some(b),
                _ => Some(i),
            })
        else {
            return not_detected;
        };

        let offset_end = (peak + self.samples(P_OFFSET_SEARCH_MS)).min(region.len());
        let Some(offset) = (peak..offset_end)
            .find(|&i| (f64::from(region[i]) - baseline).abs() < threshold / 2.0)
        else {
            return not_detected;
        };

        let duration_ms = math::samples_to_ms((offset - onset) as f64, self.rate_hz) as u32;
        let amplitude = f64::from(region[peak]) - baseline;
        if !(P_MIN_DURATION_MS..=P_MAX_DURATION_MS).contains(&duration_ms) || amplitude < threshold
        {
            return not_detected;
        }

        PWave {
            detected: true,
            amplitude: math::amplitude_to_volts(amplitude),
            duration_ms,
            onset_ms: beat.timestamps_ms.get(start + onset).copied(),
            offset_ms: beat.timestamps_ms.get(start + offset).copied(),
            shape: classify_p_shape(&region[onset..=offset]),
        }
    }

    /// Measure the QRS complex around the R peak.
    #[must_use]
    pub fn qrs_complex(&self, beat: &BeatWindow) -> QrsComplex {
        let values = &beat.values;
        if values.is_empty() {
            return QrsComplex::default();
        }
        let r = beat.r_peak_index;
        let half = self.samples(QRS_HALF_WIDTH_MS);
        let start = r.saturating_sub(half);
        let end = (r + half).min(values.len() - 1).max(start + 1);

        let window = &values[start..end];
        let max = window.iter().copied().max().unwrap_or(0);
        let min = window.iter().copied().min().unwrap_or(0);
        let amplitude_raw = max - min;

        let class = if amplitude_raw > QRS_HIGH_AMPLITUDE {
            QrsClass::HighAmplitude
        } else if amplitude_raw < QRS_LOW_AMPLITUDE {
            QrsClass::LowAmplitude
        } else {
            QrsClass::Normal
        };

        QrsComplex {
            detected: true,
            amplitude: math::amplitude_to_volts(f64::from(amplitude_raw)),
            amplitude_raw,
            class,
        }
    }

    /// Detect the T wave after the R peak.
    #[must_use]
    pub fn t_wave(&self, beat: &BeatWindow) -> TWave {
        let values = &beat.values;
        let (Some(&first), Some(&last_value)) = (values.first(), values.last()) else {
            return TWave::default();
        };
        let last = values.len() - 1;
        let r = beat.r_peak_index;
        let start = (r + self.samples(T_START_MS)).min(last);
        let end = (r + self.samples(T_END_MS)).min(last);
        if end <= start {
            return TWave::default();
        }

        let window = &values[start..end];
        let baseline = (f64::from(first) + f64::from(last_value)) / 2.0;
        let max = f64::from(window.iter().copied().max().unwrap_or(0));
        let min = f64::from(window.iter().copied().min().unwrap_or(0));

        let (polarity, amplitude) = if (max - baseline).abs() > (min - baseline).abs() {
            (TWavePolarity::Positive, max - baseline)
        } else {
            (TWavePolarity::Negative, baseline - min)
        };

        if amplitude.abs() <= T_MIN_AMPLITUDE {
            return TWave::default();
        }

        TWave {
            detected: true,
            amplitude: math::amplitude_to_volts(amplitude),
            polarity,
        }
    }
}

/// Classify a P-wave segment (onset to offset, inclusive).
#[must_use]
pub fn classify_p_shape(segment: &[u16]) -> PWaveShape {
    if segment.len() < 3 {
        return PWaveShape::Unknown;
    }
    let Some(peak) = math::argmax(segment) else {
        return PWaveShape::Unknown;
    };

    let baseline = (f64::from(segment[0]) + f64::from(segment[segment.len() - 1])) / 2.0;
    let dips = |half: &[u16]| {
        half.iter()
            .copied()
            .min()
            .is_some_and(|m| f64::from(m) < baseline - P_BIPHASIC_DIP)
    };
    if dips(&segment[..peak]) || dips(&segment[peak + 1..]) {
        return PWaveShape::Biphasic;
    }

    let position = peak as f64 / segment.len() as f64;
    if !(0.3..=0.7).contains(&position) {
        return PWaveShape::Asymmetric;
    }
    PWaveShape::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::test_fixtures::synthetic_beat_window;

    #[test]
    fn test_full_beat_morphology() {
        let beat = synthetic_beat_window();
        let morphology = MorphologyAnalyzer::new(100).analyze(&beat);

        let p = morphology.p_wave;
        assert!(p.detected);
        assert_eq!(p.duration_ms, 100);
        assert_eq!(p.shape, PWaveShape::Normal);
        assert_eq!(p.onset_ms, Some(-250));
        assert_eq!(p.offset_ms, Some(-150));
        assert!((p.amplitude - 0.121).abs() < 1e-9);

        let qrs = morphology.qrs_complex;
        assert!(qrs.detected);
        assert_eq!(qrs.amplitude_raw, 1700);
        assert_eq!(qrs.class, QrsClass::HighAmplitude);
        assert_eq!(qrs.class.label(), "High amplitude");

        let t = morphology.t_wave;
        assert!(t.detected);
        assert_eq!(t.polarity, TWavePolarity::Positive);
        assert!((t.amplitude - 0.242).abs() < 1e-9);
    }

    #[test]
    fn test_flat_beat_detects_only_qrs() {
        let beat = BeatWindow {
            values: vec![2048; 80],
            timestamps_ms: (0..80).map(|i| (i - 40) * 10).collect(),
            r_peak_index: 40,
            r_peak_value: 2048,
        };
        let morphology = MorphologyAnalyzer::new(100).analyze(&beat);

        assert!(!morphology.p_wave.detected);
        assert!(morphology.qrs_complex.detected);
        assert_eq!(morphology.qrs_complex.class, QrsClass::LowAmplitude);
        assert!(!morphology.t_wave.detected);
        assert_eq!(morphology.t_wave.polarity, TWavePolarity::Unknown);
    }

    #[test]
    fn test_negative_t_wave() {
        let mut beat = synthetic_beat_window();
        for v in &mut beat.values[50..70] {
            *v = 2048 - (*v - 2048);
        }
        let t = MorphologyAnalyzer::new(100).t_wave(&beat);
        assert!(t.detected);
        assert_eq!(t.polarity, TWavePolarity::Negative);
    }

    #[test]
    fn test_p_shape_classification() {
        assert_eq!(
            classify_p_shape(&[2048, 2100, 2150, 2100, 2048]),
            PWaveShape::Normal
        );
        assert_eq!(
            classify_p_shape(&[2048, 2000, 2150, 2100, 2048]),
            PWaveShape::Biphasic
        );
        assert_eq!(
            classify_p_shape(&[2048, 2150, 2120, 2100, 2080, 2060, 2048]),
            PWaveShape::Asymmetric
        );
        assert_eq!(classify_p_shape(&[2048, 2100]), PWaveShape::Unknown);
    }
}
