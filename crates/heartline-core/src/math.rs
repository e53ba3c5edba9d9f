//! Math utilities for ECG signal analysis (`no_std` compatible)
//!
//! This module provides:
//! - ADC and timing constants shared by the analysis stages
//! - Population statistics over raw sample windows
//! - Millisecond/sample conversions derived from one sampling rate
//! - ADC count to display-voltage conversion
//! - Bazett QT correction

use alloc::vec::Vec;

// ============================================================================
// Constants
// ============================================================================

/// Constants for ECG acquisition and analysis
pub mod constants {
    /// Smallest valid 12-bit ADC reading
    pub const ADC_MIN: i32 = 0;

    /// Largest valid 12-bit ADC reading
    pub const ADC_MAX: i32 = 4095;

    /// ADC midpoint, treated as 0 V on the display scale
    pub const ADC_CENTER: f64 = 2048.0;

    /// ADC reference voltage (full scale 0-4095 maps onto 0-3.3 V)
    pub const ADC_REFERENCE_VOLTS: f64 = 3.3;

    /// Full-scale ADC count
    pub const ADC_FULL_SCALE: f64 = 4095.0;

    /// Default canonical sampling rate in Hz
    pub const DEFAULT_SAMPLING_RATE_HZ: u32 = 100;

    /// Minimum buffered signal before beat analysis, in seconds
    pub const BEAT_ANALYSIS_MIN_SECONDS: u32 = 10;

    /// Beat detection history horizon in milliseconds
    pub const BEAT_HISTORY_MS: u64 = 10_000;

    /// Number of BPM readings retained in the statistics history
    pub const BPM_HISTORY_CAPACITY: usize = 100;

    /// Minimum separation between two detected beats in milliseconds
    pub const REFRACTORY_MS: u64 = 300;

    /// Longest plausible RR interval in milliseconds (30 BPM)
    pub const MAX_RR_MS: u64 = 2000;

    /// Heart rate below which the rhythm is bradycardic
    pub const BRADYCARDIA_BPM: u16 = 60;

    /// Heart rate above which the rhythm is tachycardic
    pub const TACHYCARDIA_BPM: u16 = 100;

    /// Heart rate assumed when none has been measured yet
    pub const DEFAULT_HEART_RATE_BPM: u16 = 70;

    /// Highest accepted sampling rate in Hz
    pub const MAX_SAMPLING_RATE_HZ: u32 = 10_000;

    /// Largest buffer a window may occupy, in samples
    pub const MAX_WINDOW_SAMPLES: u64 = 1_000_000;
}

// ============================================================================
// Rounding
// ============================================================================

/// Round half away from zero (positive values round half up).
#[inline]
#[must_use]
pub fn round(value: f64) -> f64 {
    libm::round(value)
}

/// Round to a fixed number of decimal places.
#[inline]
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = libm::pow(10.0, f64::from(decimals));
    libm::round(value * scale) / scale
}

/// Square root.
#[inline]
#[must_use]
pub fn sqrt(value: f64) -> f64 {
    libm::sqrt(value)
}

// ============================================================================
// Statistics
// ============================================================================

/// Arithmetic mean. Returns 0 for an empty slice.
#[must_use]
pub fn mean<T: Copy + Into<f64>>(values: &[T]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|&v| v.into()).sum();
    sum / values.len() as f64
}

/// Population variance (divides by `n`). Returns 0 for an empty slice.
#[must_use]
pub fn variance<T: Copy + Into<f64>>(values: &[T]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values
        .iter()
        .map(|&v| {
            let diff = v.into() - m;
            diff * diff
        })
        .sum();
    sum_sq / values.len() as f64
}

/// Population standard deviation.
#[must_use]
pub fn std_dev<T: Copy + Into<f64>>(values: &[T]) -> f64 {
    libm::sqrt(variance(values))
}

/// Upper median (element at `len / 2` after sorting). Returns 0 for an empty slice.
#[must_use]
pub fn median<T: Copy + Into<f64>>(values: &[T]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.iter().map(|&v| v.into()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted[sorted.len() / 2]
}

/// Central-difference first derivative, zero at both ends.
#[must_use]
pub fn derivative<T: Copy + Into<f64>>(signal: &[T]) -> Vec<f64> {
    let mut out = alloc::vec![0.0; signal.len()];
    if signal.len() < 3 {
        return out;
    }
    for i in 1..signal.len() - 1 {
        out[i] = (signal[i + 1].into() - signal[i - 1].into()) / 2.0;
    }
    out
}

/// Index of the first maximum value.
#[must_use]
pub fn argmax<T: Copy + PartialOrd>(values: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

// ============================================================================
// Conversions
// ============================================================================

/// Convert a duration in milliseconds into a sample count at `rate_hz`.
#[inline]
#[must_use]
pub const fn ms_to_samples(ms: u32, rate_hz: u32) -> usize {
    (ms as u64 * rate_hz as u64 / 1000) as usize
}

/// Sample count of a window of `seconds` at `rate_hz`.
#[inline]
#[must_use]
pub const fn seconds_to_samples(seconds: u32, rate_hz: u32) -> u64 {
    seconds as u64 * rate_hz as u64
}

/// Convert a sample count into milliseconds at `rate_hz`.
#[inline]
#[must_use]
pub fn samples_to_ms(samples: f64, rate_hz: u32) -> f64 {
    samples * 1000.0 / f64::from(rate_hz)
}

/// Duration of one sample period in milliseconds.
#[inline]
#[must_use]
pub fn sample_period_ms(rate_hz: u32) -> f64 {
    1000.0 / f64::from(rate_hz)
}

/// Convert an absolute ADC reading to display volts around the ADC midpoint.
///
/// Presentation only: 2048 maps to 0 V and the 0-4095 range spans 3.3 V.
/// Rounded to 3 decimal places.
#[must_use]
pub fn adc_to_volts(raw: f64) -> f64 {
    amplitude_to_volts(raw - constants::ADC_CENTER)
}

/// Convert an amplitude (difference of ADC counts) to display volts.
#[must_use]
pub fn amplitude_to_volts(counts: f64) -> f64 {
    round_to(
        counts * constants::ADC_REFERENCE_VOLTS / constants::ADC_FULL_SCALE,
        3,
    )
}

/// Instantaneous heart rate for a beat-to-beat interval, rounded.
#[inline]
#[must_use]
pub fn bpm_from_rr_ms(rr_ms: f64) -> f64 {
    libm::round(60_000.0 / rr_ms)
}

/// RR interval in milliseconds implied by a heart rate.
#[inline]
#[must_use]
pub fn rr_ms_from_bpm(bpm: f64) -> f64 {
    60_000.0 / bpm
}

/// Bazett-corrected QT: `QT / sqrt(RR in seconds)`, rounded.
///
/// Returns `None` when the RR interval is not positive.
#[must_use]
pub fn bazett_qtc(qt_ms: f64, rr_ms: f64) -> Option<u32> {
    if rr_ms <= 0.0 {
        return None;
    }
    let qtc = qt_ms / libm::sqrt(rr_ms / 1000.0);
    Some(libm::round(qtc) as u32)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        let diff = a - b;
        diff < 1e-9 && diff > -1e-9
    }

    #[test]
    fn test_mean_variance_std() {
        let values: [u16; 4] = [2, 4, 4, 6];
        assert!(close(mean(&values), 4.0));
        assert!(close(variance(&values), 2.0));
        assert!(close(std_dev(&values), sqrt(2.0)));
    }

    #[test]
    fn test_empty_statistics() {
        let empty: [u16; 0] = [];
        assert_eq!(mean(&empty), 0.0);
        assert_eq!(variance(&empty), 0.0);
        assert_eq!(median(&empty), 0.0);
    }

    #[test]
    fn test_median_upper() {
        assert!(close(median(&[5u16, 1, 3]), 3.0));
        // Even length picks the upper middle element
        assert!(close(median(&[4u16, 1, 3, 2]), 3.0));
    }

    #[test]
    fn test_derivative_central_difference() {
        let d = derivative(&[0u16, 2, 4, 8]);
        assert_eq!(d.len(), 4);
        assert_eq!(d[0], 0.0);
        assert!(close(d[1], 2.0));
        assert!(close(d[2], 3.0));
        assert_eq!(d[3], 0.0);
    }

    #[test]
    fn test_argmax_first_occurrence() {
        assert_eq!(argmax(&[1u16, 9, 3, 9]), Some(1));
        assert_eq!(argmax::<u16>(&[]), None);
    }

    #[test]
    fn test_ms_sample_conversion() {
        assert_eq!(ms_to_samples(300, 100), 30);
        assert_eq!(ms_to_samples(400, 500), 200);
        assert_eq!(seconds_to_samples(10, 100), 1000);
        assert_eq!(seconds_to_samples(u32::MAX, 2), 2 * u64::from(u32::MAX));
        assert!(close(samples_to_ms(12.0, 100), 120.0));
        assert!(close(sample_period_ms(100), 10.0));
    }

    #[test]
    fn test_adc_to_volts() {
        assert!(close(adc_to_volts(2048.0), 0.0));
        // 4095 counts span 3.3 V
        assert!(close(amplitude_to_volts(4095.0), 3.3));
        assert!(close(amplitude_to_volts(1000.0), 0.806));
    }

    #[test]
    fn test_bpm_from_rr() {
        assert!(close(bpm_from_rr_ms(800.0), 75.0));
        assert!(close(bpm_from_rr_ms(286.0), 210.0));
    }

    #[test]
    fn test_bazett_round_trip() {
        assert_eq!(bazett_qtc(400.0, 800.0), Some(447));
        assert_eq!(bazett_qtc(400.0, 1000.0), Some(400));
        assert_eq!(bazett_qtc(400.0, 0.0), None);
    }
}
