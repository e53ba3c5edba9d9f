//! Clinical interval measurement (PR, QRS, QT, QTc)
//!
//! Every interval is optional: a measurement outside its plausible range is
//! reported as missing. With [`FallbackPolicy::HeartRateEstimate`] missing
//! values are replaced by heart-rate based estimates tagged as such.

use heartline_core::config::FallbackPolicy;
use heartline_core::math::{self, constants};
use heartline_core::types::{BeatWindow, IntervalSet, IntervalValue};

// PR: P peak search window before R and the P-peak to P-onset correction
const PR_SEARCH_START_MS: u32 = 200;
const PR_SEARCH_END_MS: u32 = 80;
const PR_ONSET_CORRECTION_MS: f64 = 30.0;
const PR_MIN_DEVIATION: f64 = 30.0;
const PR_RANGE_MS: (u32, u32) = (80, 300);

const QRS_ONSET_SEARCH_MS: u32 = 100;
const QRS_OFFSET_SEARCH_MS: u32 = 120;
const QRS_BASELINE_TOLERANCE: f64 = 50.0;
const QRS_RANGE_MS: (u32, u32) = (40, 200);

// QT: T peak search window, T-end search offset and QRS-onset correction
const QT_SEARCH_START_MS: u32 = 150;
const QT_SEARCH_END_MS: u32 = 500;
const QT_T_END_SKIP_MS: u32 = 50;
const QT_T_END_FALLBACK_MS: u32 = 350;
const QT_ONSET_CORRECTION_MS: f64 = 50.0;
const QT_T_MIN_DEVIATION: f64 = 20.0;
const QT_T_END_TOLERANCE: f64 = 30.0;
const QT_RANGE_MS: (u32, u32) = (250, 600);

// Heart-rate based estimates
const TYPICAL_PR_MS: f64 = 160.0;
const TYPICAL_QRS_MS: u32 = 100;
const TYPICAL_QTC_MS: f64 = 400.0;

/// R index when it points inside a non-empty window.
fn r_peak(beat: &BeatWindow) -> Option<usize> {
    (beat.r_peak_index < beat.values.len()).then_some(beat.r_peak_index)
}

fn in_range(value: f64, (lo, hi): (u32, u32)) -> Option<u32> {
    let rounded = math::round(value);
    (rounded >= f64::from(lo) && rounded <= f64::from(hi)).then_some(rounded as u32)
}

/// Baseline from the median of the first and last 10 % of the beat.
#[must_use]
pub fn edge_baseline(values: &[u16]) -> f64 {
    let edge = values.len() / 10;
    let edges: Vec<u16> = values[..edge]
        .iter()
        .chain(&values[values.len() - edge..])
        .copied()
        .collect();
    if edges.is_empty() {
        math::mean(values)
    } else {
        math::median(&edges)
    }
}

/// Computes PR/QRS/QT/QTc for a beat window.
#[derive(Clone, Debug)]
pub struct IntervalCalculator {
    rate_hz: u32,
    period_ms: f64,
    fallback: FallbackPolicy,
}

impl IntervalCalculator {
    /// Create a calculator.
    #[must_use]
    pub fn new(rate_hz: u32, fallback: FallbackPolicy) -> Self {
        Self {
            rate_hz,
            period_ms: math::sample_period_ms(rate_hz),
            fallback,
        }
    }

    fn samples(&self, ms: u32) -> usize {
        math::ms_to_samples(ms, self.rate_hz)
    }

    /// Measure all intervals.
    ///
    /// `rr_ms` is the most recent measured RR interval; without it QTc uses
    /// the RR implied by `current_bpm`.
    #[must_use]
    pub fn calculate(&self, beat: &BeatWindow, rr_ms: Option<u32>, current_bpm: u16) -> IntervalSet {
        let mut set = IntervalSet {
            rr: rr_ms,
            ..IntervalSet::default()
        };
        if r_peak(beat).is_none() {
            return self.apply_fallback(set, current_bpm);
        }

        let baseline = edge_baseline(&beat.values);
        set.pr = self.pr_interval(beat, baseline).map(IntervalValue::Measured);
        set.qrs = self.qrs_duration(beat, baseline).map(IntervalValue::Measured);
        set.qt = self.qt_interval(beat, baseline).map(IntervalValue::Measured);
        set.qtc = set
            .qt
            .and_then(|qt| qtc_for(qt.ms(), rr_ms, current_bpm))
            .map(IntervalValue::Measured);

        self.apply_fallback(set, current_bpm)
    }

    /// PR interval from the most prominent P peak before R.
    ///
    /// Candidates span the whole R-200..R-80 ms search range; their +/-2
    /// sample neighbours may lie just outside it.
    #[must_use]
    pub fn pr_interval(&self, beat: &BeatWindow, baseline: f64) -> Option<u32> {
        let values = &beat.values;
        let r = r_peak(beat)?;
        let start = r.saturating_sub(self.samples(PR_SEARCH_START_MS)).max(2);
        let end = r
            .saturating_sub(self.samples(PR_SEARCH_END_MS))
            .min(values.len().saturating_sub(2));

        let mut best: Option<(usize, f64)> = None;
        for i in start..end {
            let v = values[i];
            let deviation = (f64::from(v) - baseline).abs();
            let is_local_max = v > values[i - 1]
                && v > values[i + 1]
                && v > values[i - 2]
                && v > values[i + 2];
            if deviation > PR_MIN_DEVIATION
                && is_local_max
                && best.map_or(true, |(_, d)| deviation > d)
            {
                best = Some((i, deviation));
            }
        }

        let (p, _) = best?;
        let pr = (r - p) as f64 * self.period_ms - PR_ONSET_CORRECTION_MS;
        in_range(pr, PR_RANGE_MS)
    }

    /// QRS duration from baseline crossings around R.
    #[must_use]
    pub fn qrs_duration(&self, beat: &BeatWindow, baseline: f64) -> Option<u32> {
        let values = &beat.values;
        let r = r_peak(beat)?;
        let near_baseline = |i: usize| (f64::from(values[i]) - baseline).abs() < QRS_BASELINE_TOLERANCE;

        let onset_limit = r.saturating_sub(self.samples(QRS_ONSET_SEARCH_MS));
        let onset = (onset_limit..r).rev().find(|&i| near_baseline(i)).unwrap_or(r);

        let offset_limit = (r + self.samples(QRS_OFFSET_SEARCH_MS)).min(values.len() - 1);
        let offset = (r + 1..=offset_limit)
            .find(|&i| near_baseline(i))
            .unwrap_or(r);

        let duration = offset.saturating_sub(onset) as f64 * self.period_ms;
        in_range(duration, QRS_RANGE_MS)
    }

    /// QT interval from R to the end of the T wave.
    #[must_use]
    pub fn qt_interval(&self, beat: &BeatWindow, baseline: f64) -> Option<u32> {
        let values = &beat.values;
        let r = r_peak(beat)?;
        let last = values.len() - 1;
        let start = (r + self.samples(QT_SEARCH_START_MS)).min(last);
        let end = (r + self.samples(QT_SEARCH_END_MS)).min(last);
        let deviation = |i: usize| (f64::from(values[i]) - baseline).abs();

        let mut t_peak: Option<(usize, f64)> = None;
        for i in start..end {
            let d = deviation(i);
            if d > QT_T_MIN_DEVIATION && t_peak.map_or(true, |(_, best)| d > best) {
                t_peak = Some((i, d));
            }
        }
        let (t_peak, _) = t_peak?;

        let t_end = (t_peak + self.samples(QT_T_END_SKIP_MS)..end)
            .find(|&i| deviation(i) < QT_T_END_TOLERANCE)
            .unwrap_or(r + self.samples(QT_T_END_FALLBACK_MS));

        let qt = (t_end - r) as f64 * self.period_ms + QT_ONSET_CORRECTION_MS;
        in_range(qt, QT_RANGE_MS)
    }

    fn apply_fallback(&self, mut set: IntervalSet, current_bpm: u16) -> IntervalSet {
        if self.fallback == FallbackPolicy::Disabled {
            return set;
        }

        let hr = if current_bpm == 0 {
            f64::from(constants::DEFAULT_HEART_RATE_BPM)
        } else {
            f64::from(current_bpm)
        };
        let default_hr = f64::from(constants::DEFAULT_HEART_RATE_BPM);

        if set.pr.is_none() {
            let pr = math::round(TYPICAL_PR_MS + (default_hr - hr) * 0.5).max(0.0);
            set.pr = Some(IntervalValue::Estimated(pr as u32));
        }
        if set.qrs.is_none() {
            set.qrs = Some(IntervalValue::Estimated(TYPICAL_QRS_MS));
        }
        if set.qt.is_none() {
            let qt = math::round(TYPICAL_QTC_MS * math::sqrt(60.0 / hr));
            set.qt = Some(IntervalValue::Estimated(qt as u32));
        }
        if set.qtc.is_none() {
            set.qtc = set.qt.and_then(|qt| {
                let qtc = qtc_for(qt.ms(), set.rr, hr as u16)?;
                Some(IntervalValue::Estimated(qtc))
            });
        }
        set
    }
}

/// Bazett QTc using the measured RR, else the RR implied by `bpm`.
#[must_use]
pub fn qtc_for(qt_ms: u32, rr_ms: Option<u32>, bpm: u16) -> Option<u32> {
    let rr = match rr_ms {
        Some(rr) if rr > 0 => f64::from(rr),
        _ if bpm > 0 => math::rr_ms_from_bpm(f64::from(bpm)),
        _ => return None,
    };
    math::bazett_qtc(f64::from(qt_ms), rr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::test_fixtures::synthetic_beat_window;

    fn flat_beat() -> BeatWindow {
        BeatWindow {
            values: vec![2048; 80],
            timestamps_ms: (0..80).map(|i| (i - 40) * 10).collect(),
            r_peak_index: 40,
            r_peak_value: 2048,
        }
    }

    #[test]
    fn test_measurements_reject_inconsistent_windows() {
        let calc = IntervalCalculator::new(100, FallbackPolicy::Disabled);
        let empty = BeatWindow {
            values: Vec::new(),
            timestamps_ms: Vec::new(),
            r_peak_index: 0,
            r_peak_value: 0,
        };
        let mut past_end = synthetic_beat_window();
        past_end.r_peak_index = 80;

        for beat in [&empty, &past_end] {
            assert_eq!(calc.pr_interval(beat, 2048.0), None);
            assert_eq!(calc.qrs_duration(beat, 2048.0), None);
            assert_eq!(calc.qt_interval(beat, 2048.0), None);
        }
    }

    #[test]
    fn test_pr_peak_at_search_start() {
        // P peak exactly 200 ms before R; its left neighbours sit outside the range
        let mut beat = flat_beat();
        beat.values[18] = 2100;
        beat.values[19] = 2150;
        beat.values[20] = 2200;
        beat.values[21] = 2150;
        beat.values[22] = 2100;

        let calc = IntervalCalculator::new(100, FallbackPolicy::Disabled);
        assert_eq!(calc.pr_interval(&beat, 2048.0), Some(170));

        // A rise continuing from outside the range is not a local maximum
        beat.values[19] = 2250;
        assert_eq!(calc.pr_interval(&beat, 2048.0), None);
    }

    #[test]
    fn test_edge_baseline_uses_median() {
        let mut values = vec![2048u16; 100];
        values[0] = 4000;
        assert!((edge_baseline(&values) - 2048.0).abs() < 1e-9);
        assert!((edge_baseline(&[2000, 2100]) - 2050.0).abs() < 1e-9);
    }

    #[test]
    fn test_measured_intervals() {
        let calc = IntervalCalculator::new(100, FallbackPolicy::Disabled);
        let set = calc.calculate(&synthetic_beat_window(), Some(800), 75);

        assert_eq!(set.pr, Some(IntervalValue::Measured(170)));
        assert_eq!(set.qrs, Some(IntervalValue::Measured(60)));
        assert_eq!(set.qt, Some(IntervalValue::Measured(350)));
        assert_eq!(set.qtc, Some(IntervalValue::Measured(391)));
        assert_eq!(set.rr, Some(800));
    }

    #[test]
    fn test_qtc_from_current_bpm() {
        // 75 BPM implies RR 800 ms
        assert_eq!(qtc_for(400, None, 75), Some(447));
        assert_eq!(qtc_for(400, Some(1000), 75), Some(400));
        assert_eq!(qtc_for(400, None, 0), None);
    }

    #[test]
    fn test_unmeasurable_is_none_without_fallback() {
        let calc = IntervalCalculator::new(100, FallbackPolicy::Disabled);
        let set = calc.calculate(&flat_beat(), None, 0);

        assert_eq!(set.pr, None);
        assert_eq!(set.qrs, None);
        assert_eq!(set.qt, None);
        assert_eq!(set.qtc, None);
    }

    #[test]
    fn test_fallback_estimates_are_tagged() {
        let calc = IntervalCalculator::new(100, FallbackPolicy::HeartRateEstimate);
        let set = calc.calculate(&flat_beat(), None, 60);

        assert_eq!(set.pr, Some(IntervalValue::Estimated(165)));
        assert_eq!(set.qrs, Some(IntervalValue::Estimated(100)));
        assert_eq!(set.qt, Some(IntervalValue::Estimated(400)));
        assert_eq!(set.qtc, Some(IntervalValue::Estimated(400)));
    }

    #[test]
    fn test_fallback_keeps_measured_values() {
        let calc = IntervalCalculator::new(100, FallbackPolicy::HeartRateEstimate);
        let set = calc.calculate(&synthetic_beat_window(), Some(800), 75);
        assert_eq!(set.pr, Some(IntervalValue::Measured(170)));
        assert!(!set.qt.is_some_and(IntervalValue::is_estimated));
    }
}
