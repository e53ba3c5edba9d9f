//! Continuous beat tracking and rhythm classification
//!
//! The [`BeatTracker`] keeps timestamps of confirmed beats over the last ten
//! seconds. Consecutive gaps form the RR series used for regularity.

use std::collections::VecDeque;

use heartline_core::math::{self, constants};
use heartline_core::types::{Regularity, Rhythm, RhythmClass, StoredSample};

/// Threshold multiplier for tracked beats.
const TRACKER_THRESHOLD_FACTOR: f64 = 1.5;

/// Tracks beat timestamps from the streaming analysis window.
#[derive(Clone, Debug)]
pub struct BeatTracker {
    beats: VecDeque<u64>,
    scan_samples: usize,
    refractory_ms: u64,
    history_ms: u64,
}

impl BeatTracker {
    /// Create a tracker scanning the last second of signal at `rate_hz`.
    #[must_use]
    pub fn new(rate_hz: u32, refractory_ms: u64) -> Self {
        Self {
            beats: VecDeque::new(),
            scan_samples: rate_hz as usize,
            refractory_ms,
            history_ms: constants::BEAT_HISTORY_MS,
        }
    }

    /// Scan the tail of the analysis window. Returns the newest beat found.
    pub fn update(&mut self, window: &VecDeque<StoredSample>) -> Option<u64> {
        let newest = window.back()?.timestamp_ms;
        let mut found = None;

        if window.len() >= self.scan_samples && self.scan_samples >= 3 {
            let tail: Vec<StoredSample> = window
                .iter()
                .skip(window.len() - self.scan_samples)
                .copied()
                .collect();
            let values: Vec<u16> = tail.iter().map(|s| s.value).collect();
            let threshold = math::mean(&values) + TRACKER_THRESHOLD_FACTOR * math::std_dev(&values);

            for i in 1..tail.len() - 1 {
                let v = values[i];
                let is_peak = f64::from(v) > threshold && v > values[i - 1] && v > values[i + 1];
                if !is_peak {
                    continue;
                }
                let t = tail[i].timestamp_ms;
                let clear_of_last = self
                    .beats
                    .back()
                    .map_or(true, |&last| t > last + self.refractory_ms);
                if clear_of_last {
                    self.beats.push_back(t);
                    found = Some(t);
                }
            }
        }

        while let Some(&oldest) = self.beats.front() {
            if newest.saturating_sub(oldest) > self.history_ms {
                self.beats.pop_front();
            } else {
                break;
            }
        }
        found
    }

    /// Tracked beat timestamps, oldest first.
    #[must_use]
    pub fn beats(&self) -> &VecDeque<u64> {
        &self.beats
    }

    /// Gaps between consecutive tracked beats (ms).
    #[must_use]
    pub fn rr_intervals(&self) -> Vec<u64> {
        self.beats
            .iter()
            .zip(self.beats.iter().skip(1))
            .map(|(a, b)| b - a)
            .collect()
    }

    /// Most recent RR interval (ms).
    #[must_use]
    pub fn last_rr(&self) -> Option<u32> {
        let n = self.beats.len();
        if n < 2 {
            return None;
        }
        Some((self.beats[n - 1] - self.beats[n - 2]) as u32)
    }

    /// Forget all beats.
    pub fn clear(&mut self) {
        self.beats.clear();
    }
}

/// RR variability percentage: `stddev / mean * 100`.
#[must_use]
pub fn rr_variability_percent(rr_ms: &[u64]) -> Option<f64> {
    if rr_ms.is_empty() {
        return None;
    }
    let values: Vec<f64> = rr_ms.iter().map(|&rr| rr as f64).collect();
    let mean = math::mean(&values);
    if mean <= 0.0 {
        return None;
    }
    Some(math::std_dev(&values) * 100.0 / mean)
}

/// Classify rhythm from the RR series and the current heart rate.
///
/// Fewer than three beats (two RR intervals) yields insufficient data.
#[must_use]
pub fn classify_rhythm(rr_ms: &[u64], current_bpm: u16) -> Rhythm {
    if rr_ms.len() < 2 {
        return Rhythm {
            regularity: Regularity::InsufficientData,
            classification: RhythmClass::Unknown,
            variability_percent: None,
        };
    }

    let variability = rr_variability_percent(rr_ms);
    let regularity = variability.map_or(Regularity::Unknown, Regularity::from_variability);
    let classification = if current_bpm == 0 {
        RhythmClass::Unknown
    } else {
        RhythmClass::from_bpm(current_bpm)
    };

    Rhythm {
        regularity,
        classification,
        variability_percent: variability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_with_spikes(spikes_at: &[usize], len: usize) -> VecDeque<StoredSample> {
        (0..len)
            .map(|i| StoredSample {
                value: if spikes_at.contains(&i) { 3500 } else { 2048 },
                timestamp_ms: i as u64 * 10,
                index: i as u64 + 1,
            })
            .collect()
    }

    #[test]
    fn test_regularity_boundaries() {
        // stddev 100 over mean 1000 is exactly 10 %
        let rhythm = classify_rhythm(&[900, 1100], 75);
        assert_eq!(rhythm.regularity, Regularity::SlightlyIrregular);
        assert_eq!(rhythm.variability_percent, Some(10.0));

        // stddev 200 over mean 1000 is exactly 20 %
        let rhythm = classify_rhythm(&[800, 1200], 75);
        assert_eq!(rhythm.regularity, Regularity::Irregular);

        let rhythm = classify_rhythm(&[800, 800, 810], 75);
        assert_eq!(rhythm.regularity, Regularity::Regular);
        assert_eq!(rhythm.classification, RhythmClass::NormalSinus);
    }

    #[test]
    fn test_insufficient_beats() {
        let rhythm = classify_rhythm(&[800], 75);
        assert_eq!(rhythm.regularity, Regularity::InsufficientData);
        assert_eq!(rhythm.classification, RhythmClass::Unknown);
        assert_eq!(rhythm.regularity.label(), "Insufficient data");
    }

    #[test]
    fn test_classification_from_bpm() {
        assert_eq!(
            classify_rhythm(&[1200, 1200], 50).classification,
            RhythmClass::Bradycardia
        );
        assert_eq!(
            classify_rhythm(&[500, 500], 120).classification,
            RhythmClass::Tachycardia
        );
    }

    #[test]
    fn test_tracker_needs_one_second() {
        let mut tracker = BeatTracker::new(100, 300);
        let window = window_with_spikes(&[50], 99);
        assert_eq!(tracker.update(&window), None);
        assert!(tracker.beats().is_empty());
    }

    #[test]
    fn test_tracker_records_and_spaces_beats() {
        let mut tracker = BeatTracker::new(100, 300);
        let window = window_with_spikes(&[20, 40, 80], 100);

        // 200 ms after the first spike is inside the refractory gap
        assert_eq!(tracker.update(&window), Some(800));
        let beats: Vec<u64> = tracker.beats().iter().copied().collect();
        assert_eq!(beats, vec![200, 800]);
        assert_eq!(tracker.last_rr(), Some(600));

        // Rescanning the same window adds nothing
        assert_eq!(tracker.update(&window), None);
        assert_eq!(tracker.rr_intervals(), vec![600]);
    }

    #[test]
    fn test_tracker_prunes_by_age() {
        let mut tracker = BeatTracker::new(100, 300);
        tracker.update(&window_with_spikes(&[50], 100));
        assert_eq!(tracker.beats().len(), 1);

        // Newest sample 10.5 s after the beat
        let late: VecDeque<StoredSample> = (0..100)
            .map(|i| StoredSample {
                value: 2048,
                timestamp_ms: 10_010 + i * 10,
                index: 1000 + i,
            })
            .collect();
        assert_eq!(tracker.update(&late), None);
        assert!(tracker.beats().is_empty());
    }
}
