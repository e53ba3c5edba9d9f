//! Adaptive R-peak detection and instantaneous heart rate
//!
//! The threshold tracks `mean + k * stddev` of the most recent values. A
//! sample above the threshold that falls outside the refractory period is a
//! peak; the gap to the previous peak yields an instantaneous BPM that is
//! kept only when physiologically plausible.

use std::collections::VecDeque;

use heartline_core::config::PeakDetectorConfig;
use heartline_core::math;

/// Result of a detected peak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeakEvent {
    /// First peak, or the gap to the previous one is too long to rate
    Unpaired {
        /// Peak timestamp (ms)
        timestamp_ms: u64,
    },
    /// Instantaneous BPM within the accepted range
    Accepted {
        /// Peak timestamp (ms)
        timestamp_ms: u64,
        /// Gap to the previous peak (ms)
        interval_ms: u64,
        /// Instantaneous BPM
        bpm: u16,
    },
    /// Instantaneous BPM outside the accepted range, discarded as noise
    Rejected {
        /// Peak timestamp (ms)
        timestamp_ms: u64,
        /// Gap to the previous peak (ms)
        interval_ms: u64,
        /// Computed BPM
        bpm: u32,
    },
}

impl PeakEvent {
    /// Accepted BPM, if any.
    #[must_use]
    pub fn accepted_bpm(&self) -> Option<u16> {
        match self {
            Self::Accepted { bpm, .. } => Some(*bpm),
            _ => None,
        }
    }
}

/// Instantaneous BPM for a peak-to-peak gap, `round(60000 / interval)`.
#[must_use]
pub fn bpm_from_interval(interval_ms: u64) -> u32 {
    if interval_ms == 0 {
        return 0;
    }
    math::bpm_from_rr_ms(interval_ms as f64) as u32
}

/// Streaming adaptive-threshold peak detector.
#[derive(Clone, Debug)]
pub struct PeakDetector {
    config: PeakDetectorConfig,
    history: VecDeque<u16>,
    threshold: f64,
    last_peak_ms: Option<u64>,
}

impl PeakDetector {
    /// Create a detector.
    #[must_use]
    pub fn new(config: PeakDetectorConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_len + 1),
            threshold: config.default_threshold,
            last_peak_ms: None,
            config,
        }
    }

    /// Feed one validated value. Returns an event when the value is a peak.
    pub fn update(&mut self, value: u16, timestamp_ms: u64) -> Option<PeakEvent> {
        self.history.push_back(value);
        while self.history.len() > self.config.history_len {
            self.history.pop_front();
        }
        if self.history.len() >= self.config.warmup {
            let (front, back) = self.history.as_slices();
            let values: Vec<u16> = front.iter().chain(back).copied().collect();
            self.threshold = math::mean(&values) + self.config.threshold_factor * math::std_dev(&values);
        }

        if f64::from(value) <= self.threshold {
            return None;
        }

        let since_last = self
            .last_peak_ms
            .map(|last| timestamp_ms.saturating_sub(last));
        if let Some(dt) = since_last {
            if dt <= self.config.refractory_ms {
                return None;
            }
        }

        // Refractory timing follows every candidate, rated or not
        self.last_peak_ms = Some(timestamp_ms);

        let event = match since_last {
            Some(interval_ms) if interval_ms < self.config.max_gap_ms => {
                let bpm = bpm_from_interval(interval_ms);
                let range = u32::from(self.config.min_bpm)..=u32::from(self.config.max_bpm);
                if range.contains(&bpm) {
                    PeakEvent::Accepted {
                        timestamp_ms,
                        interval_ms,
                        bpm: bpm as u16,
                    }
                } else {
                    PeakEvent::Rejected {
                        timestamp_ms,
                        interval_ms,
                        bpm,
                    }
                }
            }
            _ => PeakEvent::Unpaired { timestamp_ms },
        };
        Some(event)
    }

    /// Current adaptive threshold (raw units).
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Timestamp of the last detected peak.
    #[must_use]
    pub fn last_peak_ms(&self) -> Option<u64> {
        self.last_peak_ms
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.history.clear();
        self.threshold = self.config.default_threshold;
        self.last_peak_ms = None;
    }
}
