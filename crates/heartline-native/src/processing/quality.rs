//! Signal quality scoring
//!
//! A rolling-variance noise proxy: flat, quiet signal scores high and noisy
//! signal scores low. This is a display heuristic, not a clinical SNR.

use heartline_core::config::QualityConfig;
use heartline_core::math;

use super::buffer::SampleBuffer;

/// Quality percentage for a window variance: `round(clamp(100 - var / divisor, 0, 100))`.
#[must_use]
pub fn quality_from_variance(variance: f64, divisor: f64) -> u8 {
    let score = (100.0 - variance / divisor).clamp(0.0, 100.0);
    math::round(score) as u8
}

/// Variance-based quality estimator.
#[derive(Clone, Debug)]
pub struct SignalQualityEstimator {
    config: QualityConfig,
    last_percent: Option<u8>,
}

impl SignalQualityEstimator {
    /// Create an estimator.
    #[must_use]
    pub fn new(config: QualityConfig) -> Self {
        Self {
            config,
            last_percent: None,
        }
    }

    /// Score the display buffer. Returns 0 until enough samples exist.
    #[must_use]
    pub fn score(&self, buffer: &SampleBuffer) -> u8 {
        if buffer.raw().len() < self.config.min_samples {
            return 0;
        }
        let recent = buffer.recent_raw(self.config.window);
        quality_from_variance(math::variance(&recent), self.config.variance_divisor)
    }

    /// Rescore and return the new percentage only if it changed.
    pub fn update(&mut self, buffer: &SampleBuffer) -> Option<u8> {
        let percent = self.score(buffer);
        if self.last_percent == Some(percent) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }

    /// Last reported percentage (0 before the first update).
    #[must_use]
    pub fn current(&self) -> u8 {
        self.last_percent.unwrap_or(0)
    }

    /// Forget the last reported value.
    pub fn reset(&mut self) {
        self.last_percent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartline_core::types::Sample;

    fn filled(values: &[i32]) -> SampleBuffer {
        let mut buffer = SampleBuffer::new(400, 1000);
        for (i, &v) in values.iter().enumerate() {
            buffer.push(&Sample::new(v, i as u64 * 10, i as u32)).unwrap();
        }
        buffer
    }

    #[test]
    fn test_fewer_than_ten_samples_scores_zero() {
        let estimator = SignalQualityEstimator::new(QualityConfig::default());
        let buffer = filled(&[2048; 9]);
        assert_eq!(estimator.score(&buffer), 0);
    }

    #[test]
    fn test_constant_signal_scores_100() {
        let estimator = SignalQualityEstimator::new(QualityConfig::default());
        let buffer = filled(&[2048; 20]);
        assert_eq!(estimator.score(&buffer), 100);
    }

    #[test]
    fn test_hand_computed_variance() {
        // Alternating +/-100 around 2100: population variance 10_000
        let values: Vec<i32> = (0..20).map(|i| if i % 2 == 0 { 2000 } else { 2200 }).collect();
        let estimator = SignalQualityEstimator::new(QualityConfig::default());
        assert_eq!(estimator.score(&filled(&values)), 90);
    }

    #[test]
    fn test_only_last_window_counts() {
        let mut values = vec![0; 30];
        values.extend(std::iter::repeat(2048).take(20));
        let estimator = SignalQualityEstimator::new(QualityConfig::default());
        assert_eq!(estimator.score(&filled(&values)), 100);
    }

    #[test]
    fn test_clamped_at_zero() {
        assert_eq!(quality_from_variance(250_000.0, 1000.0), 0);
        assert_eq!(quality_from_variance(12_400.0, 1000.0), 88);
    }

    #[test]
    fn test_update_reports_changes_only() {
        let mut estimator = SignalQualityEstimator::new(QualityConfig::default());
        let buffer = filled(&[2048; 20]);
        assert_eq!(estimator.update(&buffer), Some(100));
        assert_eq!(estimator.update(&buffer), None);
        assert_eq!(estimator.current(), 100);
    }
}
