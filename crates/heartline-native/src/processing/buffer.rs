//! Bounded sample buffers
//!
//! Two FIFO windows over the same validated stream: a short display window
//! for charting and quality scoring, and a longer analysis window for beat
//! tracking and on-demand beat analysis.

use std::collections::VecDeque;

use heartline_core::config::MonitorConfig;
use heartline_core::error::SampleError;
use heartline_core::types::{Sample, StoredSample};

/// Display and analysis ring buffers fed by `ingest`.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    raw: VecDeque<StoredSample>,
    analysis: VecDeque<StoredSample>,
    raw_capacity: usize,
    analysis_capacity: usize,
    data_count: u64,
    last_sample_at: Option<u64>,
}

impl SampleBuffer {
    /// Create buffers with explicit capacities (in samples).
    #[must_use]
    pub fn new(raw_capacity: usize, analysis_capacity: usize) -> Self {
        Self {
            raw: VecDeque::with_capacity(raw_capacity + 1),
            analysis: VecDeque::with_capacity(analysis_capacity + 1),
            raw_capacity,
            analysis_capacity,
            data_count: 0,
            last_sample_at: None,
        }
    }

    /// Create buffers sized from the configured windows.
    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.raw_capacity(), config.analysis_capacity())
    }

    /// Validate and append a sample, evicting the oldest entries on overflow.
    ///
    /// Rejected samples leave both buffers and the counters untouched.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the sample.
    pub fn push(&mut self, sample: &Sample) -> Result<StoredSample, SampleError> {
        let value = sample.validated()?;

        self.data_count += 1;
        let stored = StoredSample {
            value,
            timestamp_ms: sample.timestamp_ms,
            index: self.data_count,
        };

        self.raw.push_back(stored);
        while self.raw.len() > self.raw_capacity {
            self.raw.pop_front();
        }

        self.analysis.push_back(stored);
        while self.analysis.len() > self.analysis_capacity {
            self.analysis.pop_front();
        }

        self.last_sample_at = Some(sample.timestamp_ms);
        Ok(stored)
    }

    /// Display window, oldest first.
    #[must_use]
    pub fn raw(&self) -> &VecDeque<StoredSample> {
        &self.raw
    }

    /// Analysis window, oldest first.
    #[must_use]
    pub fn analysis(&self) -> &VecDeque<StoredSample> {
        &self.analysis
    }

    /// The last `n` display values, oldest first.
    #[must_use]
    pub fn recent_raw(&self, n: usize) -> Vec<u16> {
        let skip = self.raw.len().saturating_sub(n);
        self.raw.iter().skip(skip).map(|s| s.value).collect()
    }

    /// Copy of the analysis window values.
    #[must_use]
    pub fn analysis_values(&self) -> Vec<u16> {
        self.analysis.iter().map(|s| s.value).collect()
    }

    /// Display buffer capacity.
    #[must_use]
    pub fn raw_capacity(&self) -> usize {
        self.raw_capacity
    }

    /// Analysis buffer capacity.
    #[must_use]
    pub fn analysis_capacity(&self) -> usize {
        self.analysis_capacity
    }

    /// Accepted samples since the last clear.
    #[must_use]
    pub fn data_count(&self) -> u64 {
        self.data_count
    }

    /// Timestamp of the most recently accepted sample.
    #[must_use]
    pub fn last_sample_at(&self) -> Option<u64> {
        self.last_sample_at
    }

    /// Discard all samples and counters.
    pub fn clear(&mut self) {
        self.raw.clear();
        self.analysis.clear();
        self.data_count = 0;
        self.last_sample_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_eviction_preserves_order() {
        let mut buffer = SampleBuffer::new(4, 8);
        for i in 0..5u32 {
            buffer
                .push(&Sample::new(2000 + i as i32, u64::from(i) * 10, i))
                .unwrap();
        }

        let values: Vec<u16> = buffer.raw().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2001, 2002, 2003, 2004]);
        assert_eq!(buffer.raw().len(), buffer.raw_capacity());
        assert_eq!(buffer.analysis().len(), 5);
        assert_eq!(buffer.data_count(), 5);
        assert_eq!(buffer.last_sample_at(), Some(40));
    }

    #[test]
    fn test_rejected_sample_leaves_buffers_untouched() {
        let mut buffer = SampleBuffer::new(4, 8);
        buffer.push(&Sample::new(2048, 0, 0)).unwrap();

        let err = buffer.push(&Sample::new(4096, 10, 1)).unwrap_err();
        assert!(matches!(err, SampleError::OutOfRange { value: 4096, .. }));
        assert_eq!(buffer.raw().len(), 1);
        assert_eq!(buffer.data_count(), 1);
        assert_eq!(buffer.last_sample_at(), Some(0));
    }

    #[test]
    fn test_recent_raw_and_clear() {
        let config = MonitorConfig::default();
        let mut buffer = SampleBuffer::from_config(&config);
        for i in 0..450u32 {
            buffer.push(&Sample::new(1000 + i as i32, u64::from(i) * 10, i)).unwrap();
        }

        assert_eq!(buffer.raw().len(), 400);
        assert_eq!(buffer.recent_raw(3), vec![1447, 1448, 1449]);
        assert_eq!(buffer.analysis_values().len(), 450);

        buffer.clear();
        assert!(buffer.raw().is_empty());
        assert!(buffer.analysis().is_empty());
        assert_eq!(buffer.data_count(), 0);
        assert_eq!(buffer.last_sample_at(), None);
    }
}
