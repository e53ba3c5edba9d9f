//! Beat segmentation
//!
//! Cuts a single beat, +/-400 ms around a chosen R peak, out of the last ten
//! seconds of signal.

use heartline_core::config::{BeatSelection, MonitorConfig};
use heartline_core::error::AnalysisError;
use heartline_core::math;
use heartline_core::types::{BeatWindow, StoredSample};

/// Half-width of an extracted beat.
const BEAT_HALF_WIDTH_MS: u32 = 400;

/// Search radius around a tracked beat when selecting the R peak.
const TRACKED_SEARCH_MS: u32 = 50;

/// Extracts beat windows from the analysis buffer.
#[derive(Clone, Debug)]
pub struct BeatSegmenter {
    rate_hz: u32,
    required: usize,
    half_width: usize,
    search_radius: usize,
    selection: BeatSelection,
    min_prominence: f64,
}

impl BeatSegmenter {
    /// Create a segmenter from the monitor configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            rate_hz: config.sampling_rate_hz,
            required: config.beat_analysis_samples(),
            half_width: config.samples_for_ms(BEAT_HALF_WIDTH_MS),
            search_radius: config.samples_for_ms(TRACKED_SEARCH_MS),
            selection: config.beat_selection,
            min_prominence: f64::from(config.min_r_prominence),
        }
    }

    /// Samples required before a beat can be extracted.
    #[must_use]
    pub fn required_samples(&self) -> usize {
        self.required
    }

    /// Extract one beat from the analysis samples (oldest first).
    ///
    /// `tracked_beats` are beat timestamps from the beat tracker, used by
    /// [`BeatSelection::TrackedBeat`].
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InsufficientData`] when fewer than ten seconds are
    /// buffered, [`AnalysisError::NoBeatFound`] when the window has no
    /// prominent peak.
    pub fn extract(
        &self,
        samples: &[StoredSample],
        tracked_beats: &[u64],
    ) -> Result<BeatWindow, AnalysisError> {
        if samples.len() < self.required {
            return Err(self.insufficient(samples.len()));
        }

        let window = &samples[samples.len() - self.required..];
        let values: Vec<u16> = window.iter().map(|s| s.value).collect();

        let r = match self.selection {
            BeatSelection::GlobalMaximum => math::argmax(&values),
            BeatSelection::TrackedBeat => self
                .tracked_peak(window, &values, tracked_beats)
                .or_else(|| math::argmax(&values)),
        }
        .ok_or(AnalysisError::NoBeatFound)?;

        if f64::from(values[r]) - math::median(&values) < self.min_prominence {
            return Err(AnalysisError::NoBeatFound);
        }

        Ok(self.window_around(&values, r))
    }

    /// Cut the beat window around index `r` of `values`.
    ///
    /// The window always contains the R peak itself.
    #[must_use]
    pub fn window_around(&self, values: &[u16], r: usize) -> BeatWindow {
        let start = r.saturating_sub(self.half_width);
        let end = (r + self.half_width).min(values.len());
        let rate = i64::from(self.rate_hz.max(1));

        let timestamps_ms = (start..end)
            .map(|i| (i as i64 - r as i64) * 1000 / rate)
            .collect();

        BeatWindow {
            values: values[start..end].to_vec(),
            timestamps_ms,
            r_peak_index: r - start,
            r_peak_value: values[r],
        }
    }

    fn tracked_peak(
        &self,
        window: &[StoredSample],
        values: &[u16],
        tracked_beats: &[u64],
    ) -> Option<usize> {
        tracked_beats.iter().rev().find_map(|&beat_ms| {
            let centre = window.iter().position(|s| s.timestamp_ms >= beat_ms)?;
            if centre < self.half_width || centre + self.half_width >= values.len() {
                return None;
            }
            let lo = centre.saturating_sub(self.search_radius);
            let hi = (centre + self.search_radius + 1).min(values.len());
            math::argmax(&values[lo..hi]).map(|i| lo + i)
        })
    }

    fn insufficient(&self, available: usize) -> AnalysisError {
        let rate = self.rate_hz.max(1) as usize;
        let missing = self.required - available;
        AnalysisError::InsufficientData {
            seconds_needed: missing.div_ceil(rate) as u32,
            seconds_available: (available / rate) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[u16]) -> Vec<StoredSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| StoredSample {
                value,
                timestamp_ms: i as u64 * 10,
                index: i as u64 + 1,
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data_reports_remaining_seconds() {
        let segmenter = BeatSegmenter::new(&MonitorConfig::default());
        let short = samples(&[2048; 650]);

        assert_eq!(
            segmenter.extract(&short, &[]),
            Err(AnalysisError::InsufficientData {
                seconds_needed: 4,
                seconds_available: 6
            })
        );
        assert_eq!(
            segmenter.extract(&samples(&[2048; 999]), &[]),
            Err(AnalysisError::InsufficientData {
                seconds_needed: 1,
                seconds_available: 9
            })
        );
    }

    #[test]
    fn test_flat_window_has_no_beat() {
        let segmenter = BeatSegmenter::new(&MonitorConfig::default());
        assert_eq!(
            segmenter.extract(&samples(&[2048; 1000]), &[]),
            Err(AnalysisError::NoBeatFound)
        );
    }

    #[test]
    fn test_global_maximum_window() {
        let segmenter = BeatSegmenter::new(&MonitorConfig::default());
        let mut values = vec![2048u16; 1000];
        values[500] = 3600;
        values[700] = 3000;

        let beat = segmenter.extract(&samples(&values), &[]).unwrap();
        assert_eq!(beat.len(), 80);
        assert_eq!(beat.r_peak_index, 40);
        assert_eq!(beat.r_peak_value, 3600);
        assert_eq!(beat.timestamps_ms[0], -400);
        assert_eq!(beat.timestamps_ms[40], 0);
        assert_eq!(beat.timestamps_ms[79], 390);
    }

    #[test]
    fn test_window_clipped_at_buffer_end() {
        let segmenter = BeatSegmenter::new(&MonitorConfig::default());
        let mut values = vec![2048u16; 1000];
        values[995] = 3600;

        let beat = segmenter.extract(&samples(&values), &[]).unwrap();
        assert_eq!(beat.len(), 45);
        assert_eq!(beat.values[beat.r_peak_index], 3600);
    }

    #[test]
    fn test_tracked_beat_selection() {
        let config = MonitorConfig::default().with_beat_selection(BeatSelection::TrackedBeat);
        let segmenter = BeatSegmenter::new(&config);
        let mut values = vec![2048u16; 1000];
        values[300] = 3900; // artifact, tallest in the window
        values[802] = 3200; // true beat near the tracked timestamp

        let beat = segmenter.extract(&samples(&values), &[8_000]).unwrap();
        assert_eq!(beat.r_peak_value, 3200);

        // Without a usable tracked beat the global maximum is used
        let beat = segmenter.extract(&samples(&values), &[9_990]).unwrap();
        assert_eq!(beat.r_peak_value, 3900);
    }
}
