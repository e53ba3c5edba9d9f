//! The streaming ECG analysis engine
//!
//! [`HeartMonitor`] owns every buffer and analysis stage of one session.
//! Each call runs to completion; there is no internal concurrency.
//!
//! ```rust
//! use heartline_core::{MonitorConfig, Sample};
//! use heartline_native::engine::{HeartMonitor, IngestOutcome};
//! use heartline_native::events::MonitorEvent;
//!
//! let mut monitor = HeartMonitor::new(MonitorConfig::default()).unwrap();
//! let mut events: Vec<MonitorEvent> = Vec::new();
//!
//! let outcome = monitor.ingest(&Sample::new(2048, 0, 0), &mut events);
//! assert_eq!(outcome, IngestOutcome::Accepted);
//! assert!(monitor.analyze_beat(&mut events).is_err());
//! ```

use heartline_core::config::MonitorConfig;
use heartline_core::error::{AnalysisError, ConfigError, SampleError};
use heartline_core::types::{
    AbnormalityConditions, BeatWindow, BpmStats, EcgPoint, IntervalSet, MorphologyState,
    QualityUpdate, Sample, StoredSample,
};

use crate::events::{EventSink, MonitorEvent};
use crate::processing::rhythm::classify_rhythm;
use crate::processing::{
    AbnormalityDetector, BeatSegmenter, BeatTracker, IntervalCalculator, MorphologyAnalyzer,
    PeakDetector, PeakEvent, SampleBuffer, SignalQualityEstimator,
};
use crate::report::TenSecondSummary;

/// Number of leading samples traced at the start of a session.
const TRACED_SAMPLES: u64 = 5;

/// Result of [`HeartMonitor::ingest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Sample entered the buffers
    Accepted,
    /// Sample was dropped
    Rejected(SampleError),
}

/// Result of an on-demand beat analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct BeatAnalysis {
    /// The extracted beat
    pub beat: BeatWindow,
    /// Morphology of the beat plus the live rhythm
    pub morphology: MorphologyState,
    /// Intervals measured on the beat
    pub intervals: IntervalSet,
}

/// Single-channel ECG monitor.
#[derive(Clone, Debug)]
pub struct HeartMonitor {
    config: MonitorConfig,
    buffer: SampleBuffer,
    peaks: PeakDetector,
    bpm: BpmStats,
    quality: SignalQualityEstimator,
    tracker: BeatTracker,
    segmenter: BeatSegmenter,
    morphology: MorphologyAnalyzer,
    calculator: IntervalCalculator,
    abnormality: AbnormalityDetector,
    state: MorphologyState,
    intervals: IntervalSet,
}

impl HeartMonitor {
    /// Create a monitor from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the configuration error reported by [`MonitorConfig::validate`].
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MonitorConfig) -> Self {
        let rate = config.sampling_rate_hz;
        Self {
            buffer: SampleBuffer::from_config(&config),
            peaks: PeakDetector::new(config.peaks),
            bpm: BpmStats::new(),
            quality: SignalQualityEstimator::new(config.quality),
            tracker: BeatTracker::new(rate, config.peaks.refractory_ms),
            segmenter: BeatSegmenter::new(&config),
            morphology: MorphologyAnalyzer::new(rate),
            calculator: IntervalCalculator::new(rate, config.intervals.fallback),
            abnormality: AbnormalityDetector::new(config.alerts),
            state: MorphologyState::default(),
            intervals: IntervalSet::default(),
            config,
        }
    }

    /// Ingest one sample and push the resulting events into `sink`.
    pub fn ingest(&mut self, sample: &Sample, sink: &mut dyn EventSink) -> IngestOutcome {
        let stored = match self.buffer.push(sample) {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!("Dropped sample #{}: {}", sample.sequence, error);
                sink.emit(MonitorEvent::Rejected {
                    sequence: sample.sequence,
                    error,
                });
                return IngestOutcome::Rejected(error);
            }
        };

        if stored.index <= TRACED_SAMPLES {
            tracing::trace!(
                "Sample {}: value={} t={}ms",
                stored.index,
                stored.value,
                stored.timestamp_ms
            );
        }

        sink.emit(MonitorEvent::Point(EcgPoint {
            t: (stored.index - 1) as f64 / f64::from(self.config.sampling_rate_hz),
            amplitude: stored.value,
        }));

        if let Some(percent) = self.quality.update(&self.buffer) {
            sink.emit(MonitorEvent::Quality(QualityUpdate { percent }));
        }

        if let Some(event) = self.peaks.update(stored.value, stored.timestamp_ms) {
            self.on_peak(event, sink);
        }

        self.track_rhythm(sink);
        IngestOutcome::Accepted
    }

    /// Ingest a textual reading as delivered by the transport.
    pub fn ingest_text(
        &mut self,
        text: &str,
        timestamp_ms: u64,
        sequence: u32,
        sink: &mut dyn EventSink,
    ) -> IngestOutcome {
        match text.trim().parse::<i32>() {
            Ok(value) => self.ingest(&Sample::new(value, timestamp_ms, sequence), sink),
            Err(_) => {
                let error = SampleError::NonNumeric;
                tracing::warn!("Dropped sample #{}: {}", sequence, error);
                sink.emit(MonitorEvent::Rejected { sequence, error });
                IngestOutcome::Rejected(error)
            }
        }
    }

    fn on_peak(&mut self, event: PeakEvent, sink: &mut dyn EventSink) {
        match event {
            PeakEvent::Accepted {
                timestamp_ms,
                interval_ms,
                bpm,
            } => {
                tracing::debug!("Peak at {}ms: {} BPM (RR {}ms)", timestamp_ms, bpm, interval_ms);
                self.bpm.record(bpm);
                sink.emit(MonitorEvent::Bpm(self.bpm.snapshot()));

                let recent = self.bpm.recent(self.config.alerts.irregular_window);
                if let Some(alert) =
                    self.abnormality
                        .evaluate(bpm, &recent, self.quality.current(), timestamp_ms)
                {
                    tracing::info!("{}: {}", alert.title, alert.message);
                    sink.emit(MonitorEvent::Alert(alert));
                }
            }
            PeakEvent::Rejected {
                timestamp_ms, bpm, ..
            } => {
                tracing::debug!("Peak at {}ms discarded: {} BPM out of range", timestamp_ms, bpm);
            }
            PeakEvent::Unpaired { timestamp_ms } => {
                tracing::debug!("Peak at {}ms", timestamp_ms);
            }
        }
    }

    fn track_rhythm(&mut self, sink: &mut dyn EventSink) {
        self.tracker.update(self.buffer.analysis());
        self.intervals.rr = self.tracker.last_rr();

        let rhythm = classify_rhythm(&self.tracker.rr_intervals(), self.bpm.current);
        if rhythm != self.state.rhythm {
            self.state.rhythm = rhythm;
            sink.emit(MonitorEvent::Morphology(self.state));
        }
    }

    /// Analyse the most recent beat of the last ten seconds.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InsufficientData`] before ten seconds of signal are
    /// buffered, [`AnalysisError::NoBeatFound`] when no usable R peak exists.
    pub fn analyze_beat(&mut self, sink: &mut dyn EventSink) -> Result<BeatAnalysis, AnalysisError> {
        let samples: Vec<StoredSample> = self.buffer.analysis().iter().copied().collect();
        let tracked: Vec<u64> = self.tracker.beats().iter().copied().collect();

        let beat = self.segmenter.extract(&samples, &tracked).map_err(|e| {
            tracing::debug!("Beat analysis unavailable: {}", e);
            e
        })?;

        let waves = self.morphology.analyze(&beat);
        let intervals = self
            .calculator
            .calculate(&beat, self.tracker.last_rr(), self.bpm.current);

        self.state = MorphologyState {
            p_wave: waves.p_wave,
            qrs_complex: waves.qrs_complex,
            t_wave: waves.t_wave,
            rhythm: self.state.rhythm,
        };
        self.intervals = intervals;

        sink.emit(MonitorEvent::Intervals(intervals.update()));
        sink.emit(MonitorEvent::Morphology(self.state));

        Ok(BeatAnalysis {
            beat,
            morphology: self.state,
            intervals,
        })
    }

    /// Read-only report aggregate over the last ten seconds of signal.
    #[must_use]
    pub fn ten_second_summary(&self) -> TenSecondSummary {
        let values = self.buffer.analysis_values();
        let start = values
            .len()
            .saturating_sub(self.config.beat_analysis_samples());
        TenSecondSummary::from_window(
            &values[start..],
            &self.config,
            self.bpm.current,
            self.quality.current(),
            self.state,
        )
    }

    /// Start a new session with the same configuration.
    pub fn reset(&mut self) {
        *self = Self::build(self.config);
        tracing::info!("Monitor reset");
    }

    /// Discard all buffers, statistics and derived state.
    pub fn clear(&mut self) {
        let discarded = self.buffer.data_count();
        self.buffer.clear();
        self.peaks.reset();
        self.bpm.clear();
        self.quality.reset();
        self.tracker.clear();
        self.abnormality.reset();
        self.state = MorphologyState::default();
        self.intervals = IntervalSet::default();
        tracing::info!("Monitor cleared ({} samples discarded)", discarded);
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Heart-rate statistics.
    #[must_use]
    pub fn bpm(&self) -> &BpmStats {
        &self.bpm
    }

    /// Last signal-quality percentage.
    #[must_use]
    pub fn signal_quality(&self) -> u8 {
        self.quality.current()
    }

    /// Intervals of the last analysed beat with the live RR interval.
    #[must_use]
    pub fn intervals(&self) -> IntervalSet {
        self.intervals
    }

    /// Morphology of the last analysed beat with the live rhythm.
    #[must_use]
    pub fn morphology(&self) -> MorphologyState {
        self.state
    }

    /// Current abnormality flags.
    #[must_use]
    pub fn conditions(&self) -> AbnormalityConditions {
        self.abnormality.conditions()
    }

    /// Sample buffers.
    #[must_use]
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Accepted samples since the session started.
    #[must_use]
    pub fn data_count(&self) -> u64 {
        self.buffer.data_count()
    }

    /// Timestamp of the most recent accepted sample.
    #[must_use]
    pub fn last_sample_at(&self) -> Option<u64> {
        self.buffer.last_sample_at()
    }

    /// Beat timestamps tracked over the last ten seconds.
    #[must_use]
    pub fn tracked_beats(&self) -> Vec<u64> {
        self.tracker.beats().iter().copied().collect()
    }
}

impl Default for HeartMonitor {
    fn default() -> Self {
        Self::build(MonitorConfig::default())
    }
}
