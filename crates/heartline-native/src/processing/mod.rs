//! Streaming ECG signal processing
//!
//! Each stage is an independent component with its own state:
//! - [`buffer`]: Display and analysis ring buffers
//! - [`peaks`]: Adaptive-threshold R-peak detection and instantaneous BPM
//! - [`quality`]: Rolling-variance signal quality score
//! - [`rhythm`]: Continuous beat tracking and rhythm classification
//! - [`segmenter`]: Single-beat extraction around an R peak
//! - [`morphology`]: P/QRS/T wave detection
//! - [`intervals`]: PR/QRS/QT/QTc measurement with optional estimates
//! - [`abnormality`]: Brady/tachy/irregular/quality alerts with cooldown

pub mod abnormality;
pub mod buffer;
pub mod intervals;
pub mod morphology;
pub mod peaks;
pub mod quality;
pub mod rhythm;
pub mod segmenter;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use abnormality::AbnormalityDetector;
pub use buffer::SampleBuffer;
pub use intervals::IntervalCalculator;
pub use morphology::{MorphologyAnalyzer, WaveMorphology};
pub use peaks::{PeakDetector, PeakEvent};
pub use quality::SignalQualityEstimator;
pub use rhythm::BeatTracker;
pub use segmenter::BeatSegmenter;
