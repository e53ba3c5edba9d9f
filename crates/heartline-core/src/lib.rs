//! Heartline Core - `no_std` compatible ECG data model and signal math
//!
//! This crate provides the foundational types, configuration and math
//! utilities for the Heartline single-lead ECG monitor. It is designed to work
//! in `no_std` environments (the acquisition firmware) as well as `std`
//! environments (the host analysis engine). Heap allocation is limited to
//! beat windows and alert text through `alloc`.
//!
//! # Modules
//!
//! - [`types`]: Samples, BPM statistics, intervals, wave morphology, alerts
//! - [`error`]: Error types for sample validation, analysis and configuration
//! - [`math`]: Statistics, unit conversions and Bazett correction
//! - [`config`]: Tunable thresholds and window lengths for the engine
//!
//! # Features
//!
//! - `std`: Enable standard library support (`std::error::Error` impls)
//! - `defmt`: Enable `defmt` formatting for embedded logging
//!
//! # Example
//!
//! ```rust
//! use heartline_core::types::Sample;
//!
//! let sample = Sample::new(2048, 1_000, 1);
//! assert_eq!(sample.validated(), Ok(2048));
//!
//! let bad = Sample::new(5000, 1_010, 2);
//! assert!(bad.validated().is_err());
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod error;
pub mod math;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{
    AlertConfig, BeatSelection, FallbackPolicy, IntervalConfig, MonitorConfig, PeakDetectorConfig,
    QualityConfig,
};
pub use error::{AnalysisError, ConfigError, SampleError};
pub use types::{
    AbnormalityAlert, AbnormalityConditions, AbnormalityKind, AlertSeverity, BeatWindow, BpmStats,
    BpmUpdate, EcgPoint, IntervalSet, IntervalUpdate, IntervalValue, MorphologyState,
    MorphologyUpdate, PWave, QrsComplex, QualityUpdate, Rhythm, Sample, TWave,
};
