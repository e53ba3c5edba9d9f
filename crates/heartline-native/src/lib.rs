//! Heartline Native - Streaming single-channel ECG analysis
//!
//! This crate provides the host-side analysis engine:
//! - Sample buffering and adaptive R-peak / BPM detection
//! - Signal quality scoring
//! - Beat segmentation, wave morphology and clinical intervals
//! - Rhythm classification and rate-limited abnormality alerts
//! - Ten-second and multi-lead report aggregates
//!
//! # Modules
//!
//! - [`engine`]: The [`HeartMonitor`] session aggregate
//! - [`processing`]: Independently testable analysis stages
//! - [`events`]: Output events and sinks
//! - [`report`]: Report aggregates
//! - [`bridge`]: Recorded streams and the connection watchdog

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod bridge;
pub mod engine;
pub mod events;
pub mod processing;
pub mod report;

// Re-export key types
pub use bridge::{ConnectionEvent, ConnectionWatchdog, SampleParser, SourceError};
pub use engine::{BeatAnalysis, HeartMonitor, IngestOutcome};
pub use events::{EventSink, MonitorEvent, NullSink};
pub use report::{SessionSummary, TenSecondSummary};
