//! Collaborators between the transport and the engine
//!
//! - [`source`]: recorded sample streams (CSV or JSON lines) for replay
//! - [`watchdog`]: connection staleness tracking, independent of analysis state

pub mod source;
pub mod watchdog;

pub use source::{read_samples, SampleParser, SourceError};
pub use watchdog::{ConnectionEvent, ConnectionWatchdog, CHECK_INTERVAL, STALE_AFTER};
