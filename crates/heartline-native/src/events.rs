//! Output events for display and report collaborators
//!
//! The engine pushes events into an [`EventSink`] supplied by the caller.
//! Rendering, audio and persistence live entirely on the subscriber side.

use serde::Serialize;
use tokio::sync::broadcast;

use heartline_core::error::SampleError;
use heartline_core::types::{
    AbnormalityAlert, BpmUpdate, EcgPoint, IntervalUpdate, MorphologyUpdate, QualityUpdate,
};

/// An event produced while ingesting or analysing the signal.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Chart point for every accepted sample
    Point(EcgPoint),
    /// Heart-rate statistics after an accepted BPM
    Bpm(BpmUpdate),
    /// Signal quality, only when the percentage changes
    Quality(QualityUpdate),
    /// Interval set after beat analysis
    Intervals(IntervalUpdate),
    /// Wave morphology and rhythm
    Morphology(MorphologyUpdate),
    /// Abnormality alert
    Alert(AbnormalityAlert),
    /// A sample was dropped during validation
    Rejected {
        /// Transport sequence number of the dropped sample
        sequence: u32,
        /// Why the sample was dropped
        error: SampleError,
    },
}

/// Receiver of monitor events.
pub trait EventSink {
    /// Deliver one event.
    fn emit(&mut self, event: MonitorEvent);
}

impl EventSink for Vec<MonitorEvent> {
    fn emit(&mut self, event: MonitorEvent) {
        self.push(event);
    }
}

impl EventSink for broadcast::Sender<MonitorEvent> {
    fn emit(&mut self, event: MonitorEvent) {
        // No subscribers is not an error for the engine
        let _ = self.send(event);
    }
}

/// Sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: MonitorEvent) {}
}
