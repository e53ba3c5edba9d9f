//! Report aggregates
//!
//! - [`summary`]: ten-second single-lead summary with interval table and notes
//! - [`leads`]: per-lead statistics and multi-lead session summary

pub mod leads;
pub mod summary;

pub use leads::{analyze_lead, Lead, LeadAnalysis, LeadRecording, LeadSet, SessionNote, SessionSummary};
pub use summary::{
    ClinicalNote, IntervalAssessment, IntervalReport, IntervalStatus, NormalRange, QualityGrade,
    TenSecondSummary,
};
