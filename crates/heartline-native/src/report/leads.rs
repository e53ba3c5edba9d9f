//! Multi-lead session summary
//!
//! Leads are recorded one at a time with the single-channel front end, ten
//! seconds each. This module produces per-lead statistics and a statistical
//! session summary; it does not reconstruct a simultaneous 12-lead ECG.

use std::fmt;

use serde::Serialize;

use heartline_core::config::MonitorConfig;
use heartline_core::math;
use heartline_core::types::{IntervalSet, IntervalValue, Regularity};

use crate::processing::rhythm::rr_variability_percent;
use crate::processing::{BeatSegmenter, IntervalCalculator, MorphologyAnalyzer};

use super::summary::{find_r_peaks, valid_rr_intervals, NormalRange};

/// Spread of per-lead heart rates that warrants a note.
const HEART_RATE_SPREAD_BPM: u16 = 20;

/// One ECG lead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Lead {
    /// Lead name, e.g. `II` or `V1`
    pub name: &'static str,
    /// Electrode placement
    pub position: &'static str,
    /// Cardiac view
    pub description: &'static str,
}

const fn lead(name: &'static str, position: &'static str, description: &'static str) -> Lead {
    Lead {
        name,
        position,
        description,
    }
}

const LEADS: [Lead; 12] = [
    lead("I", "Right arm (-) to left arm (+)", "Lateral wall"),
    lead("II", "Right arm (-) to left leg (+)", "Inferior wall"),
    lead("III", "Left arm (-) to left leg (+)", "Inferior wall"),
    lead("aVR", "Right arm (+)", "Right upper heart and cavity"),
    lead("aVL", "Left arm (+)", "High lateral wall"),
    lead("aVF", "Left leg (+)", "Inferior wall"),
    lead("V1", "4th intercostal space, right sternal border", "Septum"),
    lead("V2", "4th intercostal space, left sternal border", "Septum"),
    lead("V3", "Between V2 and V4", "Anterior wall"),
    lead("V4", "5th intercostal space, midclavicular line", "Anterior wall"),
    lead("V5", "Anterior axillary line, level with V4", "Lateral wall"),
    lead("V6", "Midaxillary line, level with V4", "Lateral wall"),
];

/// Standard lead configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LeadSet {
    /// Limb leads I, II, III
    ThreeLead,
    /// Limb and augmented leads
    SixLead,
    /// Limb, augmented and precordial leads
    TwelveLead,
}

impl LeadSet {
    /// Leads in recording order.
    #[must_use]
    pub fn leads(self) -> &'static [Lead] {
        match self {
            Self::ThreeLead => &LEADS[..3],
            Self::SixLead => &LEADS[..6],
            Self::TwelveLead => &LEADS,
        }
    }
}

/// Signal captured for one lead, or a skipped lead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeadRecording {
    /// Raw ADC values at the configured sampling rate
    Recorded(Vec<u16>),
    /// The operator skipped this lead
    Skipped,
}

/// Per-lead statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeadAnalysis {
    /// Samples recorded
    pub data_points: usize,
    /// Smallest value
    pub min: u16,
    /// Largest value
    pub max: u16,
    /// Mean value
    pub mean: f64,
    /// Heart rate from the median RR interval
    pub estimated_heart_rate: Option<u16>,
    /// Intervals measured on the last beat
    pub intervals: IntervalSet,
    /// Peak-to-peak QRS amplitude of the last beat (raw units)
    pub qrs_amplitude: Option<u16>,
    /// RR regularity
    pub regularity: Regularity,
}

/// Analyse one lead recording. Returns `None` for an empty recording.
#[must_use]
pub fn analyze_lead(values: &[u16], config: &MonitorConfig) -> Option<LeadAnalysis> {
    let min = values.iter().copied().min()?;
    let max = values.iter().copied().max()?;
    let rate = config.sampling_rate_hz;

    let peaks = find_r_peaks(values, rate);
    let rr = valid_rr_intervals(&peaks, rate);
    let median_rr = (!rr.is_empty()).then(|| math::median(&rr));
    let estimated_heart_rate = median_rr.map(|rr| math::bpm_from_rr_ms(rr) as u16);

    let regularity = if peaks.len() < 3 {
        Regularity::InsufficientData
    } else {
        let rr_ms: Vec<u64> = rr.iter().map(|&ms| math::round(ms) as u64).collect();
        rr_variability_percent(&rr_ms).map_or(Regularity::Unknown, Regularity::from_variability)
    };

    let (intervals, qrs_amplitude) = match peaks.last() {
        Some(&last) => {
            let beat = BeatSegmenter::new(config).window_around(values, last);
            let intervals = IntervalCalculator::new(rate, config.intervals.fallback).calculate(
                &beat,
                median_rr.map(|rr| math::round(rr) as u32),
                estimated_heart_rate.unwrap_or(0),
            );
            let qrs = MorphologyAnalyzer::new(rate).qrs_complex(&beat);
            (intervals, Some(qrs.amplitude_raw))
        }
        None => (IntervalSet::default(), None),
    };

    Some(LeadAnalysis {
        data_points: values.len(),
        min,
        max,
        mean: math::mean(values),
        estimated_heart_rate,
        intervals,
        qrs_amplitude,
        regularity,
    })
}

/// Observation attached to a session summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionNote {
    /// Heart rate differs noticeably between leads
    InterLeadVariability {
        /// Max minus min heart rate
        spread_bpm: u16,
    },
    /// Mean PR outside its normal range
    AbnormalPr {
        /// Mean PR
        mean_ms: u32,
    },
    /// Mean QRS outside its normal range
    AbnormalQrs {
        /// Mean QRS
        mean_ms: u32,
    },
    /// Mean QT outside its normal range
    AbnormalQt {
        /// Mean QT
        mean_ms: u32,
    },
}

impl fmt::Display for SessionNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InterLeadVariability { spread_bpm } => write!(
                f,
                "Heart rate varied by {spread_bpm} BPM between leads; recordings were not simultaneous."
            ),
            Self::AbnormalPr { mean_ms } => {
                write!(f, "Mean PR interval {mean_ms} ms is outside 120-200 ms.")
            }
            Self::AbnormalQrs { mean_ms } => {
                write!(f, "Mean QRS duration {mean_ms} ms is outside 80-120 ms.")
            }
            Self::AbnormalQt { mean_ms } => {
                write!(f, "Mean QT interval {mean_ms} ms is outside 350-450 ms.")
            }
        }
    }
}

/// Statistical summary of a multi-lead session.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Leads with a recording
    pub leads_recorded: usize,
    /// Leads skipped by the operator
    pub leads_skipped: usize,
    /// Mean of per-lead heart rates
    pub average_heart_rate: Option<u16>,
    /// Lowest per-lead heart rate
    pub min_heart_rate: Option<u16>,
    /// Highest per-lead heart rate
    pub max_heart_rate: Option<u16>,
    /// Mean PR across leads
    pub mean_pr: Option<u32>,
    /// Mean QRS across leads
    pub mean_qrs: Option<u32>,
    /// Mean QT across leads
    pub mean_qt: Option<u32>,
    /// Observations
    pub notes: Vec<SessionNote>,
}

fn mean_interval(
    analyses: &[&LeadAnalysis],
    pick: impl Fn(&LeadAnalysis) -> Option<IntervalValue>,
) -> Option<u32> {
    let values: Vec<u32> = analyses
        .iter()
        .filter_map(|a| pick(*a))
        .map(IntervalValue::ms)
        .collect();
    (!values.is_empty()).then(|| math::round(math::mean(&values)) as u32)
}

impl SessionSummary {
    /// Analyse every recorded lead and aggregate.
    #[must_use]
    pub fn from_recordings(recordings: &[(Lead, LeadRecording)], config: &MonitorConfig) -> Self {
        let analyses: Vec<(Lead, Option<LeadAnalysis>)> = recordings
            .iter()
            .map(|(lead, recording)| match recording {
                LeadRecording::Recorded(values) => (*lead, analyze_lead(values, config)),
                LeadRecording::Skipped => (*lead, None),
            })
            .collect();
        Self::from_analyses(&analyses)
    }

    /// Aggregate per-lead analyses (`None` for skipped leads).
    #[must_use]
    pub fn from_analyses(analyses: &[(Lead, Option<LeadAnalysis>)]) -> Self {
        let recorded: Vec<&LeadAnalysis> = analyses.iter().filter_map(|(_, a)| a.as_ref()).collect();
        let rates: Vec<u16> = recorded
            .iter()
            .filter_map(|a| a.estimated_heart_rate)
            .collect();

        let average_heart_rate =
            (!rates.is_empty()).then(|| math::round(math::mean(&rates)) as u16);
        let min_heart_rate = rates.iter().copied().min();
        let max_heart_rate = rates.iter().copied().max();

        let mean_pr = mean_interval(&recorded, |a| a.intervals.pr);
        let mean_qrs = mean_interval(&recorded, |a| a.intervals.qrs);
        let mean_qt = mean_interval(&recorded, |a| a.intervals.qt);

        let mut notes = Vec::new();
        if let (Some(lo), Some(hi)) = (min_heart_rate, max_heart_rate) {
            if hi - lo > HEART_RATE_SPREAD_BPM {
                notes.push(SessionNote::InterLeadVariability { spread_bpm: hi - lo });
            }
        }
        if let Some(mean_ms) = mean_pr.filter(|&ms| !NormalRange::PR.contains(ms)) {
            notes.push(SessionNote::AbnormalPr { mean_ms });
        }
        if let Some(mean_ms) = mean_qrs.filter(|&ms| !NormalRange::QRS.contains(ms)) {
            notes.push(SessionNote::AbnormalQrs { mean_ms });
        }
        if let Some(mean_ms) = mean_qt.filter(|&ms| !NormalRange::QT.contains(ms)) {
            notes.push(SessionNote::AbnormalQt { mean_ms });
        }

        Self {
            leads_recorded: recorded.len(),
            leads_skipped: analyses.len() - recorded.len(),
            average_heart_rate,
            min_heart_rate,
            max_heart_rate,
            mean_pr,
            mean_qrs,
            mean_qt,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::test_fixtures::synthetic_values;

    #[test]
    fn test_lead_sets() {
        assert_eq!(LeadSet::ThreeLead.leads().len(), 3);
        assert_eq!(LeadSet::SixLead.leads()[5].name, "aVF");
        let twelve = LeadSet::TwelveLead.leads();
        assert_eq!(twelve.len(), 12);
        assert_eq!(twelve[6].name, "V1");
    }

    #[test]
    fn test_analyze_lead() {
        let config = MonitorConfig::default();
        let analysis = analyze_lead(&synthetic_values(1000, 60, 80), &config).unwrap();

        assert_eq!(analysis.data_points, 1000);
        assert_eq!(analysis.max, 3648);
        assert_eq!(analysis.min, 1948);
        assert_eq!(analysis.estimated_heart_rate, Some(75));
        assert_eq!(analysis.regularity, Regularity::Regular);
        assert_eq!(analysis.qrs_amplitude, Some(1700));
        assert_eq!(analysis.intervals.qrs, Some(IntervalValue::Measured(60)));

        assert_eq!(analyze_lead(&[], &config), None);
    }

    #[test]
    fn test_session_summary() {
        let config = MonitorConfig::default();
        let leads = LeadSet::ThreeLead.leads();
        let recordings = vec![
            (leads[0], LeadRecording::Recorded(synthetic_values(1000, 60, 80))),
            (leads[1], LeadRecording::Recorded(synthetic_values(1000, 60, 120))),
            (leads[2], LeadRecording::Skipped),
        ];
        let summary = SessionSummary::from_recordings(&recordings, &config);

        assert_eq!(summary.leads_recorded, 2);
        assert_eq!(summary.leads_skipped, 1);
        assert_eq!(summary.min_heart_rate, Some(50));
        assert_eq!(summary.max_heart_rate, Some(75));
        assert_eq!(summary.average_heart_rate, Some(63));
        assert_eq!(summary.mean_qrs, Some(60));
        assert!(summary
            .notes
            .contains(&SessionNote::InterLeadVariability { spread_bpm: 25 }));
        assert!(summary.notes.contains(&SessionNote::AbnormalQrs { mean_ms: 60 }));
        assert!(!summary
            .notes
            .iter()
            .any(|n| matches!(n, SessionNote::AbnormalPr { .. })));
    }
}
