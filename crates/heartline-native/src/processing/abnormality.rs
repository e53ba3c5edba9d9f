//! Abnormality detection with alert rate limiting
//!
//! Condition flags follow every evaluation. Alert emission is limited to one
//! per cooldown period; the highest-priority active condition wins.

use heartline_core::config::AlertConfig;
use heartline_core::math;
use heartline_core::types::{AbnormalityAlert, AbnormalityConditions, AbnormalityKind};

/// Evaluates heart-rate and quality readings against alert thresholds.
#[derive(Clone, Debug)]
pub struct AbnormalityDetector {
    config: AlertConfig,
    conditions: AbnormalityConditions,
    last_alert_ms: Option<u64>,
}

impl AbnormalityDetector {
    /// Create a detector.
    #[must_use]
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            conditions: AbnormalityConditions::default(),
            last_alert_ms: None,
        }
    }

    /// Evaluate a newly accepted BPM.
    ///
    /// `recent_bpm` holds the latest readings (oldest first) used for the
    /// irregularity check. Returns an alert when one is due.
    pub fn evaluate(
        &mut self,
        bpm: u16,
        recent_bpm: &[u16],
        quality: u8,
        now_ms: u64,
    ) -> Option<AbnormalityAlert> {
        let window = self.config.irregular_window;
        let irregular = recent_bpm.len() >= window
            && math::variance(&recent_bpm[recent_bpm.len() - window..])
                > self.config.irregular_variance;

        self.conditions = AbnormalityConditions {
            bradycardia: bpm < self.config.bradycardia_bpm,
            tachycardia: bpm > self.config.tachycardia_bpm,
            irregular_rhythm: irregular,
            poor_signal_quality: quality < self.config.poor_quality_percent,
        };

        let kind = self.conditions.first_active()?;
        if let Some(last) = self.last_alert_ms {
            if now_ms.saturating_sub(last) < self.config.cooldown_ms {
                return None;
            }
        }

        self.last_alert_ms = Some(now_ms);
        Some(build_alert(&self.config, kind, bpm, quality, now_ms))
    }

    /// Current condition flags.
    #[must_use]
    pub fn conditions(&self) -> AbnormalityConditions {
        self.conditions
    }

    /// Timestamp of the last emitted alert.
    #[must_use]
    pub fn last_alert_ms(&self) -> Option<u64> {
        self.last_alert_ms
    }

    /// Clear flags and cooldown.
    pub fn reset(&mut self) {
        self.conditions = AbnormalityConditions::default();
        self.last_alert_ms = None;
    }
}

fn build_alert(
    config: &AlertConfig,
    kind: AbnormalityKind,
    bpm: u16,
    quality: u8,
    at_ms: u64,
) -> AbnormalityAlert {
    let (brady, tachy) = (config.bradycardia_bpm, config.tachycardia_bpm);
    let message = match kind {
        AbnormalityKind::Bradycardia => format!(
            "Heart rate is {bpm} BPM (below {brady} BPM). This may indicate a slow heart rhythm."
        ),
        AbnormalityKind::Tachycardia => format!(
            "Heart rate is {bpm} BPM (above {tachy} BPM). This may indicate a fast heart rhythm."
        ),
        AbnormalityKind::IrregularRhythm => {
            "Heart rhythm appears irregular. Consider checking electrode placement.".to_string()
        }
        AbnormalityKind::PoorSignalQuality => {
            format!("Signal quality is {quality}%. Please check electrode connections.")
        }
    };

    AbnormalityAlert {
        severity: kind.severity(),
        kind,
        title: kind.title().to_string(),
        message,
        at_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartline_core::types::AlertSeverity;

    #[test]
    fn test_cooldown_suppresses_second_alert() {
        let mut detector = AbnormalityDetector::new(AlertConfig::default());

        let first = detector.evaluate(50, &[50], 95, 1_000).unwrap();
        assert_eq!(first.kind, AbnormalityKind::Bradycardia);
        assert_eq!(first.severity, AlertSeverity::Critical);

        // Tachycardia 2 s later: flags update, no alert
        assert_eq!(detector.evaluate(130, &[50, 130], 95, 3_000), None);
        assert!(detector.conditions().tachycardia);
        assert!(!detector.conditions().bradycardia);
    }

    #[test]
    fn test_alert_after_cooldown() {
        let mut detector = AbnormalityDetector::new(AlertConfig::default());
        assert!(detector.evaluate(50, &[50], 95, 1_000).is_some());

        let second = detector.evaluate(130, &[50, 130], 95, 12_000).unwrap();
        assert_eq!(second.kind, AbnormalityKind::Tachycardia);
        assert_eq!(second.title, "Tachycardia Detected");
        assert_eq!(
            second.message,
            "Heart rate is 130 BPM (above 100 BPM). This may indicate a fast heart rhythm."
        );
        assert_eq!(detector.last_alert_ms(), Some(12_000));
    }

    #[test]
    fn test_irregular_needs_five_readings() {
        let mut detector = AbnormalityDetector::new(AlertConfig::default());
        assert_eq!(detector.evaluate(80, &[60, 100, 80], 95, 0), None);
        assert!(!detector.conditions().irregular_rhythm);

        // Variance of [60, 100, 60, 100, 80] is 320
        assert_eq!(detector.evaluate(80, &[60, 100, 60, 100, 80], 95, 0), None);

        let alert = detector
            .evaluate(80, &[70, 40, 120, 50, 110, 80], 95, 0)
            .unwrap();
        assert_eq!(alert.kind, AbnormalityKind::IrregularRhythm);
        assert_eq!(alert.severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_priority_and_poor_quality() {
        let mut detector = AbnormalityDetector::new(AlertConfig::default());
        let alert = detector.evaluate(75, &[75], 40, 0).unwrap();
        assert_eq!(alert.kind, AbnormalityKind::PoorSignalQuality);
        assert_eq!(
            alert.message,
            "Signal quality is 40%. Please check electrode connections."
        );

        detector.reset();
        let alert = detector.evaluate(45, &[45], 40, 0).unwrap();
        assert_eq!(alert.kind, AbnormalityKind::Bradycardia);
        assert!(detector.conditions().poor_signal_quality);
    }
}
