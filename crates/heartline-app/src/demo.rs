//! Synthetic ECG feed for the demo command
//!
//! Deterministic P-QRS-T waveform at a fixed heart rate with optional
//! pseudo-noise. Shapes are defined in milliseconds so the feed works at any
//! sampling rate.

use std::f64::consts::PI;

use heartline_core::math::constants;
use heartline_core::types::Sample;

/// Offset of the first R peak from the start of the feed.
const FIRST_R_MS: f64 = 300.0;

/// Baseline deviation `t_ms` from an R peak (negative is before R).
fn beat_shape(t_ms: f64) -> f64 {
    match t_ms {
        // P wave
        t if (-250.0..=-150.0).contains(&t) => 150.0 * (PI * (t + 250.0) / 100.0).sin(),
        // Q
        t if (-30.0..-15.0).contains(&t) => -100.0,
        // R
        t if t > -15.0 && t < 15.0 => 1600.0 * (1.0 - t.abs() / 15.0),
        // S
        t if (15.0..=30.0).contains(&t) => -100.0,
        // T wave
        t if (100.0..=300.0).contains(&t) => 300.0 * (PI * (t - 100.0) / 200.0).sin(),
        _ => 0.0,
    }
}

/// Endless synthetic sample generator.
#[derive(Clone, Debug)]
pub struct SyntheticEcg {
    period_ms: f64,
    rr_ms: f64,
    noise: f64,
    index: u32,
}

impl SyntheticEcg {
    /// Feed at `sampling_rate_hz` with a constant heart rate of `bpm`.
    pub fn new(sampling_rate_hz: u32, bpm: u16, noise: f64) -> Self {
        Self {
            period_ms: 1000.0 / f64::from(sampling_rate_hz.max(1)),
            rr_ms: 60_000.0 / f64::from(bpm.max(1)),
            noise,
            index: 0,
        }
    }

    fn value_at(&self, t_ms: f64, index: u32) -> i32 {
        // Contributions from the beats on either side of t
        let beat = ((t_ms - FIRST_R_MS) / self.rr_ms).floor();
        let previous_r = FIRST_R_MS + beat * self.rr_ms;
        let deviation = beat_shape(t_ms - previous_r) + beat_shape(t_ms - previous_r - self.rr_ms);
        let noise = self.noise * (f64::from(index) * 0.123).sin();

        let value = (constants::ADC_CENTER + deviation + noise).round() as i32;
        value.clamp(constants::ADC_MIN, constants::ADC_MAX)
    }

    /// Produce the next sample.
    pub fn next_sample(&mut self) -> Sample {
        let t_ms = f64::from(self.index) * self.period_ms;
        let sample = Sample::new(self.value_at(t_ms, self.index), t_ms.round() as u64, self.index);
        self.index = self.index.wrapping_add(1);
        sample
    }
}

impl Iterator for SyntheticEcg {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        Some(self.next_sample())
    }
}
