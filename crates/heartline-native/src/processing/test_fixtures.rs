//! Deterministic synthetic ECG fixtures for tests (100 Hz)

use std::f64::consts::PI;

use heartline_core::types::{BeatWindow, Sample};

/// Deviation from the 2048 baseline at `offset` samples from an R peak.
///
/// P: 150-unit half sine from -250 ms to -150 ms. QRS: Q -100, R +1600,
/// S -100. T: 300-unit half sine from +100 ms to +300 ms.
pub fn beat_template(offset: i64) -> i32 {
    match offset {
        -25..=-15 => half_sine(150.0, offset + 25, 10),
        -2 | 2 => -100,
        -1 => 552,
        0 => 1600,
        1 => 352,
        10..=30 => half_sine(300.0, offset - 10, 20),
        _ => 0,
    }
}

fn half_sine(amplitude: f64, k: i64, span: i64) -> i32 {
    (amplitude * (PI * k as f64 / span as f64).sin()).round() as i32
}

/// One 80-sample beat with the R peak at index 40.
pub fn synthetic_beat_window() -> BeatWindow {
    let values: Vec<u16> = (0..80)
        .map(|i| (2048 + beat_template(i - 40)) as u16)
        .collect();
    BeatWindow {
        r_peak_value: values[40],
        values,
        timestamps_ms: (0..80).map(|i| (i - 40) * 10).collect(),
        r_peak_index: 40,
    }
}

/// Signal values for a regular rhythm with R peaks every `rr_samples`,
/// the first one at `first_r`.
pub fn synthetic_values(len: usize, first_r: usize, rr_samples: usize) -> Vec<u16> {
    (0..len as i64)
        .map(|i| {
            let mut v = 2048;
            let mut r = first_r as i64;
            while r < len as i64 + 40 {
                v += beat_template(i - r);
                r += rr_samples as i64;
            }
            v.clamp(0, 4095) as u16
        })
        .collect()
}

/// Sample stream at 100 Hz (10 ms spacing) for a regular rhythm.
pub fn synthetic_stream(len: usize, first_r: usize, rr_samples: usize) -> Vec<Sample> {
    synthetic_values(len, first_r, rr_samples)
        .into_iter()
        .enumerate()
        .map(|(i, v)| Sample::new(i32::from(v), i as u64 * 10, i as u32))
        .collect()
}
