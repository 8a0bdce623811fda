/// Common test utilities
use std::f64::consts::PI;

use ndarray::{Array1, ArrayView1};

#[allow(dead_code)]
pub fn sine(frequency: f64, sample_rate: u32, length: usize, amplitude: f64) -> Array1<f64> {
    Array1::from_shape_fn(length, |i| {
        amplitude * (2.0 * PI * frequency * i as f64 / f64::from(sample_rate)).sin()
    })
}

/// Deterministic pseudo-noise in [-0.5, 0.5).
#[allow(dead_code)]
pub fn noise(length: usize, seed: u64) -> Array1<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    Array1::from_shape_fn(length, |_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    })
}

#[allow(dead_code)]
pub fn max_abs_error(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Normalized cross-correlation at lag zero.
#[allow(dead_code)]
pub fn correlation(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    assert_eq!(a.len(), b.len());
    let dot = a.dot(&b);
    let norms = (a.dot(&a) * b.dot(&b)).sqrt();
    if norms == 0.0 { 0.0 } else { dot / norms }
}
