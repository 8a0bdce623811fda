//! Forward and inverse short-time Fourier transforms, channel by channel.
//!
//! The per-channel work is delegated to a [`SpectralKernel`]; this module owns
//! building the window once and stacking per-channel results into the
//! multichannel layouts used by the buffers:
//!
//! - samples: `(channels, samples)`
//! - spectrum: `(frequency_bins, time_frames, channels)`
//!
//! [`RustFftKernel`] is the default kernel. It zero-pads half a window on both
//! sides, pads the tail to a whole number of hops, and scales each frame by
//! `1 / sum(window)`. Its inverse undoes exactly that, dividing the
//! overlap-added signal by the overlap-added squared window, so any COLA
//! window/hop pair reconstructs its input.

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis, stack};
use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::params::validate_lengths;
use crate::window::WindowType;
use crate::{AudioSignalError, AudioSignalResult};

/// Squared-window sums at or below this are treated as uncovered samples.
const NORM_FLOOR: f64 = 1e-10;

/// A single-channel short-time transform.
///
/// `overlap` is `frame_length - hop_length`. `window` always has
/// `frame_length` coefficients.
pub trait SpectralKernel {
    /// Transforms one channel into a `(frequency_bins, time_frames)` array.
    fn forward(
        &self,
        samples: ArrayView1<'_, f64>,
        sample_rate: u32,
        window: ArrayView1<'_, f64>,
        frame_length: usize,
        overlap: usize,
    ) -> AudioSignalResult<Array2<Complex64>>;

    /// Reconstructs one channel from a `(frequency_bins, time_frames)` array.
    fn inverse(
        &self,
        coefficients: ArrayView2<'_, Complex64>,
        sample_rate: u32,
        window: ArrayView1<'_, f64>,
        frame_length: usize,
        overlap: usize,
    ) -> AudioSignalResult<Array1<f64>>;
}

/// One-sided STFT backed by `rustfft`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RustFftKernel;

impl RustFftKernel {
    fn check_window(window: &ArrayView1<'_, f64>, frame_length: usize) -> AudioSignalResult<f64> {
        if window.len() != frame_length {
            return Err(AudioSignalError::shape(
                format!("window of length {frame_length}"),
                format!("window of length {}", window.len()),
            ));
        }
        let window_sum = window.sum();
        if window_sum.abs() <= f64::EPSILON {
            return Err(AudioSignalError::configuration("window sums to zero"));
        }
        Ok(window_sum)
    }

    fn hop(frame_length: usize, overlap: usize) -> AudioSignalResult<usize> {
        if overlap >= frame_length {
            return Err(AudioSignalError::configuration(format!(
                "overlap ({overlap}) must be smaller than the frame length ({frame_length})"
            )));
        }
        let hop = frame_length - overlap;
        validate_lengths(frame_length, hop)?;
        Ok(hop)
    }
}

impl SpectralKernel for RustFftKernel {
    fn forward(
        &self,
        samples: ArrayView1<'_, f64>,
        _sample_rate: u32,
        window: ArrayView1<'_, f64>,
        frame_length: usize,
        overlap: usize,
    ) -> AudioSignalResult<Array2<Complex64>> {
        let hop = Self::hop(frame_length, overlap)?;
        let window_sum = Self::check_window(&window, frame_length)?;
        if samples.is_empty() {
            return Err(AudioSignalError::state("cannot transform an empty channel"));
        }

        let edge = frame_length / 2;
        let mut padded = Vec::with_capacity(samples.len() + 2 * edge + hop);
        padded.resize(edge, 0.0);
        padded.extend(samples.iter().copied());
        padded.resize(padded.len() + edge, 0.0);
        let tail = (hop - (padded.len() - frame_length) % hop) % hop;
        padded.resize(padded.len() + tail, 0.0);

        let num_frames = (padded.len() - frame_length) / hop + 1;
        let num_bins = frame_length / 2 + 1;
        let scale = 1.0 / window_sum;

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(frame_length);
        let mut frame = vec![Complex64::default(); frame_length];
        let mut output = Array2::<Complex64>::zeros((num_bins, num_frames));

        for (t, mut column) in output.axis_iter_mut(Axis(1)).enumerate() {
            let start = t * hop;
            for ((slot, &x), &w) in frame
                .iter_mut()
                .zip(&padded[start..start + frame_length])
                .zip(window.iter())
            {
                *slot = Complex64::new(x * w, 0.0);
            }
            fft.process(&mut frame);
            for (out, bin) in column.iter_mut().zip(&frame[..num_bins]) {
                *out = bin * scale;
            }
        }

        Ok(output)
    }

    fn inverse(
        &self,
        coefficients: ArrayView2<'_, Complex64>,
        _sample_rate: u32,
        window: ArrayView1<'_, f64>,
        frame_length: usize,
        overlap: usize,
    ) -> AudioSignalResult<Array1<f64>> {
        let hop = Self::hop(frame_length, overlap)?;
        let window_sum = Self::check_window(&window, frame_length)?;

        let (num_bins, num_frames) = coefficients.dim();
        if num_bins != frame_length / 2 + 1 {
            return Err(AudioSignalError::shape(
                format!("{} frequency bins", frame_length / 2 + 1),
                format!("{num_bins} frequency bins"),
            ));
        }
        if num_frames == 0 {
            return Err(AudioSignalError::state(
                "cannot invert a spectrum with no time frames",
            ));
        }

        let output_length = frame_length + (num_frames - 1) * hop;
        let mut signal = vec![0.0f64; output_length];
        let mut norm = vec![0.0f64; output_length];

        let mut planner = FftPlanner::<f64>::new();
        let ifft = planner.plan_fft_inverse(frame_length);
        let mut frame = vec![Complex64::default(); frame_length];
        let rescale = window_sum / frame_length as f64;

        for (t, column) in coefficients.axis_iter(Axis(1)).enumerate() {
            // Hermitian extension of the one-sided spectrum
            for (k, slot) in frame.iter_mut().enumerate() {
                *slot = if k < num_bins {
                    column[k]
                } else {
                    column[frame_length - k].conj()
                };
            }
            ifft.process(&mut frame);

            let start = t * hop;
            for (i, (bin, &w)) in frame.iter().zip(window.iter()).enumerate() {
                signal[start + i] += bin.re * rescale * w;
                norm[start + i] += w * w;
            }
        }

        for (x, &n) in signal.iter_mut().zip(&norm) {
            if n > NORM_FLOOR {
                *x /= n;
            }
        }

        let edge = frame_length / 2;
        Ok(Array1::from_vec(signal[edge..output_length - edge].to_vec()))
    }
}

/// Forward transform of every channel of `samples`.
///
/// The window is generated once and shared by all channels; results are stacked
/// along a new trailing channel axis.
///
/// # Errors
/// Propagates kernel errors; [`AudioSignalError::State`] for empty input.
pub fn forward_channels<K: SpectralKernel + ?Sized>(
    kernel: &K,
    samples: ArrayView2<'_, f64>,
    sample_rate: u32,
    window_length: usize,
    hop_length: usize,
    window_type: WindowType,
) -> AudioSignalResult<Array3<Complex64>> {
    validate_lengths(window_length, hop_length)?;
    if samples.is_empty() {
        return Err(AudioSignalError::state(
            "no time domain samples to transform",
        ));
    }
    tracing::debug!(
        channels = samples.nrows(),
        samples = samples.ncols(),
        window_length,
        hop_length,
        %window_type,
        "forward transform"
    );

    let window = window_type.generate(window_length);
    let overlap = window_length - hop_length;
    let per_channel = samples
        .outer_iter()
        .map(|channel| kernel.forward(channel, sample_rate, window.view(), window_length, overlap))
        .collect::<AudioSignalResult<Vec<_>>>()?;

    let views: Vec<_> = per_channel.iter().map(Array2::view).collect();
    stack(Axis(2), &views).map_err(|e| {
        AudioSignalError::shape("equally shaped channel spectra", e.to_string())
    })
}

/// Inverse transform of every channel of `spectrum`.
///
/// # Errors
/// Propagates kernel errors; [`AudioSignalError::State`] for empty input.
pub fn inverse_channels<K: SpectralKernel + ?Sized>(
    kernel: &K,
    spectrum: ArrayView3<'_, Complex64>,
    sample_rate: u32,
    window_length: usize,
    hop_length: usize,
    window_type: WindowType,
) -> AudioSignalResult<Array2<f64>> {
    validate_lengths(window_length, hop_length)?;
    if spectrum.is_empty() {
        return Err(AudioSignalError::state("no spectral data to invert"));
    }
    tracing::debug!(
        channels = spectrum.len_of(Axis(2)),
        frames = spectrum.len_of(Axis(1)),
        window_length,
        hop_length,
        %window_type,
        "inverse transform"
    );

    let window = window_type.generate(window_length);
    let overlap = window_length - hop_length;
    let per_channel = spectrum
        .axis_iter(Axis(2))
        .map(|channel| kernel.inverse(channel, sample_rate, window.view(), window_length, overlap))
        .collect::<AudioSignalResult<Vec<_>>>()?;

    let views: Vec<_> = per_channel.iter().map(Array1::view).collect();
    stack(Axis(0), &views)
        .map_err(|e| AudioSignalError::shape("equally long channel signals", e.to_string()))
}
