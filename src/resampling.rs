//! Sample-rate conversion.
//!
//! The [`Resampler`] trait converts one channel at a time. With the
//! `resampling` feature, [`RubatoResampler`] implements it on top of `rubato`.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, stack};
use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::{AudioBuffer, AudioSignalError, AudioSignalResult};

/// Converts a single channel between sample rates.
pub trait Resampler {
    /// Resamples `channel` from `source_rate` to `target_rate` Hz.
    ///
    /// # Errors
    /// Implementation-specific failures, reported as
    /// [`AudioSignalError::Resampling`].
    fn resample(
        &self,
        channel: ArrayView1<'_, f64>,
        source_rate: u32,
        target_rate: u32,
    ) -> AudioSignalResult<Array1<f64>>;
}

/// Resamples every row of `samples` and stacks the results.
///
/// # Errors
/// Any error from `resampler`, or [`AudioSignalError::Shape`] if channels come
/// back with different lengths.
pub fn resample_channels<R: Resampler + ?Sized>(
    resampler: &R,
    samples: ArrayView2<'_, f64>,
    source_rate: u32,
    target_rate: u32,
) -> AudioSignalResult<Array2<f64>> {
    tracing::debug!(
        source_rate,
        target_rate,
        channels = samples.nrows(),
        length = samples.ncols(),
        "resampling"
    );
    let channels = samples
        .outer_iter()
        .map(|channel| resampler.resample(channel, source_rate, target_rate))
        .collect::<AudioSignalResult<Vec<_>>>()?;
    let views: Vec<_> = channels.iter().map(Array1::view).collect();
    stack(Axis(0), &views).map_err(|e| {
        AudioSignalError::shape("resampled channels of equal length", e.to_string())
    })
}

/// Speed/quality trade-off of [`RubatoResampler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingQuality {
    /// FFT based synchronous resampling.
    Fast,
    /// Sinc interpolation with linear sub-sample interpolation.
    #[default]
    Medium,
    /// Longer sinc filter with cubic sub-sample interpolation.
    High,
}

impl AudioBuffer {
    /// Resamples the active sample data to `new_sample_rate` with the default
    /// [`RubatoResampler`].
    ///
    /// # Errors
    /// See [`AudioBuffer::resample_with`].
    #[cfg(feature = "resampling")]
    pub fn resample(&mut self, new_sample_rate: u32) -> AudioSignalResult<()> {
        self.resample_with(&RubatoResampler::default(), new_sample_rate)
    }

    /// Resamples the active sample data to `new_sample_rate` with `resampler`.
    ///
    /// The result replaces the sample data and the active region is reset.
    /// Spectral data is left untouched. Asking for the current rate only logs
    /// a warning.
    ///
    /// # Errors
    /// - [`AudioSignalError::Domain`] for a rate of zero.
    /// - [`AudioSignalError::State`] without sample data.
    /// - Any error from `resampler`.
    pub fn resample_with<R: Resampler + ?Sized>(
        &mut self,
        resampler: &R,
        new_sample_rate: u32,
    ) -> AudioSignalResult<()> {
        if new_sample_rate == 0 {
            return Err(AudioSignalError::domain("cannot resample to 0 Hz"));
        }
        if new_sample_rate == self.sample_rate {
            tracing::warn!(
                sample_rate = new_sample_rate,
                "requested sample rate equals the current one, not resampling"
            );
            return Ok(());
        }
        let samples = self.require_samples("resample")?;
        let resampled =
            resample_channels(resampler, samples.view(), self.sample_rate, new_sample_rate)?;
        self.samples = Some(SampleBuffer::from_array(resampled)?);
        self.sample_rate = new_sample_rate;
        Ok(())
    }
}

#[cfg(feature = "resampling")]
pub use self::rubato_backend::RubatoResampler;

#[cfg(feature = "resampling")]
mod rubato_backend {
    use ndarray::{Array1, ArrayView1};
    use rubato::{
        FftFixedInOut, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
        WindowFunction,
    };

    use super::{Resampler, ResamplingQuality};
    use crate::{AudioSignalError, AudioSignalResult};

    const FAST_BLOCK: usize = 4096;
    const HIGH_BLOCK: usize = 8192;

    /// [`Resampler`] backed by `rubato`.
    ///
    /// The output of each call has `ceil(len * target / source)` samples and is
    /// aligned with the input, the filter delay having been removed.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct RubatoResampler {
        quality: ResamplingQuality,
    }

    impl RubatoResampler {
        /// Creates a resampler with the given quality.
        pub const fn new(quality: ResamplingQuality) -> Self {
            Self { quality }
        }

        /// The configured quality.
        pub const fn quality(&self) -> ResamplingQuality {
            self.quality
        }
    }

    fn block_size(quality: ResamplingQuality, input_len: usize) -> usize {
        let target = match quality {
            ResamplingQuality::Fast | ResamplingQuality::Medium => FAST_BLOCK,
            ResamplingQuality::High => HIGH_BLOCK,
        };
        input_len.min(target).max(1)
    }

    fn sinc_parameters(quality: ResamplingQuality) -> SincInterpolationParameters {
        let (sinc_len, interpolation, oversampling_factor) = match quality {
            ResamplingQuality::High => (256, SincInterpolationType::Cubic, 512),
            _ => (128, SincInterpolationType::Linear, 256),
        };
        SincInterpolationParameters {
            sinc_len,
            f_cutoff: 0.95,
            interpolation,
            oversampling_factor,
            window: WindowFunction::BlackmanHarris2,
        }
    }

    fn failure(error: impl std::fmt::Display) -> AudioSignalError {
        AudioSignalError::resampling(error.to_string())
    }

    /// Feeds `input` through `resampler` in fixed blocks, flushes the filter
    /// and returns exactly `expected` delay-compensated samples.
    fn drive<R: rubato::Resampler<f64>>(
        resampler: &mut R,
        input: &[f64],
        expected: usize,
    ) -> AudioSignalResult<Vec<f64>> {
        let delay = resampler.output_delay();
        let wanted = expected + delay;
        let mut output = Vec::with_capacity(wanted);
        let mut position = 0;

        while input.len() - position >= resampler.input_frames_next() {
            let next = resampler.input_frames_next();
            let block = [&input[position..position + next]];
            let frames = resampler.process(&block[..], None).map_err(failure)?;
            output.extend_from_slice(&frames[0]);
            position += next;
        }
        if position < input.len() {
            let block = [&input[position..]];
            let frames = resampler
                .process_partial(Some(&block[..]), None)
                .map_err(failure)?;
            output.extend_from_slice(&frames[0]);
        }
        while output.len() < wanted {
            let frames = resampler
                .process_partial::<&[f64]>(None, None)
                .map_err(failure)?;
            if frames[0].is_empty() {
                break;
            }
            output.extend_from_slice(&frames[0]);
        }

        output.drain(..delay.min(output.len()));
        output.resize(expected, 0.0);
        Ok(output)
    }

    impl Resampler for RubatoResampler {
        fn resample(
            &self,
            channel: ArrayView1<'_, f64>,
            source_rate: u32,
            target_rate: u32,
        ) -> AudioSignalResult<Array1<f64>> {
            if source_rate == 0 || target_rate == 0 {
                return Err(AudioSignalError::domain(format!(
                    "cannot resample between {source_rate} Hz and {target_rate} Hz"
                )));
            }
            let input = channel.to_vec();
            if input.is_empty() {
                return Ok(Array1::zeros(0));
            }
            let expected =
                (input.len() as u64 * u64::from(target_rate)).div_ceil(u64::from(source_rate));
            let expected = usize::try_from(expected).map_err(failure)?;
            let block = block_size(self.quality, input.len());

            let output = match self.quality {
                ResamplingQuality::Fast => {
                    let mut resampler = FftFixedInOut::<f64>::new(
                        source_rate as usize,
                        target_rate as usize,
                        block,
                        1,
                    )
                    .map_err(failure)?;
                    drive(&mut resampler, &input, expected)?
                }
                ResamplingQuality::Medium | ResamplingQuality::High => {
                    let mut resampler = SincFixedIn::<f64>::new(
                        f64::from(target_rate) / f64::from(source_rate),
                        2.0,
                        sinc_parameters(self.quality),
                        block,
                        1,
                    )
                    .map_err(failure)?;
                    drive(&mut resampler, &input, expected)?
                }
            };
            Ok(Array1::from_vec(output))
        }
    }
}
