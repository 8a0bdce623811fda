//! Elementwise arithmetic between buffers and scalar gain.
//!
//! Binary operators return [`AudioSignalResult`] because compatibility is only
//! known at runtime:
//!
//! ```rust
//! use audio_signal::{AudioBuffer, AudioSignalResult};
//! use ndarray::array;
//!
//! # fn main() -> AudioSignalResult<()> {
//! let a = AudioBuffer::from_samples(array![0.5, 0.25, 0.0], 8000)?;
//! let b = AudioBuffer::from_samples(array![0.25, 0.25, 0.25], 8000)?;
//!
//! let mix = (&a + &b)?;
//! let back = (&mix - &b)?;
//! assert_eq!(back.audio_data(), a.audio_data());
//!
//! let total: AudioSignalResult<AudioBuffer> = [a, b].iter().sum();
//! assert_eq!(total?.audio_data(), mix.audio_data());
//! # Ok(())
//! # }
//! ```
//!
//! There is no `*=` or `/=`: an assignment operator cannot report a
//! non-finite gain or an overflowing result. In-place scaling is
//! [`AudioBuffer::apply_gain`], which returns `&mut Self` for chaining:
//!
//! ```rust
//! use audio_signal::{AudioBuffer, AudioSignalResult};
//! use ndarray::array;
//!
//! # fn main() -> AudioSignalResult<()> {
//! let mut buffer = AudioBuffer::from_samples(array![1.0, 2.0], 8000)?;
//! buffer.apply_gain(4.0)?.apply_gain(1.0 / 2.0)?;
//! assert_eq!(buffer.audio_data().unwrap(), array![[2.0, 4.0]]);
//!
//! let seeded = (0 + buffer.clone())?;
//! assert_eq!(seeded, buffer);
//! # Ok(())
//! # }
//! ```

use std::iter::Sum;
use std::ops::{Add, Div, Mul, Sub};

use ndarray::{Array2, ArrayView2};

use crate::buffer::SampleBuffer;
use crate::{AudioBuffer, AudioSignalError, AudioSignalResult};

impl AudioBuffer {
    fn verify_arithmetic(&self, other: &AudioBuffer) -> AudioSignalResult<()> {
        let left = self.require_samples("do arithmetic")?;
        let right = other.require_samples("do arithmetic")?;
        if !left.active_region_is_default() || !right.active_region_is_default() {
            return Err(AudioSignalError::state(
                "cannot do arithmetic while an active region is not the full signal",
            ));
        }
        self.verify_compatible(other)?;
        if left.total_length() != right.total_length() {
            return Err(AudioSignalError::shape(
                format!("{} samples", left.total_length()),
                format!("{} samples", right.total_length()),
            ));
        }
        Ok(())
    }

    fn combine(
        &self,
        other: &AudioBuffer,
        op: impl Fn(ArrayView2<'_, f64>, ArrayView2<'_, f64>) -> Array2<f64>,
    ) -> AudioSignalResult<AudioBuffer> {
        self.verify_arithmetic(other)?;
        let (Some(left), Some(right)) = (&self.samples, &other.samples) else {
            return Err(AudioSignalError::state("cannot do arithmetic without audio data"));
        };
        let result = op(left.full_view(), right.full_view());
        let mut combined = self.clone();
        combined.samples = Some(SampleBuffer::from_array(result)?);
        Ok(combined)
    }

    /// Elementwise sum of the sample data as a new buffer.
    ///
    /// The result is a copy of `self` (spectral data included, unchanged) with
    /// the summed samples.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without sample data on either side, with a
    ///   non-default active region, or when the sample rates differ.
    /// - [`AudioSignalError::Shape`] when channel counts or lengths differ.
    pub fn add(&self, other: &AudioBuffer) -> AudioSignalResult<AudioBuffer> {
        self.combine(other, |a, b| &a + &b)
    }

    /// Elementwise difference of the sample data as a new buffer.
    ///
    /// # Errors
    /// See [`AudioBuffer::add`].
    pub fn subtract(&self, other: &AudioBuffer) -> AudioSignalResult<AudioBuffer> {
        self.combine(other, |a, b| &a - &b)
    }

    /// Multiplies every stored sample by `gain`, keeping the active region.
    ///
    /// Returns `self` so calls can be chained.
    ///
    /// # Errors
    /// - [`AudioSignalError::Domain`] for a non-finite gain or a result that
    ///   is no longer finite.
    /// - [`AudioSignalError::State`] without sample data.
    pub fn apply_gain(&mut self, gain: f64) -> AudioSignalResult<&mut Self> {
        if !gain.is_finite() {
            return Err(AudioSignalError::domain(format!(
                "can only apply a finite gain, got {gain}"
            )));
        }
        let samples = self
            .samples
            .as_mut()
            .ok_or_else(|| AudioSignalError::state("cannot apply gain without audio data"))?;
        let scaled = samples.full_view().mapv(|x| x * gain);
        if !scaled.iter().all(|x| x.is_finite()) {
            return Err(AudioSignalError::domain(format!(
                "applying a gain of {gain} overflows the sample data"
            )));
        }
        samples.full_view_mut().assign(&scaled);
        Ok(self)
    }

    fn scaled_copy(&self, gain: f64) -> AudioSignalResult<AudioBuffer> {
        if !gain.is_finite() {
            return Err(AudioSignalError::domain(format!(
                "can only multiply or divide by a finite scalar, got {gain}"
            )));
        }
        let samples = self.require_samples("scale")?;
        let scaled = samples.view().mapv(|x| x * gain);
        Ok(self.copy_with_samples(SampleBuffer::from_array(scaled)?))
    }
}

impl Add<&AudioBuffer> for &AudioBuffer {
    type Output = AudioSignalResult<AudioBuffer>;

    fn add(self, rhs: &AudioBuffer) -> Self::Output {
        AudioBuffer::add(self, rhs)
    }
}

impl Sub<&AudioBuffer> for &AudioBuffer {
    type Output = AudioSignalResult<AudioBuffer>;

    fn sub(self, rhs: &AudioBuffer) -> Self::Output {
        self.subtract(rhs)
    }
}

/// Adding the integer `0` returns the buffer unchanged, the seed of a
/// `0 + a + b + ...` reduction. Any other integer is rejected.
impl Add<i32> for AudioBuffer {
    type Output = AudioSignalResult<AudioBuffer>;

    fn add(self, rhs: i32) -> Self::Output {
        if rhs == 0 {
            Ok(self)
        } else {
            Err(AudioSignalError::domain(format!(
                "can only add another buffer or 0 to a buffer, got {rhs}"
            )))
        }
    }
}

/// `0 + buffer`, with the integer on the left.
impl Add<AudioBuffer> for i32 {
    type Output = AudioSignalResult<AudioBuffer>;

    fn add(self, rhs: AudioBuffer) -> Self::Output {
        rhs + self
    }
}

/// Sample data of the active region times a scalar, as a copy without
/// spectral data.
impl Mul<f64> for &AudioBuffer {
    type Output = AudioSignalResult<AudioBuffer>;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scaled_copy(rhs)
    }
}

/// Sample data of the active region divided by a non-zero scalar.
impl Div<f64> for &AudioBuffer {
    type Output = AudioSignalResult<AudioBuffer>;

    fn div(self, rhs: f64) -> Self::Output {
        if rhs == 0.0 {
            return Err(AudioSignalError::domain("cannot divide a buffer by zero"));
        }
        self.scaled_copy(1.0 / rhs)
    }
}

/// Sums a sequence of buffers; an empty sequence is a state error.
impl<'a> Sum<&'a AudioBuffer> for AudioSignalResult<AudioBuffer> {
    fn sum<I: Iterator<Item = &'a AudioBuffer>>(mut iter: I) -> Self {
        let first = iter
            .next()
            .ok_or_else(|| AudioSignalError::state("cannot sum an empty sequence of buffers"))?;
        iter.try_fold(first.clone(), |total, next| AudioBuffer::add(&total, next))
    }
}

impl Sum<AudioBuffer> for AudioSignalResult<AudioBuffer> {
    fn sum<I: Iterator<Item = AudioBuffer>>(mut iter: I) -> Self {
        let first = iter
            .next()
            .ok_or_else(|| AudioSignalError::state("cannot sum an empty sequence of buffers"))?;
        iter.try_fold(first, |total, next| AudioBuffer::add(&total, &next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    fn ramp(offset: f64) -> AudioBuffer {
        AudioBuffer::from_samples(
            Array2::from_shape_fn((2, 50), |(c, i)| offset + (c * 50 + i) as f64 / 100.0),
            8000,
        )
        .unwrap()
    }

    #[test]
    fn test_add_then_subtract() {
        let a = ramp(0.1);
        let b = ramp(-0.3);
        let restored = (&(&a + &b).unwrap() - &b).unwrap();
        for (x, y) in restored.audio_data().unwrap().iter().zip(a.audio_data().unwrap()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sum_matches_chained_addition() {
        let buffers = [ramp(0.0), ramp(0.5), ramp(-0.25)];
        let summed: AudioSignalResult<AudioBuffer> = buffers.iter().sum();
        let chained = (&(&buffers[0] + &buffers[1]).unwrap() + &buffers[2]).unwrap();
        assert_eq!(summed.unwrap(), chained);

        let seeded = (buffers[0].clone() + 0).unwrap();
        assert_eq!(seeded, buffers[0]);
        assert!((buffers[0].clone() + 3).unwrap_err().is_domain());
        assert_eq!((0 + buffers[0].clone()).unwrap(), buffers[0]);
        assert!((2 + buffers[0].clone()).unwrap_err().is_domain());

        let empty: AudioSignalResult<AudioBuffer> = std::iter::empty::<&AudioBuffer>().sum();
        assert!(empty.unwrap_err().is_state());
        let owned: AudioSignalResult<AudioBuffer> = buffers.clone().into_iter().sum();
        assert_eq!(owned.unwrap(), chained);
    }

    #[test]
    fn test_incompatible_operands() {
        let a = ramp(0.0);
        let shorter = AudioBuffer::from_samples(Array2::<f64>::zeros((2, 40)), 8000).unwrap();
        assert!((&a + &shorter).unwrap_err().is_shape());

        let mono = AudioBuffer::from_samples(Array1::<f64>::zeros(50), 8000).unwrap();
        assert!((&a + &mono).unwrap_err().is_shape());

        let faster = AudioBuffer::from_samples(Array2::<f64>::zeros((2, 50)), 16000).unwrap();
        assert!((&a - &faster).unwrap_err().is_state());

        let mut windowed = ramp(0.0);
        windowed.set_active_region(0, 10).unwrap();
        assert!((&a + &windowed).unwrap_err().is_state());
        assert!((&a + &AudioBuffer::empty()).unwrap_err().is_state());
    }

    #[test]
    fn test_gain_chains_and_keeps_region() {
        let mut buffer = AudioBuffer::from_samples(array![1.0, 2.0, 3.0, 4.0], 8000).unwrap();
        buffer.set_active_region(1, 3).unwrap();
        buffer.apply_gain(2.0).unwrap().apply_gain(0.25).unwrap();
        assert_eq!(buffer.audio_data().unwrap(), array![[1.0, 1.5]]);
        buffer.reset_active_region();
        assert_eq!(buffer.audio_data().unwrap(), array![[0.5, 1.0, 1.5, 2.0]]);

        assert!(buffer.apply_gain(f64::NAN).unwrap_err().is_domain());
        assert!(buffer.apply_gain(f64::MAX).unwrap_err().is_domain());
        assert_eq!(buffer.audio_data().unwrap(), array![[0.5, 1.0, 1.5, 2.0]]);
    }

    #[test]
    fn test_scalar_operators_copy() {
        let mut buffer = AudioBuffer::from_samples(array![1.0, -2.0], 8000).unwrap();
        buffer
            .transform_forward(crate::TransformSettings::new(Some(2), Some(1), None), true)
            .unwrap();

        let doubled = (&buffer * 2.0).unwrap();
        assert_eq!(doubled.audio_data().unwrap(), array![[2.0, -4.0]]);
        assert!(!doubled.has_stft_data());
        assert_eq!(buffer.audio_data().unwrap(), array![[1.0, -2.0]]);

        let halved = (&buffer / 2.0).unwrap();
        assert_eq!(halved.audio_data().unwrap(), array![[0.5, -1.0]]);
        assert!((&buffer / 0.0).unwrap_err().is_domain());
        assert!((&buffer * f64::INFINITY).unwrap_err().is_domain());
    }
}
