//! Time-domain sample storage with a non-destructive active region.

use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, ArrayViewMut2, Axis, Ix1, Ix2, s};

use crate::{AudioSignalError, AudioSignalResult};

/// Conversion into a raw sample array prior to validation.
///
/// Implemented for the shapes a caller is likely to hold: 1-D (mono), 2-D and
/// dynamic-rank float arrays, plain vectors, and 16-bit integer arrays, which
/// are rescaled to `[-1, 1)` by dividing by `i16::MAX + 1`.
pub trait IntoSampleArray {
    /// Converts `self` into a dynamic-rank float array.
    fn into_sample_array(self) -> ArrayD<f64>;
}

impl IntoSampleArray for ArrayD<f64> {
    fn into_sample_array(self) -> ArrayD<f64> {
        self
    }
}

impl IntoSampleArray for Array1<f64> {
    fn into_sample_array(self) -> ArrayD<f64> {
        self.into_dyn()
    }
}

impl IntoSampleArray for Array2<f64> {
    fn into_sample_array(self) -> ArrayD<f64> {
        self.into_dyn()
    }
}

impl IntoSampleArray for Vec<f64> {
    fn into_sample_array(self) -> ArrayD<f64> {
        Array1::from_vec(self).into_dyn()
    }
}

impl IntoSampleArray for ArrayView1<'_, f64> {
    fn into_sample_array(self) -> ArrayD<f64> {
        self.to_owned().into_dyn()
    }
}

impl IntoSampleArray for ArrayView2<'_, f64> {
    fn into_sample_array(self) -> ArrayD<f64> {
        self.to_owned().into_dyn()
    }
}

impl IntoSampleArray for Array1<i16> {
    fn into_sample_array(self) -> ArrayD<f64> {
        self.mapv(i16_to_float).into_dyn()
    }
}

impl IntoSampleArray for Array2<i16> {
    fn into_sample_array(self) -> ArrayD<f64> {
        self.mapv(i16_to_float).into_dyn()
    }
}

fn i16_to_float(sample: i16) -> f64 {
    f64::from(sample) / (f64::from(i16::MAX) + 1.0)
}

/// Owned `(channels, samples)` time-domain data with a read window.
///
/// The active region `[active_start, active_end)` restricts what
/// [`SampleBuffer::view`] exposes without copying or discarding anything
/// outside of it. Any replacement of the data resets the region to cover the
/// whole buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    data: Array2<f64>,
    active_start: usize,
    active_end: usize,
}

impl SampleBuffer {
    /// Validates and stores `samples`.
    ///
    /// A 1-D input becomes a single channel. A 2-D input whose first axis is
    /// longer than its second is assumed to be `(samples, channels)` and is
    /// transposed.
    ///
    /// # Errors
    /// - [`AudioSignalError::Domain`] if any value is not finite.
    /// - [`AudioSignalError::Shape`] if the input has zero or more than two dimensions.
    pub fn new(samples: impl IntoSampleArray) -> AudioSignalResult<Self> {
        let raw = samples.into_sample_array();
        if !raw.iter().all(|v| v.is_finite()) {
            return Err(AudioSignalError::domain(
                "not all values of the sample data are finite",
            ));
        }

        let data = match raw.ndim() {
            1 => {
                let mono = raw
                    .into_dimensionality::<Ix1>()
                    .map_err(|e| AudioSignalError::shape("1-D samples", e.to_string()))?;
                mono.insert_axis(Axis(0))
            }
            2 => {
                let multi = raw
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| AudioSignalError::shape("2-D samples", e.to_string()))?;
                let (rows, cols) = multi.dim();
                if rows > cols {
                    tracing::warn!(
                        rows,
                        cols,
                        "sample data has more channels than samples; transposing"
                    );
                    multi.reversed_axes().as_standard_layout().into_owned()
                } else {
                    multi
                }
            }
            ndim => {
                return Err(AudioSignalError::shape(
                    "1-D or 2-D sample data",
                    format!("{ndim}-D array"),
                ));
            }
        };

        let active_end = data.ncols();
        Ok(Self {
            data,
            active_start: 0,
            active_end,
        })
    }

    /// Wraps an array already laid out as `(channels, samples)`.
    ///
    /// Unlike [`SampleBuffer::new`] no orientation guess is made, so short
    /// multichannel results of internal edits keep their layout.
    pub(crate) fn from_array(data: Array2<f64>) -> AudioSignalResult<Self> {
        if !data.iter().all(|v| v.is_finite()) {
            return Err(AudioSignalError::domain(
                "not all values of the sample data are finite",
            ));
        }
        let active_end = data.ncols();
        Ok(Self {
            data,
            active_start: 0,
            active_end,
        })
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples per channel in the backing storage, ignoring the active region.
    pub fn total_length(&self) -> usize {
        self.data.ncols()
    }

    /// Number of samples per channel inside the active region.
    pub const fn active_length(&self) -> usize {
        self.active_end - self.active_start
    }

    /// Start of the active region.
    pub const fn active_start(&self) -> usize {
        self.active_start
    }

    /// End (exclusive) of the active region.
    pub const fn active_end(&self) -> usize {
        self.active_end
    }

    /// True when the buffer holds no samples at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Restricts reads to `[start, end)`.
    ///
    /// `start` is clamped to `0` and `end` to the total length; `start` is then
    /// clamped to `end`, so the region is never inverted.
    pub fn set_active_region(&mut self, start: i64, end: i64) {
        let total = self.total_length();
        let end = usize::try_from(end.max(0)).map_or(total, |e| e.min(total));
        let start = usize::try_from(start.max(0)).map_or(end, |s| s.min(end));
        self.active_start = start;
        self.active_end = end;
    }

    /// Restores the active region to `[0, total_length)`.
    pub fn reset_active_region(&mut self) {
        self.active_start = 0;
        self.active_end = self.total_length();
    }

    /// True iff the active region covers the whole buffer.
    pub fn active_region_is_default(&self) -> bool {
        self.active_start == 0 && self.active_end == self.total_length()
    }

    /// Samples inside the active region.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.slice(s![.., self.active_start..self.active_end])
    }

    /// The whole backing array, ignoring the active region.
    pub fn full_view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Mutable access to the whole backing array.
    pub(crate) fn full_view_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.data.view_mut()
    }

    /// One channel of the active region.
    ///
    /// # Panics
    /// Panics if `channel >= num_channels()`; callers bounds-check first.
    pub fn channel(&self, channel: usize) -> ArrayView1<'_, f64> {
        self.data
            .slice(s![channel, self.active_start..self.active_end])
    }

    /// Consumes the buffer and returns the backing array.
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

impl TryFrom<Array2<f64>> for SampleBuffer {
    type Error = AudioSignalError;

    fn try_from(value: Array2<f64>) -> AudioSignalResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<Array1<f64>> for SampleBuffer {
    type Error = AudioSignalError;

    fn try_from(value: Array1<f64>) -> AudioSignalResult<Self> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};

    #[test]
    fn test_mono_promoted_to_single_channel() {
        let buffer = SampleBuffer::new(array![0.1, 0.2, 0.3]).unwrap();
        assert_eq!(buffer.full_view().dim(), (1, 3));
        assert!(buffer.active_region_is_default());
    }

    #[test]
    fn test_orientation_normalization() {
        let tall = Array2::from_shape_fn((5, 2), |(r, c)| (r * 10 + c) as f64);
        let buffer = SampleBuffer::new(tall.clone()).unwrap();
        assert_eq!(buffer.full_view().dim(), (2, 5));
        assert_eq!(buffer.full_view(), tall.t());

        let wide = Array2::from_shape_fn((2, 5), |(r, c)| (r * 10 + c) as f64);
        let buffer = SampleBuffer::new(wide.clone()).unwrap();
        assert_eq!(buffer.full_view(), wide.view());
    }

    #[test]
    fn test_rejects_non_finite_and_bad_rank() {
        let err = SampleBuffer::new(array![0.0, f64::NAN]).unwrap_err();
        assert!(err.is_domain());
        let err = SampleBuffer::new(array![[0.0, f64::INFINITY], [1.0, 2.0]]).unwrap_err();
        assert!(err.is_domain());
        let err = SampleBuffer::new(Array3::<f64>::zeros((2, 2, 2)).into_dyn()).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_i16_input_is_scaled() {
        let buffer = SampleBuffer::new(array![16384i16, i16::MIN, 0]).unwrap();
        let view = buffer.view();
        assert_eq!(view[[0, 0]], 0.5);
        assert_eq!(view[[0, 1]], -1.0);
        assert_eq!(view[[0, 2]], 0.0);
    }

    #[test]
    fn test_active_region_is_a_window() {
        let mut buffer = SampleBuffer::new(Array2::from_shape_fn((2, 10), |(c, i)| {
            (c * 100 + i) as f64
        }))
        .unwrap();

        buffer.set_active_region(2, 7);
        assert_eq!(buffer.view().dim(), (2, 5));
        assert_eq!(buffer.channel(1)[0], 102.0);
        assert_eq!(buffer.total_length(), 10);
        assert!(!buffer.active_region_is_default());

        buffer.reset_active_region();
        assert_eq!(buffer.view().dim(), (2, 10));
        assert!(buffer.active_region_is_default());
    }

    #[test]
    fn test_from_array_keeps_layout() {
        let buffer = SampleBuffer::from_array(Array2::zeros((3, 0))).unwrap();
        assert_eq!(buffer.num_channels(), 3);
        assert_eq!(buffer.total_length(), 0);
        assert!(SampleBuffer::from_array(array![[f64::NAN]]).unwrap_err().is_domain());
    }

    #[test]
    fn test_active_region_clamps() {
        let mut buffer = SampleBuffer::new(Array1::<f64>::zeros(10)).unwrap();
        buffer.set_active_region(-5, 50);
        assert!(buffer.active_region_is_default());

        buffer.set_active_region(8, 3);
        assert_eq!(buffer.active_start(), 3);
        assert_eq!(buffer.active_end(), 3);
        assert_eq!(buffer.active_length(), 0);
    }
}
