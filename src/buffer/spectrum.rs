//! Complex time-frequency storage.

use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayView3, Axis, Ix2, Ix3};
use num_complex::Complex64;

use crate::{AudioSignalError, AudioSignalResult};

/// Conversion into a raw complex spectral array prior to validation.
///
/// Real-valued arrays are accepted too: they are promoted to complex with a
/// zero imaginary part and a warning is emitted, since a real spectrum is
/// almost always a caller mistake.
pub trait IntoSpectrumArray {
    /// Converts `self` into a dynamic-rank complex array.
    fn into_spectrum_array(self) -> ArrayD<Complex64>;
}

impl IntoSpectrumArray for ArrayD<Complex64> {
    fn into_spectrum_array(self) -> ArrayD<Complex64> {
        self
    }
}

impl IntoSpectrumArray for Array2<Complex64> {
    fn into_spectrum_array(self) -> ArrayD<Complex64> {
        self.into_dyn()
    }
}

impl IntoSpectrumArray for Array3<Complex64> {
    fn into_spectrum_array(self) -> ArrayD<Complex64> {
        self.into_dyn()
    }
}

impl IntoSpectrumArray for ArrayD<f64> {
    fn into_spectrum_array(self) -> ArrayD<Complex64> {
        tracing::warn!("initializing spectral data with non-complex values");
        self.mapv(|re| Complex64::new(re, 0.0))
    }
}

impl IntoSpectrumArray for Array2<f64> {
    fn into_spectrum_array(self) -> ArrayD<Complex64> {
        self.into_dyn().into_spectrum_array()
    }
}

impl IntoSpectrumArray for Array3<f64> {
    fn into_spectrum_array(self) -> ArrayD<Complex64> {
        self.into_dyn().into_spectrum_array()
    }
}

/// Owned `(frequency_bins, time_frames, channels)` complex data.
///
/// Always fully materialized; there is no active-region concept here.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralBuffer {
    data: Array3<Complex64>,
}

impl SpectralBuffer {
    /// Validates and stores `spectrum`, expanding 2-D input with a trailing
    /// single-channel axis.
    ///
    /// # Errors
    /// [`AudioSignalError::Shape`] if the input is not 2-D or 3-D.
    pub fn new(spectrum: impl IntoSpectrumArray) -> AudioSignalResult<Self> {
        let raw = spectrum.into_spectrum_array();
        let data = match raw.ndim() {
            2 => raw
                .into_dimensionality::<Ix2>()
                .map_err(|e| AudioSignalError::shape("2-D spectrum", e.to_string()))?
                .insert_axis(Axis(2)),
            3 => raw
                .into_dimensionality::<Ix3>()
                .map_err(|e| AudioSignalError::shape("3-D spectrum", e.to_string()))?,
            ndim => {
                return Err(AudioSignalError::shape(
                    "2-D or 3-D spectral data",
                    format!("{ndim}-D array"),
                ));
            }
        };
        Ok(Self { data })
    }

    /// Wraps an already 3-D array.
    pub(crate) const fn from_array(data: Array3<Complex64>) -> Self {
        Self { data }
    }

    /// `(frequency_bins, time_frames, channels)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of frequency bins.
    pub fn num_frequency_bins(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Number of time frames.
    pub fn num_frames(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// True when the buffer holds no coefficients.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The whole spectrum.
    pub fn view(&self) -> ArrayView3<'_, Complex64> {
        self.data.view()
    }

    /// One channel as a `(frequency_bins, time_frames)` view.
    ///
    /// # Panics
    /// Panics if `channel >= num_channels()`; callers bounds-check first.
    pub fn channel(&self, channel: usize) -> ArrayView2<'_, Complex64> {
        self.data.index_axis(Axis(2), channel)
    }

    /// Consumes the buffer and returns the backing array.
    pub fn into_inner(self) -> Array3<Complex64> {
        self.data
    }
}
