//! Time-frequency masks and their application to spectral data.
//!
//! A mask is anything that can lend a real-valued array view through the
//! [`Mask`] trait. Plain `ndarray` arrays qualify directly; [`BinaryMask`] and
//! [`SoftMask`] add construction-time validation.
//!
//! For a spectrum of shape `(F, T, C)` a mask must be either `(F, T, C)` or
//! `(F, T)`, in which case it is applied to every channel.

use ndarray::{Array, Array3, ArrayD, ArrayView, ArrayViewD, Axis, Dimension, Ix2, Ix3, Zip};
use num_complex::Complex64;

use crate::{AudioBuffer, AudioSignalError, AudioSignalResult};

/// Capability of providing a real-valued mask array.
pub trait Mask {
    /// The mask values.
    fn mask_view(&self) -> ArrayViewD<'_, f64>;
}

impl<D: Dimension> Mask for Array<f64, D> {
    fn mask_view(&self) -> ArrayViewD<'_, f64> {
        self.view().into_dyn()
    }
}

impl<D: Dimension> Mask for ArrayView<'_, f64, D> {
    fn mask_view(&self) -> ArrayViewD<'_, f64> {
        self.view().into_dyn()
    }
}

impl<M: Mask + ?Sized> Mask for &M {
    fn mask_view(&self) -> ArrayViewD<'_, f64> {
        (**self).mask_view()
    }
}

/// A mask whose entries are exactly `0.0` or `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    mask: ArrayD<f64>,
}

impl BinaryMask {
    /// Builds a mask from boolean selections.
    pub fn new<D: Dimension>(selection: Array<bool, D>) -> Self {
        Self {
            mask: selection.mapv(f64::from).into_dyn(),
        }
    }

    /// Selects entries of `values` strictly greater than `threshold`.
    pub fn from_threshold<D: Dimension>(values: ArrayView<'_, f64, D>, threshold: f64) -> Self {
        Self::new(values.mapv(|v| v > threshold))
    }

    /// The complementary selection.
    pub fn inverse(&self) -> Self {
        Self {
            mask: self.mask.mapv(|m| 1.0 - m),
        }
    }

    /// Shape of the mask.
    pub fn shape(&self) -> &[usize] {
        self.mask.shape()
    }
}

impl Mask for BinaryMask {
    fn mask_view(&self) -> ArrayViewD<'_, f64> {
        self.mask.view()
    }
}

/// A mask with entries in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftMask {
    mask: ArrayD<f64>,
}

impl SoftMask {
    /// Validates and wraps `values`.
    ///
    /// # Errors
    /// [`AudioSignalError::Domain`] if any value is outside `[0, 1]` or not finite.
    pub fn new<D: Dimension>(values: Array<f64, D>) -> AudioSignalResult<Self> {
        if let Some(bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(AudioSignalError::domain(format!(
                "soft mask values must lie in [0, 1], found {bad}"
            )));
        }
        Ok(Self {
            mask: values.into_dyn(),
        })
    }

    /// `1 - mask`.
    pub fn inverse(&self) -> Self {
        Self {
            mask: self.mask.mapv(|m| 1.0 - m),
        }
    }

    /// Selects entries at or above `threshold`.
    pub fn to_binary(&self, threshold: f64) -> BinaryMask {
        BinaryMask::new(self.mask.mapv(|m| m >= threshold))
    }

    /// Shape of the mask.
    pub fn shape(&self) -> &[usize] {
        self.mask.shape()
    }
}

impl Mask for SoftMask {
    fn mask_view(&self) -> ArrayViewD<'_, f64> {
        self.mask.view()
    }
}

fn mask_shape_error(mask: &[usize], spectrum: (usize, usize, usize)) -> AudioSignalError {
    let (f, t, c) = spectrum;
    AudioSignalError::shape(
        format!("mask of shape ({f}, {t}, {c}) or ({f}, {t})"),
        format!("{mask:?}"),
    )
}

impl AudioBuffer {
    /// The stored spectrum multiplied elementwise by `mask`.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without spectral data.
    /// - [`AudioSignalError::Shape`] if the mask is neither `(F, T, C)` nor `(F, T)`.
    pub fn masked_spectrum<M: Mask + ?Sized>(&self, mask: &M) -> AudioSignalResult<Array3<Complex64>> {
        let spectrum = self.require_spectrum("apply a mask")?;
        let dim = spectrum.dim();
        let view = mask.mask_view();
        let shape = view.shape().to_vec();

        let mask3 = match shape.as_slice() {
            &[f, t, c] if (f, t, c) == dim => view
                .into_dimensionality::<Ix3>()
                .map_err(|_| mask_shape_error(&shape, dim))?,
            &[f, t] if (f, t) == (dim.0, dim.1) => view
                .into_dimensionality::<Ix2>()
                .map_err(|_| mask_shape_error(&shape, dim))?
                .insert_axis(Axis(2)),
            _ => return Err(mask_shape_error(&shape, dim)),
        };
        let mask3 = mask3
            .broadcast(dim)
            .ok_or_else(|| mask_shape_error(&shape, dim))?;

        let mut masked = spectrum.view().to_owned();
        Zip::from(&mut masked)
            .and(&mask3)
            .for_each(|coefficient, &m| *coefficient *= m);
        Ok(masked)
    }

    /// Applies `mask` to the stored spectrum.
    ///
    /// With `overwrite` the spectrum is replaced in place and `None` is
    /// returned. Otherwise a new buffer carrying the masked spectrum and no
    /// sample data is returned and `self` is left untouched.
    ///
    /// # Errors
    /// See [`AudioBuffer::masked_spectrum`].
    pub fn apply_mask<M: Mask + ?Sized>(
        &mut self,
        mask: &M,
        overwrite: bool,
    ) -> AudioSignalResult<Option<AudioBuffer>> {
        let masked = self.masked_spectrum(mask)?;
        if overwrite {
            self.set_stft_data(masked)?;
            Ok(None)
        } else {
            self.make_copy_with_spectral_data(masked, false).map(Some)
        }
    }
}
