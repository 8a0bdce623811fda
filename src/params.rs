//! Spectral transform parameters and constant-overlap-add validation.
//!
//! [`TransformParameters`] is the validated `(window_length, hop_length,
//! window_type)` triple attached to every [`AudioBuffer`](crate::AudioBuffer).
//! [`TransformSettings`] is its partially specified, serde-friendly counterpart:
//! unset fields are filled from sample-rate-derived defaults when resolved.
//!
//! ```rust
//! use audio_signal::{TransformParameters, TransformSettings, WindowType};
//!
//! let params = TransformParameters::resolve(&TransformSettings::default(), 44100).unwrap();
//! assert_eq!(params.window_length(), 2048);
//! assert_eq!(params.hop_length(), 512);
//! assert_eq!(params.window_type(), WindowType::Hann);
//!
//! // A Hann window at 10% overlap does not add up to a constant.
//! let bad = TransformSettings::new(Some(1000), Some(900), Some(WindowType::Hann));
//! assert!(TransformParameters::resolve(&bad, 44100).is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::window::WindowType;
use crate::{AudioSignalError, AudioSignalResult, COLA_TOLERANCE, DEFAULT_WINDOW_SECONDS};

/// Partially specified transform configuration.
///
/// Every field is optional; see [`TransformParameters::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Analysis window length in samples.
    pub window_length: Option<usize>,
    /// Hop between consecutive frames in samples.
    pub hop_length: Option<usize>,
    /// Window function.
    pub window_type: Option<WindowType>,
}

impl TransformSettings {
    /// Creates settings from optional fields.
    pub const fn new(
        window_length: Option<usize>,
        hop_length: Option<usize>,
        window_type: Option<WindowType>,
    ) -> Self {
        Self {
            window_length,
            hop_length,
            window_type,
        }
    }

    /// Sets the window length.
    pub const fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = Some(window_length);
        self
    }

    /// Sets the hop length.
    pub const fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = Some(hop_length);
        self
    }

    /// Sets the window type.
    pub const fn with_window_type(mut self, window_type: WindowType) -> Self {
        self.window_type = Some(window_type);
        self
    }
}

/// Validated spectral transform parameters.
///
/// Instances can only be obtained through validation, so holding one means the
/// inverse transform with these parameters reconstructs the forward transform's
/// input. Immutable: replace the whole value to change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTransformParameters")]
pub struct TransformParameters {
    window_length: usize,
    hop_length: usize,
    window_type: WindowType,
}

/// Unvalidated wire form of [`TransformParameters`].
#[derive(Deserialize)]
struct RawTransformParameters {
    window_length: usize,
    hop_length: usize,
    window_type: WindowType,
}

impl TryFrom<RawTransformParameters> for TransformParameters {
    type Error = AudioSignalError;

    fn try_from(raw: RawTransformParameters) -> AudioSignalResult<Self> {
        Self::new(raw.window_length, raw.hop_length, raw.window_type)
    }
}

impl TransformParameters {
    /// Validates a fully specified triple.
    ///
    /// # Errors
    /// Returns [`AudioSignalError::Configuration`] if the window is shorter than
    /// two samples, the hop is zero or longer than the window, or the triple
    /// fails the COLA check.
    pub fn new(
        window_length: usize,
        hop_length: usize,
        window_type: WindowType,
    ) -> AudioSignalResult<Self> {
        validate_lengths(window_length, hop_length)?;
        if !check_cola(window_type.cola_base(), window_length, hop_length) {
            return Err(AudioSignalError::configuration(format!(
                "window_type={window_type}, window_length={window_length}, \
                 hop_length={hop_length} does not satisfy the constant-overlap-add condition"
            )));
        }
        Ok(Self {
            window_length,
            hop_length,
            window_type,
        })
    }

    /// The default parameters for `sample_rate`.
    ///
    /// Window length is the next power of two covering 32 ms, hop is a quarter of
    /// the window and the window is Hann.
    pub fn default_for(sample_rate: u32) -> Self {
        let window_length = default_window_length(sample_rate);
        Self {
            window_length,
            hop_length: (window_length / 4).max(1),
            window_type: WindowType::Hann,
        }
    }

    /// Fills unset fields of `settings` from [`TransformParameters::default_for`]
    /// and validates the result.
    ///
    /// # Errors
    /// See [`TransformParameters::new`].
    pub fn resolve(settings: &TransformSettings, sample_rate: u32) -> AudioSignalResult<Self> {
        let defaults = Self::default_for(sample_rate);
        Self::new(
            settings.window_length.unwrap_or(defaults.window_length),
            settings.hop_length.unwrap_or(defaults.hop_length),
            settings.window_type.unwrap_or(defaults.window_type),
        )
    }

    /// Window length in samples.
    pub const fn window_length(&self) -> usize {
        self.window_length
    }

    /// Hop length in samples.
    pub const fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Window function.
    pub const fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Overlap between consecutive frames in samples.
    pub const fn overlap(&self) -> usize {
        self.window_length - self.hop_length
    }

    /// Number of one-sided frequency bins produced by the forward transform.
    pub const fn num_frequency_bins(&self) -> usize {
        self.window_length / 2 + 1
    }

    /// Returns these parameters as fully populated settings.
    pub const fn to_settings(&self) -> TransformSettings {
        TransformSettings::new(
            Some(self.window_length),
            Some(self.hop_length),
            Some(self.window_type),
        )
    }
}

impl fmt::Display for TransformParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransformParameters(window_length={}, hop_length={}, window_type={})",
            self.window_length, self.hop_length, self.window_type
        )
    }
}

pub(crate) fn validate_lengths(window_length: usize, hop_length: usize) -> AudioSignalResult<()> {
    if window_length < 2 {
        return Err(AudioSignalError::configuration(format!(
            "window_length must be at least 2, got {window_length}"
        )));
    }
    if hop_length == 0 || hop_length > window_length {
        return Err(AudioSignalError::configuration(format!(
            "hop_length must be in 1..={window_length}, got {hop_length}"
        )));
    }
    Ok(())
}

/// Next power of two at or above `DEFAULT_WINDOW_SECONDS * sample_rate`.
fn default_window_length(sample_rate: u32) -> usize {
    let target = DEFAULT_WINDOW_SECONDS * f64::from(sample_rate);
    let exponent = target.log2().ceil().max(1.0);
    2usize.pow(exponent as u32)
}

/// Checks the constant-overlap-add condition for a window/hop pair.
///
/// The window is split into `window_length / hop_length` consecutive
/// hop-sized segments which are summed bin-wise; any remainder is folded onto
/// the leading bins. The pair is COLA when every bin sum lies within
/// [`COLA_TOLERANCE`] of the median bin sum.
pub fn check_cola(window_type: WindowType, window_length: usize, hop_length: usize) -> bool {
    if window_length == 0 || hop_length == 0 || hop_length > window_length {
        return false;
    }
    let window = window_type.generate(window_length);
    let mut bin_sums = vec![0.0f64; hop_length];
    for segment in 0..window_length / hop_length {
        let start = segment * hop_length;
        for (bin, w) in bin_sums
            .iter_mut()
            .zip(window.slice(ndarray::s![start..start + hop_length]))
        {
            *bin += w;
        }
    }
    let remainder = window_length % hop_length;
    if remainder != 0 {
        let tail = window.slice(ndarray::s![window_length - remainder..]);
        for (bin, w) in bin_sums.iter_mut().zip(tail) {
            *bin += w;
        }
    }

    let center = median(&bin_sums);
    bin_sums
        .iter()
        .all(|sum| (sum - center).abs() < COLA_TOLERANCE)
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_sample_rate() {
        let params = TransformParameters::default_for(44100);
        assert_eq!(params.window_length(), 2048);
        assert_eq!(params.hop_length(), 512);
        assert_eq!(params.window_type(), WindowType::Hann);
        assert_eq!(params.num_frequency_bins(), 1025);

        let params = TransformParameters::default_for(8000);
        assert_eq!(params.window_length(), 256);
        assert_eq!(params.hop_length(), 64);
    }

    #[test]
    fn test_resolve_fills_only_unset_fields() {
        let settings = TransformSettings::default().with_hop_length(1024);
        let params = TransformParameters::resolve(&settings, 44100).unwrap();
        assert_eq!(params.window_length(), 2048);
        assert_eq!(params.hop_length(), 1024);
        assert_eq!(params.window_type(), WindowType::Hann);
    }

    #[test]
    fn test_cola_accepts_standard_pairs() {
        assert!(check_cola(WindowType::Hann, 512, 128));
        assert!(check_cola(WindowType::Hann, 512, 256));
        assert!(check_cola(WindowType::Hamming, 512, 256));
        assert!(check_cola(WindowType::Rectangular, 512, 512));
        assert!(check_cola(WindowType::Rectangular, 300, 100));
        assert!(check_cola(WindowType::Blackman, 513, 171));
    }

    #[test]
    fn test_cola_rejects_bad_pairs() {
        assert!(!check_cola(WindowType::Hann, 512, 500));
        assert!(!check_cola(WindowType::Hamming, 512, 300));
        assert!(!check_cola(WindowType::Rectangular, 512, 300));
        assert!(!check_cola(WindowType::Hann, 512, 0));
        assert!(!check_cola(WindowType::Hann, 512, 1024));
    }

    #[test]
    fn test_sqrt_hann_checked_against_hann() {
        let params = TransformParameters::new(1024, 256, WindowType::SqrtHann).unwrap();
        assert_eq!(params.window_type(), WindowType::SqrtHann);
        assert!(!check_cola(WindowType::SqrtHann, 1024, 256));
    }

    #[test]
    fn test_invalid_lengths_fail_fast() {
        assert!(TransformParameters::new(1, 1, WindowType::Hann)
            .unwrap_err()
            .is_configuration());
        assert!(TransformParameters::new(512, 0, WindowType::Hann)
            .unwrap_err()
            .is_configuration());
        assert!(TransformParameters::new(512, 513, WindowType::Rectangular)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_parameters_deserialize_through_validation() {
        let params = TransformParameters::new(512, 128, WindowType::Hann).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        let back: TransformParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);

        for bad in [
            r#"{"window_length": 512, "hop_length": 500, "window_type": "hann"}"#,
            r#"{"window_length": 512, "hop_length": 0, "window_type": "hann"}"#,
            r#"{"window_length": 256, "hop_length": 512, "window_type": "rectangular"}"#,
        ] {
            let err = serde_json::from_str::<TransformParameters>(bad).unwrap_err();
            assert!(err.to_string().starts_with("Configuration error"), "{err}");
        }
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: TransformSettings =
            serde_json::from_str(r#"{"window_length": 1024, "window_type": "hamming"}"#).unwrap();
        assert_eq!(settings.window_length, Some(1024));
        assert_eq!(settings.hop_length, None);
        // the default hop is derived from the default window, not the given one
        let params = TransformParameters::resolve(&settings, 16000).unwrap();
        assert_eq!(params.window_length(), 1024);
        assert_eq!(params.hop_length(), 128);
        assert_eq!(params.window_type(), WindowType::Hamming);
    }
}
