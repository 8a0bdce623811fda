//! The [`AudioBuffer`] composite and its builder.
//!
//! An `AudioBuffer` carries one logical signal in up to two representations:
//! time-domain samples and a complex spectrum. They are stored independently.
//! [`AudioBuffer::transform_forward`] and [`AudioBuffer::transform_inverse`]
//! are the only operations that move data from one to the other; every other
//! mutation leaves the opposite representation as it was, stale or not.

use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3, ArrayD, ArrayView2, ArrayView3, Axis, concatenate, s};
use num_complex::Complex64;

use crate::buffer::{IntoSampleArray, IntoSpectrumArray, SampleBuffer, SpectralBuffer};
use crate::io::AudioReader;
use crate::params::{TransformParameters, TransformSettings, validate_lengths};
use crate::transform::{RustFftKernel, SpectralKernel, forward_channels, inverse_channels};
use crate::window::WindowType;
use crate::{AudioSignalError, AudioSignalResult, DEFAULT_SAMPLE_RATE};

/// One logical audio signal with time-domain and spectral representations.
///
/// # Example
/// ```rust
/// use audio_signal::{AudioBuffer, TransformSettings, WindowType};
/// use ndarray::Array1;
///
/// let tone = Array1::from_shape_fn(16000, |i| (i as f64 * 0.05).sin());
/// let mut buffer = AudioBuffer::builder()
///     .samples(tone.clone())
///     .sample_rate(16000)
///     .settings(TransformSettings::new(Some(512), Some(128), Some(WindowType::Hann)))
///     .build()
///     .unwrap();
///
/// let spectrum = buffer.transform_forward(TransformSettings::default(), true).unwrap();
/// assert_eq!(spectrum.dim(), (257, 126, 1));
///
/// let restored = buffer.transform_inverse(TransformSettings::default(), false, None).unwrap();
/// assert_eq!(restored.dim(), (1, 16000));
/// assert!((restored[[0, 100]] - tone[100]).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub(crate) path: Option<PathBuf>,
    pub(crate) label: Option<String>,
    pub(crate) sample_rate: u32,
    pub(crate) original_signal_length: Option<usize>,
    pub(crate) samples: Option<SampleBuffer>,
    pub(crate) spectrum: Option<SpectralBuffer>,
    pub(crate) params: TransformParameters,
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl AudioBuffer {
    /// Starts building a buffer from at most one data source.
    pub fn builder<'a>() -> AudioBufferBuilder<'a> {
        AudioBufferBuilder::default()
    }

    /// A buffer with no data, the default sample rate and default transform parameters.
    pub fn empty() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            path: None,
            label: None,
            sample_rate,
            original_signal_length: None,
            samples: None,
            spectrum: None,
            params: TransformParameters::default_for(sample_rate),
        }
    }

    /// Builds a buffer from time-domain samples.
    ///
    /// # Errors
    /// See [`SampleBuffer::new`].
    pub fn from_samples(samples: impl IntoSampleArray, sample_rate: u32) -> AudioSignalResult<Self> {
        Self::builder().samples(samples).sample_rate(sample_rate).build()
    }

    /// Builds a buffer from spectral data. The buffer has no samples until
    /// [`AudioBuffer::transform_inverse`] runs.
    ///
    /// # Errors
    /// See [`SpectralBuffer::new`].
    pub fn from_spectrum(
        spectrum: impl IntoSpectrumArray,
        sample_rate: u32,
    ) -> AudioSignalResult<Self> {
        Self::builder()
            .spectrum(spectrum)
            .sample_rate(sample_rate)
            .build()
    }

    /// Copies every field except the two data representations.
    fn metadata_copy(&self) -> Self {
        Self {
            path: self.path.clone(),
            label: self.label.clone(),
            sample_rate: self.sample_rate,
            original_signal_length: self.original_signal_length,
            samples: None,
            spectrum: None,
            params: self.params,
        }
    }

    // ------------------------------------------------------------------
    // Data access
    // ------------------------------------------------------------------

    /// Sample data inside the active region, `(channels, samples)`.
    pub fn audio_data(&self) -> Option<ArrayView2<'_, f64>> {
        self.samples.as_ref().map(SampleBuffer::view)
    }

    /// All stored sample data, ignoring the active region.
    pub fn full_audio_data(&self) -> Option<ArrayView2<'_, f64>> {
        self.samples.as_ref().map(SampleBuffer::full_view)
    }

    /// Replaces the sample data and resets the active region.
    ///
    /// The spectral data is left untouched.
    ///
    /// # Errors
    /// See [`SampleBuffer::new`]. The buffer is unchanged on error.
    pub fn set_audio_data(&mut self, samples: impl IntoSampleArray) -> AudioSignalResult<()> {
        self.samples = Some(SampleBuffer::new(samples)?);
        Ok(())
    }

    /// Drops the sample data.
    pub fn clear_audio_data(&mut self) {
        self.samples = None;
    }

    /// The stored spectrum, `(frequency_bins, time_frames, channels)`.
    pub fn stft_data(&self) -> Option<ArrayView3<'_, Complex64>> {
        self.spectrum.as_ref().map(SpectralBuffer::view)
    }

    /// Replaces the spectral data. Sample data is left untouched.
    ///
    /// # Errors
    /// See [`SpectralBuffer::new`]. The buffer is unchanged on error.
    pub fn set_stft_data(&mut self, spectrum: impl IntoSpectrumArray) -> AudioSignalResult<()> {
        self.spectrum = Some(SpectralBuffer::new(spectrum)?);
        Ok(())
    }

    /// Drops the spectral data.
    pub fn clear_stft_data(&mut self) {
        self.spectrum = None;
    }

    pub(crate) fn require_spectrum(&self, operation: &str) -> AudioSignalResult<&SpectralBuffer> {
        self.spectrum
            .as_ref()
            .filter(|spectrum| !spectrum.is_empty())
            .ok_or_else(|| {
                AudioSignalError::state(format!("cannot {operation} without spectral data"))
            })
    }

    pub(crate) fn require_samples(&self, operation: &str) -> AudioSignalResult<&SampleBuffer> {
        self.samples.as_ref().ok_or_else(|| {
            AudioSignalError::state(format!("cannot {operation} without audio data"))
        })
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    /// Sample rate in Hz.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The file this buffer was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name (with extension) of [`AudioBuffer::path`].
    pub fn file_name(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Free-form label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Length in samples of the data as first loaded.
    pub const fn original_signal_length(&self) -> Option<usize> {
        self.original_signal_length
    }

    /// The transform parameters used when a transform call leaves a field unset.
    pub const fn transform_parameters(&self) -> TransformParameters {
        self.params
    }

    /// Replaces the transform parameters wholesale.
    pub fn set_transform_parameters(&mut self, params: TransformParameters) {
        self.params = params;
    }

    /// Resolves `settings` against this buffer's sample rate and stores the result.
    ///
    /// # Errors
    /// [`AudioSignalError::Configuration`] if the resolved triple is invalid;
    /// the stored parameters are unchanged.
    pub fn set_transform_settings(&mut self, settings: &TransformSettings) -> AudioSignalResult<()> {
        self.params = TransformParameters::resolve(settings, self.sample_rate)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Derived properties
    // ------------------------------------------------------------------

    /// Samples per channel in the active region, else the original length.
    pub fn signal_length(&self) -> Option<usize> {
        match &self.samples {
            Some(samples) => Some(samples.active_length()),
            None => self.original_signal_length,
        }
    }

    /// [`AudioBuffer::signal_length`] in seconds.
    pub fn signal_duration(&self) -> Option<f64> {
        self.signal_length()
            .map(|length| length as f64 / f64::from(self.sample_rate))
    }

    /// Channel count of the sample data, else of the spectral data.
    pub fn num_channels(&self) -> Option<usize> {
        match (&self.samples, &self.spectrum) {
            (Some(samples), _) => Some(samples.num_channels()),
            (None, Some(spectrum)) => Some(spectrum.num_channels()),
            (None, None) => None,
        }
    }

    /// Exactly one channel.
    pub fn is_mono(&self) -> bool {
        self.num_channels() == Some(1)
    }

    /// Exactly two channels.
    pub fn is_stereo(&self) -> bool {
        self.num_channels() == Some(2)
    }

    /// True if non-empty sample data is present.
    pub fn has_audio_data(&self) -> bool {
        self.samples.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// True if non-empty spectral data is present.
    pub fn has_stft_data(&self) -> bool {
        self.spectrum.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// True if either representation holds data.
    pub fn has_data(&self) -> bool {
        self.has_audio_data() || self.has_stft_data()
    }

    /// Same as [`AudioBuffer::signal_length`], zero when unknown.
    pub fn len(&self) -> usize {
        self.signal_length().unwrap_or(0)
    }

    /// True when [`AudioBuffer::len`] is zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamps in seconds for each sample of the active region.
    pub fn time_vector(&self) -> Option<Array1<f64>> {
        let length = self.signal_length()?;
        let duration = self.signal_duration()?;
        Some(Array1::linspace(0.0, duration, length))
    }

    /// Frequency in Hz of each spectral bin, linearly spaced up to Nyquist.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without spectral data.
    pub fn freq_vector(&self) -> AudioSignalResult<Array1<f64>> {
        let spectrum = self.require_spectrum("compute the frequency vector")?;
        Ok(Array1::linspace(
            0.0,
            f64::from(self.sample_rate / 2),
            spectrum.num_frequency_bins(),
        ))
    }

    /// Time in seconds of each spectral frame.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without spectral data.
    pub fn time_bins_vector(&self) -> AudioSignalResult<Array1<f64>> {
        let spectrum = self.require_spectrum("compute the time bins vector")?;
        let duration = self.signal_duration().unwrap_or(0.0);
        Ok(Array1::linspace(0.0, duration, spectrum.num_frames()))
    }

    /// Number of spectral frames.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without spectral data.
    pub fn stft_length(&self) -> AudioSignalResult<usize> {
        Ok(self.require_spectrum("compute the stft length")?.num_frames())
    }

    /// `|S|²` for every coefficient.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without spectral data.
    pub fn power_spectrogram_data(&self) -> AudioSignalResult<Array3<f64>> {
        Ok(self
            .require_spectrum("compute the power spectrogram")?
            .view()
            .mapv(|c| c.norm_sqr()))
    }

    /// `|S|` for every coefficient.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without spectral data.
    pub fn magnitude_spectrogram_data(&self) -> AudioSignalResult<Array3<f64>> {
        Ok(self
            .require_spectrum("compute the magnitude spectrogram")?
            .view()
            .mapv(|c| c.norm()))
    }

    /// `20·log10(|S| + 1e-8)` for every coefficient.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without spectral data.
    pub fn log_magnitude_spectrogram_data(&self) -> AudioSignalResult<Array3<f64>> {
        Ok(self
            .require_spectrum("compute the log magnitude spectrogram")?
            .view()
            .mapv(|c| 20.0 * (c.norm() + 1e-8).log10()))
    }

    /// Root mean square over every sample of the active region.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without sample data or with an empty active region.
    pub fn rms(&self) -> AudioSignalResult<f64> {
        let samples = self.require_samples("compute rms")?;
        samples
            .view()
            .mapv(|x| x * x)
            .mean()
            .map(f64::sqrt)
            .ok_or_else(|| AudioSignalError::state("cannot compute rms of an empty signal"))
    }

    // ------------------------------------------------------------------
    // Active region
    // ------------------------------------------------------------------

    /// Restricts sample reads to `[start, end)`.
    ///
    /// `start` is clamped to zero and `end` to the stored length. Nothing is
    /// discarded; [`AudioBuffer::reset_active_region`] makes it all visible again.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without sample data.
    pub fn set_active_region(&mut self, start: i64, end: i64) -> AudioSignalResult<()> {
        self.samples
            .as_mut()
            .ok_or_else(|| AudioSignalError::state("cannot set an active region without audio data"))?
            .set_active_region(start, end);
        Ok(())
    }

    /// Makes the full stored signal visible again.
    pub fn reset_active_region(&mut self) {
        if let Some(samples) = self.samples.as_mut() {
            samples.reset_active_region();
        }
    }

    /// True if the active region covers all stored samples, or there are none.
    pub fn active_region_is_default(&self) -> bool {
        self.samples
            .as_ref()
            .is_none_or(SampleBuffer::active_region_is_default)
    }

    fn require_default_region(&self, operation: &str) -> AudioSignalResult<&SampleBuffer> {
        let samples = self.require_samples(operation)?;
        if !samples.active_region_is_default() {
            return Err(AudioSignalError::state(format!(
                "cannot {operation} while the active region is not the full signal"
            )));
        }
        Ok(samples)
    }

    // ------------------------------------------------------------------
    // Spectral transforms
    // ------------------------------------------------------------------

    fn effective_transform(
        &self,
        settings: &TransformSettings,
    ) -> AudioSignalResult<(usize, usize, WindowType)> {
        let window_length = settings
            .window_length
            .unwrap_or_else(|| self.params.window_length());
        let hop_length = settings
            .hop_length
            .unwrap_or_else(|| self.params.hop_length());
        let window_type = settings
            .window_type
            .unwrap_or_else(|| self.params.window_type());
        validate_lengths(window_length, hop_length)?;
        Ok((window_length, hop_length, window_type))
    }

    /// Forward transform of the active region using the default kernel.
    ///
    /// Fields left unset in `settings` come from
    /// [`AudioBuffer::transform_parameters`]. The result is always returned and
    /// is also stored as the buffer's spectrum when `overwrite` is set.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without sample data.
    /// - [`AudioSignalError::Configuration`] for invalid window or hop lengths.
    pub fn transform_forward(
        &mut self,
        settings: TransformSettings,
        overwrite: bool,
    ) -> AudioSignalResult<Array3<Complex64>> {
        self.transform_forward_with(&RustFftKernel, settings, overwrite)
    }

    /// [`AudioBuffer::transform_forward`] with an explicit kernel.
    ///
    /// # Errors
    /// See [`AudioBuffer::transform_forward`]; kernel errors are propagated.
    pub fn transform_forward_with<K: SpectralKernel + ?Sized>(
        &mut self,
        kernel: &K,
        settings: TransformSettings,
        overwrite: bool,
    ) -> AudioSignalResult<Array3<Complex64>> {
        let samples = self
            .samples
            .as_ref()
            .filter(|samples| !samples.view().is_empty())
            .ok_or_else(|| {
                AudioSignalError::state("cannot do a forward transform without audio data")
            })?;
        let (window_length, hop_length, window_type) = self.effective_transform(&settings)?;

        let spectrum = forward_channels(
            kernel,
            samples.view(),
            self.sample_rate,
            window_length,
            hop_length,
            window_type,
        )?;

        if overwrite {
            self.spectrum = Some(SpectralBuffer::from_array(spectrum.clone()));
        }
        Ok(spectrum)
    }

    /// Inverse transform of the stored spectrum using the default kernel.
    ///
    /// The output is truncated to `truncate_to_length` if given, else to the
    /// current [`AudioBuffer::signal_length`]; a target of zero or an unknown
    /// length leaves it untruncated. The result is stored as the sample data
    /// when `overwrite` is set or no sample data exists.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without spectral data.
    /// - [`AudioSignalError::Configuration`] for invalid window or hop lengths.
    /// - [`AudioSignalError::Shape`] if the bin count does not match the window length.
    pub fn transform_inverse(
        &mut self,
        settings: TransformSettings,
        overwrite: bool,
        truncate_to_length: Option<usize>,
    ) -> AudioSignalResult<Array2<f64>> {
        self.transform_inverse_with(&RustFftKernel, settings, overwrite, truncate_to_length)
    }

    /// [`AudioBuffer::transform_inverse`] with an explicit kernel.
    ///
    /// # Errors
    /// See [`AudioBuffer::transform_inverse`]; kernel errors are propagated.
    pub fn transform_inverse_with<K: SpectralKernel + ?Sized>(
        &mut self,
        kernel: &K,
        settings: TransformSettings,
        overwrite: bool,
        truncate_to_length: Option<usize>,
    ) -> AudioSignalResult<Array2<f64>> {
        let spectrum = self.require_spectrum("do an inverse transform")?;
        let (window_length, hop_length, window_type) = self.effective_transform(&settings)?;

        let mut signal = inverse_channels(
            kernel,
            spectrum.view(),
            self.sample_rate,
            window_length,
            hop_length,
            window_type,
        )?;

        let target = truncate_to_length.or_else(|| self.signal_length());
        if let Some(length) = target.filter(|&length| length > 0 && length < signal.ncols()) {
            signal = signal.slice(s![.., ..length]).to_owned();
        }

        if overwrite || self.samples.is_none() {
            self.samples = Some(SampleBuffer::from_array(signal.clone())?);
        }
        Ok(signal)
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Appends the active samples of `other` after this buffer's samples.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without sample data on either side, with a
    ///   non-default active region, or when the sample rates differ.
    /// - [`AudioSignalError::Shape`] when the channel counts differ.
    pub fn concat(&mut self, other: &AudioBuffer) -> AudioSignalResult<()> {
        let samples = self.require_default_region("concatenate")?;
        let appended = other.require_samples("concatenate")?;
        self.verify_compatible(other)?;

        let joined = concatenate(Axis(1), &[samples.full_view(), appended.view()])
            .map_err(|e| AudioSignalError::shape("matching channel counts", e.to_string()))?;
        self.samples = Some(SampleBuffer::from_array(joined)?);
        Ok(())
    }

    /// Keeps only the first `n_samples` samples of every channel.
    ///
    /// Lengths beyond the current signal leave it unchanged.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without sample data or with a non-default active region.
    pub fn truncate_samples(&mut self, n_samples: usize) -> AudioSignalResult<()> {
        let samples = self.require_default_region("truncate")?;
        let keep = n_samples.min(samples.total_length());
        let truncated = samples.full_view().slice(s![.., ..keep]).to_owned();
        self.samples = Some(SampleBuffer::from_array(truncated)?);
        Ok(())
    }

    /// Keeps only the first `n_seconds` of every channel.
    ///
    /// # Errors
    /// - [`AudioSignalError::Domain`] for a negative or non-finite duration.
    /// - See [`AudioBuffer::truncate_samples`].
    pub fn truncate_seconds(&mut self, n_seconds: f64) -> AudioSignalResult<()> {
        if !n_seconds.is_finite() || n_seconds < 0.0 {
            return Err(AudioSignalError::domain(format!(
                "cannot truncate to {n_seconds} seconds"
            )));
        }
        self.truncate_samples((n_seconds * f64::from(self.sample_rate)) as usize)
    }

    /// Removes `before` samples from the start and `after` samples from the end.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without sample data or with a non-default active region.
    /// - [`AudioSignalError::Domain`] if more samples would be removed than exist.
    pub fn crop_signal(&mut self, before: usize, after: usize) -> AudioSignalResult<()> {
        let samples = self.require_default_region("crop")?;
        let length = samples.total_length();
        let end = before
            .checked_add(after)
            .filter(|&removed| removed <= length)
            .map(|_| length - after)
            .ok_or_else(|| {
                AudioSignalError::domain(format!(
                    "cannot crop {before} + {after} samples from a signal of {length} samples"
                ))
            })?;
        let cropped = samples.full_view().slice(s![.., before..end]).to_owned();
        self.samples = Some(SampleBuffer::from_array(cropped)?);
        Ok(())
    }

    /// Surrounds every channel with `before` and `after` zeros.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without sample data or with a non-default active region.
    pub fn zero_pad(&mut self, before: usize, after: usize) -> AudioSignalResult<()> {
        let samples = self.require_default_region("zero-pad")?;
        let length = samples.total_length();
        let mut padded = Array2::zeros((samples.num_channels(), before + length + after));
        padded
            .slice_mut(s![.., before..before + length])
            .assign(&samples.full_view());
        self.samples = Some(SampleBuffer::from_array(padded)?);
        Ok(())
    }

    /// Channel count and sample rate must agree for joint operations.
    pub(crate) fn verify_compatible(&self, other: &AudioBuffer) -> AudioSignalResult<()> {
        if self.num_channels() != other.num_channels() {
            return Err(AudioSignalError::shape(
                format!("{:?} channels", self.num_channels()),
                format!("{:?} channels", other.num_channels()),
            ));
        }
        if self.sample_rate != other.sample_rate {
            return Err(AudioSignalError::state(format!(
                "cannot combine signals at {} Hz and {} Hz",
                self.sample_rate, other.sample_rate
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Copies
    // ------------------------------------------------------------------

    /// A deep copy carrying `samples` and no spectral data.
    ///
    /// With `verbose`, warns when this buffer's active region is not the full
    /// signal or the new data's shape differs from the current active data.
    ///
    /// # Errors
    /// See [`SampleBuffer::new`].
    pub fn make_copy_with_audio_data(
        &self,
        samples: impl IntoSampleArray,
        verbose: bool,
    ) -> AudioSignalResult<AudioBuffer> {
        let samples = SampleBuffer::new(samples)?;
        if verbose {
            if !self.active_region_is_default() {
                tracing::warn!("making a copy while the active region is not the full signal");
            }
            if let Some(current) = self.audio_data() {
                if current.dim() != samples.full_view().dim() {
                    tracing::warn!(
                        current = ?current.dim(),
                        new = ?samples.full_view().dim(),
                        "shape of new audio data does not match the current audio data"
                    );
                }
            }
        }
        Ok(self.copy_with_samples(samples))
    }

    pub(crate) fn copy_with_samples(&self, samples: SampleBuffer) -> AudioBuffer {
        let mut copy = self.metadata_copy();
        copy.samples = Some(samples);
        copy
    }

    /// A deep copy carrying `spectrum` and no sample data.
    ///
    /// The original signal length is kept so a later inverse transform
    /// truncates to it.
    ///
    /// # Errors
    /// See [`SpectralBuffer::new`].
    pub fn make_copy_with_spectral_data(
        &self,
        spectrum: impl IntoSpectrumArray,
        verbose: bool,
    ) -> AudioSignalResult<AudioBuffer> {
        let spectrum = SpectralBuffer::new(spectrum)?;
        if verbose {
            if !self.active_region_is_default() {
                tracing::warn!("making a copy while the active region is not the full signal");
            }
            if let Some(current) = &self.spectrum {
                if current.dim() != spectrum.dim() {
                    tracing::warn!(
                        current = ?current.dim(),
                        new = ?spectrum.dim(),
                        "shape of new spectral data does not match the current spectral data"
                    );
                }
            }
        }
        Ok(self.copy_with_spectrum(spectrum))
    }

    pub(crate) fn copy_with_spectrum(&self, spectrum: SpectralBuffer) -> AudioBuffer {
        let mut copy = self.metadata_copy();
        copy.spectrum = Some(spectrum);
        copy
    }
}

impl fmt::Display for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioBuffer ({}): ", self.label.as_deref().unwrap_or("unlabeled"))?;
        match self.num_channels().filter(|&n| n > 0) {
            Some(channels) => write!(f, "{channels} ch, ")?,
            None => f.write_str("[unknown] ch, ")?,
        }
        match self.signal_duration().filter(|&d| d > 0.0) {
            Some(duration) => write!(f, "{duration} sec @ ")?,
            None => f.write_str("[unknown] sec @ ")?,
        }
        match &self.path {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str("path unknown"),
        }
    }
}

/// Builder for [`AudioBuffer`].
///
/// At most one of [`path`](Self::path), [`samples`](Self::samples) and
/// [`spectrum`](Self::spectrum) may be set; [`build`](Self::build) rejects
/// more with a configuration error.
#[derive(Default)]
pub struct AudioBufferBuilder<'a> {
    path: Option<PathBuf>,
    offset: f64,
    duration: Option<f64>,
    samples: Option<ArrayD<f64>>,
    spectrum: Option<ArrayD<Complex64>>,
    label: Option<String>,
    sample_rate: Option<u32>,
    settings: TransformSettings,
    reader: Option<&'a dyn AudioReader>,
}

impl fmt::Debug for AudioBufferBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBufferBuilder")
            .field("path", &self.path)
            .field("offset", &self.offset)
            .field("duration", &self.duration)
            .field("samples", &self.samples.as_ref().map(ArrayD::shape))
            .field("spectrum", &self.spectrum.as_ref().map(ArrayD::shape))
            .field("label", &self.label)
            .field("sample_rate", &self.sample_rate)
            .field("settings", &self.settings)
            .field("reader", &self.reader.is_some())
            .finish()
    }
}

impl<'a> AudioBufferBuilder<'a> {
    /// Load samples from an audio file.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Start reading the file at `seconds`.
    pub const fn offset(mut self, seconds: f64) -> Self {
        self.offset = seconds;
        self
    }

    /// Read at most `seconds` of the file.
    pub const fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Use `samples` as the time-domain data.
    pub fn samples(mut self, samples: impl IntoSampleArray) -> Self {
        self.samples = Some(samples.into_sample_array());
        self
    }

    /// Use `spectrum` as the spectral data.
    pub fn spectrum(mut self, spectrum: impl IntoSpectrumArray) -> Self {
        self.spectrum = Some(spectrum.into_spectrum_array());
        self
    }

    /// Attach a label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sample rate of in-memory data, or the target rate when loading a file.
    pub const fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Transform settings; unset fields use sample-rate defaults.
    pub const fn settings(mut self, settings: TransformSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Decoder used for [`path`](Self::path).
    pub fn reader(mut self, reader: &'a dyn AudioReader) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Validates the configuration and builds the buffer.
    ///
    /// # Errors
    /// - [`AudioSignalError::Configuration`] for more than one data source or
    ///   invalid transform settings.
    /// - Any error from loading or validating the chosen source.
    pub fn build(self) -> AudioSignalResult<AudioBuffer> {
        let sources = [
            self.path.is_some(),
            self.samples.is_some(),
            self.spectrum.is_some(),
        ]
        .iter()
        .filter(|&&given| given)
        .count();
        if sources > 1 {
            return Err(AudioSignalError::configuration(
                "an audio buffer can only be initialized from one of {path, samples, spectrum}",
            ));
        }

        let mut buffer =
            AudioBuffer::with_sample_rate(self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE));
        buffer.label = self.label;

        if let Some(path) = self.path {
            #[cfg(feature = "wav")]
            let reader: &dyn AudioReader = self.reader.unwrap_or(&crate::io::WavCodec);
            #[cfg(not(feature = "wav"))]
            let reader = self.reader.ok_or_else(|| {
                AudioSignalError::configuration("no audio reader available to load a file")
            })?;
            buffer.load_audio_from_file_with(
                reader,
                path,
                self.offset,
                self.duration,
                self.sample_rate,
            )?;
        } else if let Some(samples) = self.samples {
            buffer.load_audio_from_array(samples, buffer.sample_rate)?;
        } else if let Some(spectrum) = self.spectrum {
            buffer.set_stft_data(spectrum)?;
        }

        buffer.params = TransformParameters::resolve(&self.settings, buffer.sample_rate)?;
        Ok(buffer)
    }
}
