//! Loading and writing audio files.
//!
//! Decoding and encoding go through the [`AudioReader`] and [`AudioWriter`]
//! traits so any container can be plugged in. With the `wav` feature,
//! [`WavCodec`] implements both on top of `hound` and is used when no codec is
//! given explicitly.

use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::buffer::{IntoSampleArray, SampleBuffer};
use crate::{AudioBuffer, AudioSignalError, AudioSignalResult};

/// Header information of an audio file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    /// Native sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub num_channels: usize,
    /// Samples per channel.
    pub num_frames: usize,
}

impl AudioInfo {
    /// Length of the file in seconds.
    pub fn duration(&self) -> f64 {
        self.num_frames as f64 / f64::from(self.sample_rate)
    }
}

/// Decodes audio files into `(channels, samples)` float arrays.
pub trait AudioReader {
    /// Reads the header of `path`.
    ///
    /// # Errors
    /// I/O or codec failures.
    fn probe(&self, path: &Path) -> AudioSignalResult<AudioInfo>;

    /// Decodes `num_frames` frames (or everything left) starting at `start_frame`.
    ///
    /// # Errors
    /// I/O or codec failures.
    fn read(
        &self,
        path: &Path,
        start_frame: usize,
        num_frames: Option<usize>,
    ) -> AudioSignalResult<Array2<f64>>;
}

/// Encodes `(channels, samples)` float arrays into audio files.
pub trait AudioWriter {
    /// Writes `samples` at `sample_rate` to `path`.
    ///
    /// # Errors
    /// I/O or codec failures.
    fn write(&self, path: &Path, samples: ArrayView2<'_, f64>, sample_rate: u32)
    -> AudioSignalResult<()>;
}

fn seconds_to_frames(seconds: f64, sample_rate: u32) -> usize {
    (seconds * f64::from(sample_rate)).round() as usize
}

impl AudioBuffer {
    /// Builds a buffer from a WAV file.
    ///
    /// # Errors
    /// See [`AudioBuffer::load_audio_from_file_with`].
    #[cfg(feature = "wav")]
    pub fn from_file(path: impl AsRef<Path>) -> AudioSignalResult<Self> {
        Self::builder().path(path.as_ref()).build()
    }

    /// Loads (part of) a WAV file, replacing the sample data.
    ///
    /// # Errors
    /// See [`AudioBuffer::load_audio_from_file_with`].
    #[cfg(feature = "wav")]
    pub fn load_audio_from_file(
        &mut self,
        path: impl AsRef<Path>,
        offset: f64,
        duration: Option<f64>,
        new_sample_rate: Option<u32>,
    ) -> AudioSignalResult<()> {
        self.load_audio_from_file_with(&WavCodec, path, offset, duration, new_sample_rate)
    }

    /// Loads (part of) an audio file through `reader`, replacing the sample data.
    ///
    /// `offset` and `duration` are in seconds. Only the requested span is kept
    /// in memory. When `new_sample_rate` differs from the file's rate the data
    /// is resampled. On success the path, sample rate and original signal
    /// length are updated and the active region is reset.
    ///
    /// # Errors
    /// - [`AudioSignalError::Domain`] for a negative or non-finite offset or duration.
    /// - [`AudioSignalError::State`] if `offset` lies beyond the end of the file.
    /// - I/O, codec and resampling failures.
    pub fn load_audio_from_file_with(
        &mut self,
        reader: &dyn AudioReader,
        path: impl AsRef<Path>,
        offset: f64,
        duration: Option<f64>,
        new_sample_rate: Option<u32>,
    ) -> AudioSignalResult<()> {
        let path = path.as_ref();
        if !offset.is_finite() || offset < 0.0 {
            return Err(AudioSignalError::domain(format!(
                "offset must be >= 0, got {offset}"
            )));
        }
        if let Some(duration) = duration.filter(|d| !d.is_finite() || *d < 0.0) {
            return Err(AudioSignalError::domain(format!(
                "duration must be >= 0, got {duration}"
            )));
        }

        let info = reader.probe(path)?;
        let file_length = info.duration();
        if offset > file_length {
            return Err(AudioSignalError::state(format!(
                "offset ({offset} s) is longer than the signal ({file_length} s)"
            )));
        }
        if duration.is_some_and(|d| offset + d >= file_length) {
            tracing::warn!(
                path = %path.display(),
                offset,
                ?duration,
                file_length,
                "offset + duration are longer than the signal, reading until the end"
            );
        }

        let start = seconds_to_frames(offset, info.sample_rate).min(info.num_frames);
        let count = duration
            .map(|d| seconds_to_frames(d, info.sample_rate).min(info.num_frames - start));
        let mut samples = SampleBuffer::from_array(reader.read(path, start, count)?)?;
        let mut sample_rate = info.sample_rate;

        if let Some(target) = new_sample_rate.filter(|&rate| rate != sample_rate) {
            tracing::warn!(
                file_rate = sample_rate,
                requested_rate = target,
                "requested sample rate differs from the file's, resampling"
            );
            samples = SampleBuffer::from_array(resample_on_load(samples.view(), sample_rate, target)?)?;
            sample_rate = target;
        }

        self.original_signal_length = Some(samples.total_length());
        self.samples = Some(samples);
        self.sample_rate = sample_rate;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Replaces the sample data with `samples` at `sample_rate`.
    ///
    /// Integer input is rescaled to floats. Clears the path, records the
    /// original signal length and resets the active region.
    ///
    /// # Errors
    /// See [`SampleBuffer::new`]. The buffer is unchanged on error.
    pub fn load_audio_from_array(
        &mut self,
        samples: impl IntoSampleArray,
        sample_rate: u32,
    ) -> AudioSignalResult<()> {
        let samples = SampleBuffer::new(samples)?;
        self.original_signal_length = Some(samples.total_length());
        self.samples = Some(samples);
        self.sample_rate = sample_rate;
        self.path = None;
        Ok(())
    }

    /// Writes the active sample data as 16-bit PCM WAV.
    ///
    /// # Errors
    /// See [`AudioBuffer::write_audio_to_file_with`].
    #[cfg(feature = "wav")]
    pub fn write_audio_to_file(
        &self,
        path: impl AsRef<Path>,
        sample_rate: Option<u32>,
    ) -> AudioSignalResult<()> {
        self.write_audio_to_file_with(&WavCodec, path, sample_rate)
    }

    /// Writes the active sample data through `writer`.
    ///
    /// `sample_rate` defaults to the buffer's own rate.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without sample data.
    /// - I/O and codec failures.
    pub fn write_audio_to_file_with(
        &self,
        writer: &dyn AudioWriter,
        path: impl AsRef<Path>,
        sample_rate: Option<u32>,
    ) -> AudioSignalResult<()> {
        let samples = self.require_samples("write an audio file")?;
        writer.write(
            path.as_ref(),
            samples.view(),
            sample_rate.unwrap_or(self.sample_rate),
        )
    }
}

#[cfg(feature = "resampling")]
fn resample_on_load(
    samples: ArrayView2<'_, f64>,
    source_rate: u32,
    target_rate: u32,
) -> AudioSignalResult<Array2<f64>> {
    crate::resampling::resample_channels(
        &crate::resampling::RubatoResampler::default(),
        samples,
        source_rate,
        target_rate,
    )
}

#[cfg(not(feature = "resampling"))]
fn resample_on_load(
    _samples: ArrayView2<'_, f64>,
    source_rate: u32,
    target_rate: u32,
) -> AudioSignalResult<Array2<f64>> {
    Err(AudioSignalError::configuration(format!(
        "resampling from {source_rate} Hz to {target_rate} Hz requires the `resampling` feature"
    )))
}

#[cfg(feature = "wav")]
pub use wav::WavCodec;

#[cfg(feature = "wav")]
mod wav {
    use std::path::Path;

    use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
    use ndarray::{Array2, ArrayView2};

    use super::{AudioInfo, AudioReader, AudioWriter};
    use crate::{AudioSignalError, AudioSignalResult, DEFAULT_BIT_DEPTH};

    /// WAV codec backed by `hound`.
    ///
    /// Reads integer PCM of any bit depth and 32-bit float; writes 16-bit PCM.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct WavCodec;

    fn codec_error(path: &Path, error: hound::Error) -> AudioSignalError {
        match error {
            hound::Error::IoError(source) => AudioSignalError::Io { source },
            other => AudioSignalError::codec(path.display().to_string(), other.to_string()),
        }
    }

    impl AudioReader for WavCodec {
        fn probe(&self, path: &Path) -> AudioSignalResult<AudioInfo> {
            let reader = WavReader::open(path).map_err(|e| codec_error(path, e))?;
            let spec = reader.spec();
            Ok(AudioInfo {
                sample_rate: spec.sample_rate,
                num_channels: usize::from(spec.channels),
                num_frames: reader.duration() as usize,
            })
        }

        fn read(
            &self,
            path: &Path,
            start_frame: usize,
            num_frames: Option<usize>,
        ) -> AudioSignalResult<Array2<f64>> {
            let mut reader = WavReader::open(path).map_err(|e| codec_error(path, e))?;
            let spec = reader.spec();
            let channels = usize::from(spec.channels);
            let total = reader.duration() as usize;
            let start = start_frame.min(total);
            let frames = num_frames.map_or(total - start, |n| n.min(total - start));

            let seek_to = u32::try_from(start).map_err(|_| {
                AudioSignalError::codec(path.display().to_string(), "start frame out of range")
            })?;
            reader.seek(seek_to)?;

            let wanted = frames * channels;
            let interleaved: Vec<f64> = match spec.sample_format {
                SampleFormat::Float => reader
                    .samples::<f32>()
                    .take(wanted)
                    .map(|s| s.map(f64::from))
                    .collect::<Result<_, _>>()
                    .map_err(|e| codec_error(path, e))?,
                SampleFormat::Int => {
                    let scale = f64::from(1u32 << (spec.bits_per_sample - 1));
                    reader
                        .samples::<i32>()
                        .take(wanted)
                        .map(|s| s.map(|v| f64::from(v) / scale))
                        .collect::<Result<_, _>>()
                        .map_err(|e| codec_error(path, e))?
                }
            };

            let frames_read = interleaved.len() / channels.max(1);
            let interleaved = Array2::from_shape_vec((frames_read, channels), interleaved)
                .map_err(|e| AudioSignalError::codec(path.display().to_string(), e.to_string()))?;
            Ok(interleaved.reversed_axes().as_standard_layout().into_owned())
        }
    }

    impl AudioWriter for WavCodec {
        fn write(
            &self,
            path: &Path,
            samples: ArrayView2<'_, f64>,
            sample_rate: u32,
        ) -> AudioSignalResult<()> {
            let channels = u16::try_from(samples.nrows()).map_err(|_| {
                AudioSignalError::codec(
                    path.display().to_string(),
                    format!("too many channels ({})", samples.nrows()),
                )
            })?;
            let spec = WavSpec {
                channels,
                sample_rate,
                bits_per_sample: DEFAULT_BIT_DEPTH,
                sample_format: SampleFormat::Int,
            };
            let mut writer = WavWriter::create(path, spec).map_err(|e| codec_error(path, e))?;

            let scale = f64::from(1u32 << (DEFAULT_BIT_DEPTH - 1));
            let (min, max) = (f64::from(i16::MIN), f64::from(i16::MAX));
            // hound expects interleaved frames
            for frame in samples.columns() {
                for &sample in frame {
                    let quantized = num_traits::clamp(sample * scale, min, max) as i16;
                    writer
                        .write_sample(quantized)
                        .map_err(|e| codec_error(path, e))?;
                }
            }
            writer.finalize().map_err(|e| codec_error(path, e))
        }
    }
}
