//! Per-channel access to both representations and stereo spatial features.

use std::f64::consts::PI;
use std::iter::FusedIterator;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use num_complex::Complex64;

use crate::buffer::{SampleBuffer, SpectralBuffer};
use crate::{AudioBuffer, AudioSignalError, AudioSignalResult};

/// Offset added to the second channel magnitude in the level difference.
const ILD_MAGNITUDE_FLOOR: f64 = 1e-4;
/// Offset added to the magnitude ratio before taking the logarithm.
const ILD_RATIO_FLOOR: f64 = 1e-8;

impl AudioBuffer {
    fn verify_channel(&self, channel: usize) -> AudioSignalResult<()> {
        let available = self.num_channels().unwrap_or(0);
        if channel >= available {
            return Err(AudioSignalError::domain(format!(
                "cannot get channel {channel} when this buffer only has {available} channels (0-based)"
            )));
        }
        Ok(())
    }

    /// One channel of the active sample data.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without sample data.
    /// - [`AudioSignalError::Domain`] if `channel` is out of range.
    pub fn get_channel(&self, channel: usize) -> AudioSignalResult<ArrayView1<'_, f64>> {
        let samples = self.require_samples("get a channel")?;
        self.verify_channel(channel)?;
        Ok(samples.channel(channel))
    }

    /// One channel of the spectral data as `(frequency_bins, time_frames)`.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without spectral data.
    /// - [`AudioSignalError::Domain`] if `channel` is out of range.
    pub fn get_stft_channel(&self, channel: usize) -> AudioSignalResult<ArrayView2<'_, Complex64>> {
        let spectrum = self.require_spectrum("get a spectral channel")?;
        if channel >= spectrum.num_channels() {
            return Err(AudioSignalError::domain(format!(
                "cannot get spectral channel {channel} when the spectrum only has {} channels (0-based)",
                spectrum.num_channels()
            )));
        }
        Ok(spectrum.channel(channel))
    }

    /// Iterates over the channels of the active sample data in index order.
    ///
    /// Each call starts a new pass; nothing is cached between calls. Yields
    /// nothing when there is no sample data.
    pub fn get_channels(&self) -> ChannelIter<'_> {
        ChannelIter {
            samples: self.samples.as_ref(),
            next: 0,
        }
    }

    /// Iterates over the channels of the spectral data in index order.
    pub fn get_stft_channels(&self) -> StftChannelIter<'_> {
        StftChannelIter {
            spectrum: self.spectrum.as_ref(),
            next: 0,
        }
    }

    /// A new single-channel buffer holding channel `channel`.
    ///
    /// The matching spectral channel is carried over when spectral data exists.
    ///
    /// # Errors
    /// See [`AudioBuffer::get_channel`].
    pub fn make_audio_signal_from_channel(&self, channel: usize) -> AudioSignalResult<AudioBuffer> {
        let samples = self.get_channel(channel)?.to_owned().insert_axis(Axis(0));
        let mut single = self.copy_with_samples(SampleBuffer::from_array(samples)?);
        if let Some(spectrum) = self.spectrum.as_ref().filter(|s| channel < s.num_channels()) {
            let channel_spectrum = spectrum.channel(channel).to_owned().insert_axis(Axis(2));
            single.spectrum = Some(SpectralBuffer::from_array(channel_spectrum));
        }
        Ok(single)
    }

    /// `|S|²` of one spectral channel.
    ///
    /// # Errors
    /// See [`AudioBuffer::get_stft_channel`].
    pub fn get_power_spectrogram_channel(&self, channel: usize) -> AudioSignalResult<Array2<f64>> {
        Ok(self.get_stft_channel(channel)?.mapv(|c| c.norm_sqr()))
    }

    /// `|S|` of one spectral channel.
    ///
    /// # Errors
    /// See [`AudioBuffer::get_stft_channel`].
    pub fn get_magnitude_spectrogram_channel(&self, channel: usize) -> AudioSignalResult<Array2<f64>> {
        Ok(self.get_stft_channel(channel)?.mapv(|c| c.norm()))
    }

    /// Averages the active sample data across channels.
    ///
    /// With `overwrite` the buffer's sample data becomes the single mono
    /// channel.
    ///
    /// # Errors
    /// [`AudioSignalError::State`] without sample data.
    pub fn to_mono(&mut self, overwrite: bool) -> AudioSignalResult<Array1<f64>> {
        let samples = self.require_samples("convert to mono")?;
        let mono = samples
            .view()
            .mean_axis(Axis(0))
            .ok_or_else(|| AudioSignalError::state("cannot convert a buffer without channels to mono"))?;
        if overwrite {
            self.samples = Some(SampleBuffer::from_array(
                mono.clone().insert_axis(Axis(0)),
            )?);
        }
        Ok(mono)
    }

    /// Interphase and interlevel differences between two spectral channels.
    ///
    /// Returns `(ipd, ild)`, both `(frequency_bins, time_frames)`:
    ///
    /// - `ild = 20·log10(|S1| / (|S2| + 1e-4) + 1e-8)`
    /// - `ipd = angle(S2·conj(S1)) / (f + 1)` wrapped into `[0, π)`, where `f`
    ///   is the bin frequency in Hz.
    ///
    /// Use [`LEFT`](crate::LEFT) and [`RIGHT`](crate::RIGHT) for the usual
    /// stereo pair.
    ///
    /// # Errors
    /// - [`AudioSignalError::State`] without spectral data or on mono input.
    /// - [`AudioSignalError::Domain`] if either channel is out of range.
    pub fn interphase_interlevel_features(
        &self,
        channel_one: usize,
        channel_two: usize,
    ) -> AudioSignalResult<(Array2<f64>, Array2<f64>)> {
        let spectrum = self.require_spectrum("compute ipd/ild features")?;
        if spectrum.num_channels() == 1 {
            return Err(AudioSignalError::state(
                "cannot compute ipd/ild features on mono input",
            ));
        }
        let one = self.get_stft_channel(channel_one)?;
        let two = self.get_stft_channel(channel_two)?;

        let ild = Zip::from(&one).and(&two).map_collect(|a, b| {
            20.0 * (a.norm() / (b.norm() + ILD_MAGNITUDE_FLOOR) + ILD_RATIO_FLOOR).log10()
        });

        let frequencies = self.freq_vector()?;
        let mut ipd = Zip::from(&one)
            .and(&two)
            .map_collect(|a, b| (b * a.conj()).arg());
        for (mut row, frequency) in ipd.axis_iter_mut(Axis(0)).zip(frequencies.iter()) {
            row.mapv_inplace(|phase| {
                // rem_euclid rounds tiny negative quotients up to PI itself
                let wrapped = (phase / (frequency + 1.0)).rem_euclid(PI);
                if wrapped >= PI { 0.0 } else { wrapped }
            });
        }

        Ok((ipd, ild))
    }
}

/// Lazy pass over the sample channels of an [`AudioBuffer`].
#[derive(Debug, Clone)]
pub struct ChannelIter<'a> {
    samples: Option<&'a SampleBuffer>,
    next: usize,
}

impl<'a> Iterator for ChannelIter<'a> {
    type Item = ArrayView1<'a, f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let samples = self.samples?;
        if self.next >= samples.num_channels() {
            return None;
        }
        let channel = samples.channel(self.next);
        self.next += 1;
        Some(channel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .samples
            .map_or(0, |s| s.num_channels().saturating_sub(self.next));
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChannelIter<'_> {}
impl FusedIterator for ChannelIter<'_> {}

/// Lazy pass over the spectral channels of an [`AudioBuffer`].
#[derive(Debug, Clone)]
pub struct StftChannelIter<'a> {
    spectrum: Option<&'a SpectralBuffer>,
    next: usize,
}

impl<'a> Iterator for StftChannelIter<'a> {
    type Item = ArrayView2<'a, Complex64>;

    fn next(&mut self) -> Option<Self::Item> {
        let spectrum = self.spectrum?;
        if self.next >= spectrum.num_channels() {
            return None;
        }
        let channel = spectrum.channel(self.next);
        self.next += 1;
        Some(channel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .spectrum
            .map_or(0, |s| s.num_channels().saturating_sub(self.next));
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StftChannelIter<'_> {}
impl FusedIterator for StftChannelIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LEFT, RIGHT};
    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, array};

    fn stereo() -> AudioBuffer {
        AudioBuffer::from_samples(array![[1.0, 2.0, 3.0, 4.0], [3.0, 2.0, 1.0, 0.0]], 8000).unwrap()
    }

    #[test]
    fn test_get_channel_bounds() {
        let buffer = stereo();
        assert_eq!(buffer.get_channel(1).unwrap(), array![3.0, 2.0, 1.0, 0.0]);
        assert!(buffer.get_channel(2).unwrap_err().is_domain());
        assert!(buffer.get_stft_channel(0).unwrap_err().is_state());
        assert!(AudioBuffer::empty().get_channel(0).unwrap_err().is_state());
    }

    #[test]
    fn test_channel_iteration_is_restartable() {
        let mut buffer = stereo();
        let first: Vec<_> = buffer.get_channels().map(|c| c.to_owned()).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(buffer.get_channels().len(), 2);

        buffer.set_active_region(1, 3).unwrap();
        let second: Vec<_> = buffer.get_channels().map(|c| c.to_owned()).collect();
        assert_eq!(second[0], array![2.0, 3.0]);
        assert_eq!(second[1], array![2.0, 1.0]);

        assert_eq!(AudioBuffer::empty().get_channels().count(), 0);
        assert_eq!(buffer.get_stft_channels().count(), 0);
    }

    #[test]
    fn test_stft_channels_follow_index_order() {
        let spectrum = Array3::from_shape_fn((3, 2, 3), |(_, _, c)| Complex64::new(c as f64, 0.0));
        let buffer = AudioBuffer::from_spectrum(spectrum, 8000).unwrap();
        for (index, channel) in buffer.get_stft_channels().enumerate() {
            assert!(channel.iter().all(|c| c.re == index as f64));
        }
        assert_eq!(buffer.get_power_spectrogram_channel(2).unwrap()[[0, 0]], 4.0);
        assert_eq!(buffer.get_magnitude_spectrogram_channel(2).unwrap()[[1, 1]], 2.0);
        assert!(buffer.get_power_spectrogram_channel(3).unwrap_err().is_domain());
    }

    #[test]
    fn test_single_channel_signal() {
        let mut buffer = stereo();
        buffer
            .transform_forward(crate::TransformSettings::new(Some(4), Some(2), None), true)
            .unwrap();
        let right = buffer.make_audio_signal_from_channel(RIGHT).unwrap();
        assert!(right.is_mono());
        assert_eq!(right.get_channel(0).unwrap(), array![3.0, 2.0, 1.0, 0.0]);
        assert_eq!(
            right.get_stft_channel(0).unwrap(),
            buffer.get_stft_channel(RIGHT).unwrap()
        );
    }

    #[test]
    fn test_to_mono() {
        let mut buffer = stereo();
        let mono = buffer.to_mono(false).unwrap();
        assert_eq!(mono, array![2.0, 2.0, 2.0, 2.0]);
        assert!(buffer.is_stereo());
        buffer.to_mono(true).unwrap();
        assert!(buffer.is_mono());
        assert_eq!(buffer.signal_length(), Some(4));
    }

    #[test]
    fn test_ipd_ild() {
        let one = Complex64::from_polar(2.0, 0.25);
        let two = Complex64::from_polar(1.0, 1.25);
        let mut spectrum = Array3::zeros((3, 2, 2));
        spectrum.index_axis_mut(Axis(2), 0).fill(one);
        spectrum.index_axis_mut(Axis(2), 1).fill(two);
        let buffer = AudioBuffer::from_spectrum(spectrum, 8).unwrap();

        let (ipd, ild) = buffer.interphase_interlevel_features(LEFT, RIGHT).unwrap();
        assert_eq!(ipd.dim(), (3, 2));
        let expected_ild = 20.0 * (2.0 / (1.0 + 1e-4) + 1e-8f64).log10();
        assert_abs_diff_eq!(ild[[1, 1]], expected_ild, epsilon = 1e-12);
        // bins at 0, 2 and 4 Hz; phase difference of 1 radian
        assert_abs_diff_eq!(ipd[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ipd[[1, 0]], 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ipd[[2, 1]], 0.2, epsilon = 1e-12);
        assert!(ipd.iter().all(|&p| (0.0..PI).contains(&p)));
    }

    #[test]
    fn test_ipd_stays_below_pi_for_tiny_negative_phase() {
        let mut spectrum = Array3::zeros((2, 1, 2));
        spectrum.index_axis_mut(Axis(2), 0).fill(Complex64::from_polar(1.0, 0.0));
        spectrum.index_axis_mut(Axis(2), 1).fill(Complex64::from_polar(1.0, -1e-17));
        let buffer = AudioBuffer::from_spectrum(spectrum, 8).unwrap();

        let (ipd, _) = buffer.interphase_interlevel_features(LEFT, RIGHT).unwrap();
        assert!(ipd.iter().all(|&p| (0.0..PI).contains(&p)), "{ipd:?}");
        assert_abs_diff_eq!(ipd[[0, 0]], 0.0);
    }

    #[test]
    fn test_ipd_ild_requires_stereo_spectrum() {
        let mono = AudioBuffer::from_spectrum(Array3::<Complex64>::zeros((3, 2, 1)), 8000).unwrap();
        assert!(mono.interphase_interlevel_features(0, 1).unwrap_err().is_state());
        assert!(stereo().interphase_interlevel_features(0, 1).unwrap_err().is_state());
        let wide = AudioBuffer::from_spectrum(Array3::<Complex64>::zeros((3, 2, 2)), 8000).unwrap();
        assert!(wide.interphase_interlevel_features(0, 2).unwrap_err().is_domain());
    }
}
