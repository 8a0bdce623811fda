#![cfg(feature = "wav")]

mod common;

use approx::assert_abs_diff_eq;
use audio_signal::{AudioBuffer, TransformSettings};
use ndarray::{Axis, stack};

const QUANTIZATION: f64 = 1.0 / 32768.0;

#[test]
fn test_wav_write_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duet.wav");

    let left = common::sine(440.0, 8000, 8000, 0.5);
    let right = common::sine(660.0, 8000, 8000, 0.25);
    let samples = stack(Axis(0), &[left.view(), right.view()]).unwrap();
    let mut buffer = AudioBuffer::from_samples(samples.clone(), 8000).unwrap();
    buffer.set_label("duet");
    buffer.write_audio_to_file(&path, None).unwrap();

    let loaded = AudioBuffer::from_file(&path).unwrap();
    assert_eq!(loaded.sample_rate(), 8000);
    assert!(loaded.is_stereo());
    assert_eq!(loaded.signal_length(), Some(8000));
    assert_eq!(loaded.original_signal_length(), Some(8000));
    assert_eq!(loaded.path(), Some(path.as_path()));
    for (x, y) in loaded.audio_data().unwrap().iter().zip(samples.iter()) {
        assert_abs_diff_eq!(x, y, epsilon = QUANTIZATION);
    }
}

#[test]
fn test_wav_active_region_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("region.wav");

    let mut buffer = AudioBuffer::from_samples(common::noise(4000, 1), 8000).unwrap();
    buffer.set_active_region(1000, 3000).unwrap();
    buffer.write_audio_to_file(&path, None).unwrap();

    let loaded = AudioBuffer::from_file(&path).unwrap();
    assert_eq!(loaded.signal_length(), Some(2000));
}

#[test]
fn test_wav_partial_load_then_transform() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let tone = common::sine(500.0, 16000, 32000, 0.5);
    AudioBuffer::from_samples(tone.clone(), 16000)
        .unwrap()
        .write_audio_to_file(&path, None)
        .unwrap();

    let mut excerpt = AudioBuffer::builder()
        .path(&path)
        .offset(0.5)
        .duration(1.0)
        .build()
        .unwrap();
    assert_eq!(excerpt.signal_length(), Some(16000));
    assert_abs_diff_eq!(
        excerpt.get_channel(0).unwrap()[0],
        tone[8000],
        epsilon = QUANTIZATION
    );

    let spectrum = excerpt.transform_forward(TransformSettings::default(), true).unwrap();
    assert_eq!(spectrum.dim().0, 257);
    let restored = excerpt
        .transform_inverse(TransformSettings::default(), false, None)
        .unwrap();
    let error = common::max_abs_error(restored.row(0), excerpt.get_channel(0).unwrap());
    assert!(error < 1e-6, "{error}");

    let err = AudioBuffer::builder().path(&path).offset(5.0).build().unwrap_err();
    assert!(err.is_state());
}

#[cfg(feature = "resampling")]
#[test]
fn test_load_with_resampling() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("low.wav");
    AudioBuffer::from_samples(common::sine(300.0, 8000, 4000, 0.5), 8000)
        .unwrap()
        .write_audio_to_file(&path, None)
        .unwrap();

    let upsampled = AudioBuffer::builder()
        .path(&path)
        .sample_rate(16000)
        .build()
        .unwrap();
    assert_eq!(upsampled.sample_rate(), 16000);
    assert_eq!(upsampled.signal_length(), Some(8000));
    assert_eq!(upsampled.original_signal_length(), Some(8000));
    assert_eq!(upsampled.transform_parameters().window_length(), 512);

    let mut back = upsampled.clone();
    back.resample(8000).unwrap();
    assert_eq!(back.signal_length(), Some(4000));
}
