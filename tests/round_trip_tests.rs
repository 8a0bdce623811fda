mod common;

use audio_signal::{AudioBuffer, TransformParameters, TransformSettings, WindowType};
use ndarray::{Array2, Axis, stack};

const TRIPLES: [(usize, usize, WindowType); 6] = [
    (512, 128, WindowType::Hann),
    (256, 128, WindowType::Hann),
    (512, 256, WindowType::SqrtHann),
    (300, 100, WindowType::Hamming),
    (512, 128, WindowType::Blackman),
    (256, 256, WindowType::Rectangular),
];

#[test]
fn test_round_trip_reconstruction() {
    let sample_rate = 16000;
    let left = common::sine(440.0, sample_rate, 4001, 0.5) + common::noise(4001, 7);
    let right = common::noise(4001, 11);
    let samples = stack(Axis(0), &[left.view(), right.view()]).unwrap();

    for (window_length, hop_length, window_type) in TRIPLES {
        assert!(
            TransformParameters::new(window_length, hop_length, window_type).is_ok(),
            "{window_type} {window_length}/{hop_length} should pass COLA"
        );
        let settings = TransformSettings::new(Some(window_length), Some(hop_length), Some(window_type));
        let mut buffer = AudioBuffer::builder()
            .samples(samples.clone())
            .sample_rate(sample_rate)
            .settings(settings)
            .build()
            .unwrap();

        let spectrum = buffer.transform_forward(TransformSettings::default(), true).unwrap();
        assert_eq!(spectrum.dim().0, window_length / 2 + 1);
        assert_eq!(spectrum.dim().2, 2);

        let restored = buffer
            .transform_inverse(TransformSettings::default(), false, None)
            .unwrap();
        assert_eq!(restored.dim(), (2, 4001));
        for channel in 0..2 {
            let error = common::max_abs_error(restored.row(channel), samples.row(channel));
            assert!(
                error < 1e-6,
                "{window_type} {window_length}/{hop_length} channel {channel}: {error}"
            );
        }
    }
}

#[test]
fn test_non_cola_triples_are_rejected() {
    let err = TransformParameters::new(512, 300, WindowType::Hann).unwrap_err();
    assert!(err.is_configuration());
    let err = AudioBuffer::builder()
        .samples(Array2::<f64>::zeros((1, 100)))
        .sample_rate(8000)
        .settings(TransformSettings::new(Some(100), Some(30), Some(WindowType::Blackman)))
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_round_trip_of_active_region() {
    let samples = common::noise(3000, 3);
    let mut buffer = AudioBuffer::builder()
        .samples(samples.clone())
        .sample_rate(8000)
        .build()
        .unwrap();
    buffer.set_active_region(1000, 2500).unwrap();

    let spectrum = buffer.transform_forward(TransformSettings::default(), true).unwrap();
    assert_eq!(spectrum.dim().0, 129);

    let restored = buffer
        .transform_inverse(TransformSettings::default(), false, None)
        .unwrap();
    assert_eq!(restored.ncols(), 1500);
    let error = common::max_abs_error(
        restored.row(0),
        samples.slice(ndarray::s![1000..2500]),
    );
    assert!(error < 1e-6, "{error}");
    // the stored samples were not replaced
    assert_eq!(buffer.full_audio_data().unwrap().ncols(), 3000);
}

#[test]
fn test_inverse_of_spectrum_only_buffer() {
    let samples = common::sine(1000.0, 8000, 2048, 0.25);
    let mut source = AudioBuffer::from_samples(samples.clone(), 8000).unwrap();
    let spectrum = source.transform_forward(TransformSettings::default(), false).unwrap();

    let mut target = AudioBuffer::from_spectrum(spectrum, 8000).unwrap();
    assert!(!target.has_audio_data());
    let restored = target
        .transform_inverse(TransformSettings::default(), false, Some(2048))
        .unwrap();
    assert!(target.has_audio_data());
    assert_eq!(target.signal_length(), Some(2048));
    assert!(common::max_abs_error(restored.row(0), samples.view()) < 1e-6);
}
