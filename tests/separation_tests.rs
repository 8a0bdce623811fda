mod common;

use audio_signal::{AudioBuffer, BinaryMask, SoftMask, TransformSettings, WindowType};
use ndarray::{Array2, Array3, Axis};

const SAMPLE_RATE: u32 = 16000;

fn settings() -> TransformSettings {
    TransformSettings::new(Some(512), Some(128), Some(WindowType::Hann))
}

fn buffer(samples: ndarray::Array1<f64>) -> AudioBuffer {
    AudioBuffer::builder()
        .samples(samples)
        .sample_rate(SAMPLE_RATE)
        .settings(settings())
        .build()
        .unwrap()
}

#[test]
fn test_binary_mask_separates_sources() {
    let source1 = common::sine(440.0, SAMPLE_RATE, 16000, 0.5);
    let source2 = common::sine(3000.0, SAMPLE_RATE, 16000, 0.5);

    let mut first = buffer(source1.clone());
    let mut second = buffer(source2.clone());
    let spectrum1 = first.transform_forward(TransformSettings::default(), true).unwrap();
    let spectrum2 = second.transform_forward(TransformSettings::default(), true).unwrap();
    assert_eq!(spectrum1.dim(), (257, 126, 1));

    let mut mixture = (&first + &second).unwrap();
    let mixed = &spectrum1 + &spectrum2;
    mixture.set_stft_data(mixed).unwrap();

    let magnitude = spectrum1.mapv(|c| c.norm());
    let peak = magnitude.fold(0.0_f64, |a, &b| a.max(b));
    let mask = BinaryMask::from_threshold(magnitude.view(), 1e-4 * peak);

    let mut isolated = mixture.apply_mask(&mask, false).unwrap().unwrap();
    assert!(!isolated.has_audio_data());
    let estimate = isolated
        .transform_inverse(TransformSettings::default(), true, None)
        .unwrap();
    assert_eq!(estimate.dim(), (1, 16000));
    assert_eq!(isolated.signal_length(), Some(16000));

    let estimate = estimate.row(0);
    let with_first = common::correlation(estimate, source1.view());
    let with_second = common::correlation(estimate, source2.view());
    assert!(
        with_first > with_second,
        "correlation with source 1 ({with_first}) should exceed source 2 ({with_second})"
    );
    assert!(with_first > 0.9, "{with_first}");
}

#[test]
fn test_broadcast_mask_on_stereo() {
    let left = common::sine(440.0, SAMPLE_RATE, 4000, 0.5);
    let right = common::noise(4000, 5);
    let samples = ndarray::stack(Axis(0), &[left.view(), right.view()]).unwrap();
    let mut stereo = AudioBuffer::builder()
        .samples(samples)
        .sample_rate(SAMPLE_RATE)
        .settings(settings())
        .build()
        .unwrap();
    let spectrum = stereo.transform_forward(TransformSettings::default(), true).unwrap();
    let (bins, frames, channels) = spectrum.dim();
    assert_eq!(channels, 2);

    let keep_all = Array2::<f64>::ones((bins, frames));
    let copy = stereo.apply_mask(&keep_all, false).unwrap().unwrap();
    assert_eq!(copy.stft_data().unwrap(), spectrum.view());

    let per_channel = Array3::<f64>::zeros((bins, frames, channels));
    let silenced = stereo.apply_mask(&per_channel, false).unwrap().unwrap();
    assert!(silenced.stft_data().unwrap().iter().all(|c| c.norm() == 0.0));

    let extra_channel = Array3::<f64>::ones((bins, frames, channels + 1));
    assert!(stereo.apply_mask(&extra_channel, false).unwrap_err().is_shape());

    let soft = SoftMask::new(Array2::from_elem((bins, frames), 0.5)).unwrap();
    stereo.apply_mask(&soft, true).unwrap();
    let halved = stereo
        .transform_inverse(TransformSettings::default(), false, None)
        .unwrap();
    let error = common::max_abs_error(halved.row(0), (&left * 0.5).view());
    assert!(error < 1e-6, "{error}");
}

#[test]
fn test_interchannel_features() {
    let left = common::sine(1000.0, SAMPLE_RATE, 4000, 0.5);
    let samples = ndarray::stack(Axis(0), &[left.view(), (&left * 0.5).view()]).unwrap();
    let mut stereo = AudioBuffer::builder()
        .samples(samples)
        .sample_rate(SAMPLE_RATE)
        .settings(settings())
        .build()
        .unwrap();
    stereo.transform_forward(TransformSettings::default(), true).unwrap();

    let (ipd, ild) = stereo
        .interphase_interlevel_features(audio_signal::LEFT, audio_signal::RIGHT)
        .unwrap();
    assert_eq!(ipd.dim(), (257, 33));
    assert_eq!(ild.dim(), ipd.dim());
    // the 1 kHz bin: left is twice as loud as right
    let level = ild[[32, 16]];
    assert!((level - 20.0 * 2.0_f64.log10()).abs() < 0.05, "{level}");
    // identical phases
    assert!(ipd[[32, 16]].abs() < 1e-12);
    assert!(ipd.iter().all(|&p| (0.0..std::f64::consts::PI).contains(&p)));
}
