//! Storage for the two representations of a signal.
//!
//! - [`SampleBuffer`] - real `(channels, samples)` data with an active region
//! - [`SpectralBuffer`] - complex `(frequency_bins, time_frames, channels)` data
//!
//! The two are independent values. Nothing here keeps them in sync; see
//! [`AudioBuffer::transform_forward`](crate::AudioBuffer::transform_forward) and
//! [`AudioBuffer::transform_inverse`](crate::AudioBuffer::transform_inverse).

pub mod samples;
pub mod spectrum;

pub use samples::{IntoSampleArray, SampleBuffer};
pub use spectrum::{IntoSpectrumArray, SpectralBuffer};
