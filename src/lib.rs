// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # audio_signal
//!
//! Multichannel audio buffers with a time-domain and a spectral
//! representation, a perfect-reconstruction short-time Fourier transform,
//! and the plumbing needed for mask-based source separation.
//!
//! ## Overview
//!
//! An [`AudioBuffer`] holds up to two independent representations of one
//! signal:
//!
//! - samples, shaped `(channels, samples)`, with an *active region* that
//!   restricts what readers see without discarding the rest;
//! - a complex spectrum, shaped `(frequency_bins, time_frames, channels)`.
//!
//! [`AudioBuffer::transform_forward`] and [`AudioBuffer::transform_inverse`]
//! move data between them using [`TransformParameters`] that are checked for
//! the constant-overlap-add property, so an unmodified spectrum inverts back
//! to the original samples.
//!
//! ## Features
//!
//! - `wav` (default): WAV reading and writing through `hound` ([`WavCodec`]).
//! - `resampling` (default): sample-rate conversion through `rubato`
//!   ([`RubatoResampler`]).
//!
//! Without them, files and resampling are still reachable through the
//! [`AudioReader`], [`AudioWriter`] and [`Resampler`] traits.
//!
//! ## Quick Start
//!
//! ```rust
//! use audio_signal::{AudioBuffer, BinaryMask, TransformSettings};
//! use ndarray::Array2;
//!
//! # fn main() -> audio_signal::AudioSignalResult<()> {
//! let samples = Array2::from_shape_fn((2, 8000), |(c, i)| {
//!     ((i as f64) * 0.01 * (c + 1) as f64).sin()
//! });
//! let mut mix = AudioBuffer::from_samples(samples, 8000)?;
//!
//! let spectrum = mix.transform_forward(TransformSettings::default(), true)?;
//! let mask = BinaryMask::from_threshold(spectrum.mapv(|c| c.norm()).view(), 1e-3);
//!
//! let mut isolated = mix.apply_mask(&mask, false)?.expect("copy requested");
//! isolated.transform_inverse(TransformSettings::default(), true, Some(8000))?;
//! assert_eq!(isolated.signal_length(), Some(8000));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`AudioSignalResult`]. The
//! [`AudioSignalError`] variants separate bad configuration, operations
//! attempted in the wrong state, mismatched shapes and out-of-domain values:
//!
//! ```rust
//! use audio_signal::{AudioBuffer, AudioSignalError, TransformSettings};
//!
//! let mut empty = AudioBuffer::empty();
//! match empty.transform_forward(TransformSettings::default(), true) {
//!     Err(AudioSignalError::State { message }) => eprintln!("not ready: {message}"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! ## Logging
//!
//! Recoverable oddities (clamped reads, same-rate resampling, real data
//! passed as a spectrum) are reported as `tracing` warnings. Install any
//! `tracing` subscriber to see them.

mod arithmetic;
pub mod buffer;
mod channels;
mod error;
pub mod io;
pub mod mask;
pub mod params;
pub mod resampling;
mod signal;
pub mod transform;
pub mod window;

pub use crate::buffer::{IntoSampleArray, IntoSpectrumArray, SampleBuffer, SpectralBuffer};
pub use crate::channels::{ChannelIter, StftChannelIter};
pub use crate::error::{AudioSignalError, AudioSignalResult};
#[cfg(feature = "wav")]
pub use crate::io::WavCodec;
pub use crate::io::{AudioInfo, AudioReader, AudioWriter};
pub use crate::mask::{BinaryMask, Mask, SoftMask};
pub use crate::params::{TransformParameters, TransformSettings, check_cola};
#[cfg(feature = "resampling")]
pub use crate::resampling::RubatoResampler;
pub use crate::resampling::{Resampler, ResamplingQuality};
pub use crate::signal::{AudioBuffer, AudioBufferBuilder};
pub use crate::transform::{RustFftKernel, SpectralKernel};
pub use crate::window::WindowType;

/// Sample rate assumed when none is given.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Target window duration, in seconds, of the default transform parameters.
pub const DEFAULT_WINDOW_SECONDS: f64 = 0.032;
/// Bit depth of written WAV files.
pub const DEFAULT_BIT_DEPTH: u16 = 16;
/// Tolerance of the constant-overlap-add check.
pub const COLA_TOLERANCE: f64 = 1e-10;
/// Left channel index.
pub const LEFT: usize = 0;
/// Right channel index.
pub const RIGHT: usize = 1;
