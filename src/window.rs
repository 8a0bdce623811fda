//! Window functions for spectral analysis and synthesis.
//!
//! All windows are generated in their periodic (DFT-even) form, which is the
//! form for which the usual constant-overlap-add hop sizes hold exactly
//! (e.g. Hann at 50% or 75% overlap).

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{AudioSignalError, AudioSignalResult};

/// Window functions supported by the spectral transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Rectangular (boxcar) window.
    Rectangular,
    /// Hann window. Default.
    #[default]
    Hann,
    /// Square root of the Hann window.
    ///
    /// Applied at both analysis and synthesis, the product is a Hann window, which
    /// makes magnitude masking reconstruct perfectly.
    SqrtHann,
    /// Hamming window.
    Hamming,
    /// Blackman window.
    Blackman,
}

impl WindowType {
    /// All supported window types.
    pub const ALL: [WindowType; 5] = [
        WindowType::Rectangular,
        WindowType::Hann,
        WindowType::SqrtHann,
        WindowType::Hamming,
        WindowType::Blackman,
    ];

    /// Canonical lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            WindowType::Rectangular => "rectangular",
            WindowType::Hann => "hann",
            WindowType::SqrtHann => "sqrt_hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
        }
    }

    /// The window family the COLA check is run against.
    ///
    /// `SqrtHann` is checked as `Hann`. This is an approximation: the literal
    /// square-root window is not itself COLA at the usual hops.
    pub const fn cola_base(&self) -> WindowType {
        match self {
            WindowType::SqrtHann => WindowType::Hann,
            other => *other,
        }
    }

    /// Generates `length` periodic window coefficients.
    pub fn generate(&self, length: usize) -> Array1<f64> {
        let n = length as f64;
        match self {
            WindowType::Rectangular => Array1::ones(length),
            WindowType::Hann => {
                Array1::from_shape_fn(length, |i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos())
            }
            WindowType::SqrtHann => WindowType::Hann.generate(length).mapv(f64::sqrt),
            WindowType::Hamming => {
                Array1::from_shape_fn(length, |i| 0.54 - 0.46 * (2.0 * PI * i as f64 / n).cos())
            }
            WindowType::Blackman => Array1::from_shape_fn(length, |i| {
                let x = i as f64 / n;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            }),
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = AudioSignalError;

    fn from_str(s: &str) -> AudioSignalResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rectangular" | "boxcar" | "rect" => Ok(WindowType::Rectangular),
            "hann" | "hanning" => Ok(WindowType::Hann),
            "sqrt_hann" => Ok(WindowType::SqrtHann),
            "hamming" => Ok(WindowType::Hamming),
            "blackman" => Ok(WindowType::Blackman),
            other => Err(AudioSignalError::configuration(format!(
                "unknown window type '{other}'"
            ))),
        }
    }
}
