//! Error types and result utilities for audio signal operations.

use thiserror::Error;

/// Convenience type alias for results that may contain an [`AudioSignalError`].
pub type AudioSignalResult<T> = Result<T, AudioSignalError>;

/// Error types that can occur while building, transforming or combining audio signals.
///
/// Every fatal condition aborts the operation before any field of the buffer is
/// touched, so a returned error never leaves a half-updated [`AudioBuffer`](crate::AudioBuffer).
#[derive(Error, Debug)]
pub enum AudioSignalError {
    /// Invalid construction or transform configuration.
    ///
    /// Raised when more than one data source is supplied to a builder, when a
    /// window type is unknown, or when a window/hop pair violates the
    /// constant-overlap-add condition.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the rejected configuration.
        message: String,
    },

    /// The operation needs data or a buffer state that is not present.
    ///
    /// Examples: a forward transform without sample data, an inverse transform
    /// without spectral data, a structural edit while the active region is not
    /// the full buffer, or stereo features requested on mono input.
    #[error("State error: {message}")]
    State {
        /// Description of the missing data or invalid state.
        message: String,
    },

    /// An array has the wrong rank or a shape incompatible with the buffer.
    #[error("Shape error: expected {expected}, got {actual}")]
    Shape {
        /// The expected shape or rank.
        expected: String,
        /// The shape or rank actually supplied.
        actual: String,
    },

    /// A value lies outside its valid domain.
    ///
    /// Covers non-finite samples, non-finite or zero scalars, negative offsets and
    /// channel indices outside `[0, num_channels)`.
    #[error("Domain error: {message}")]
    Domain {
        /// Description of the offending value.
        message: String,
    },

    /// I/O error while accessing an audio file.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The codec failed to decode or encode an audio file.
    #[error("Codec error for '{path}': {message}")]
    Codec {
        /// Path of the file being read or written.
        path: String,
        /// Codec failure description.
        message: String,
    },

    /// The resampling backend failed.
    #[error("Resampling error: {message}")]
    Resampling {
        /// Resampler failure description.
        message: String,
    },
}

impl AudioSignalError {
    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new state error.
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a new shape error.
    pub fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Shape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new domain error.
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Create a new codec error.
    pub fn codec(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Codec {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new resampling error.
    pub fn resampling(message: impl Into<String>) -> Self {
        Self::Resampling {
            message: message.into(),
        }
    }

    /// Returns true for [`AudioSignalError::Configuration`].
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns true for [`AudioSignalError::State`].
    pub const fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Returns true for [`AudioSignalError::Shape`].
    pub const fn is_shape(&self) -> bool {
        matches!(self, Self::Shape { .. })
    }

    /// Returns true for [`AudioSignalError::Domain`].
    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }
}
