//! Interpolation error types.

use thiserror::Error;

/// Result type for waveform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Interpolation error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Kernel half-width of zero.
    #[error("invalid kernel width {0}: half-width must be at least 1")]
    InvalidKernelWidth(usize),

    /// Sampling period that is not a positive finite number.
    #[error("invalid sampling period {0}")]
    InvalidSamplingPeriod(f64),

    /// Target time that is NaN or infinite.
    #[error("target time #{index} is not finite ({value})")]
    NonFiniteTarget {
        /// Position in the target list.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
