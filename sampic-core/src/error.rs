//! Error types for sampic-core.

use thiserror::Error;

/// Result type alias for sampic operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for sampic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Circular-buffer write pointer outside `[0, len)`.
    #[error("invalid write pointer {pointer} for a buffer of {len} samples")]
    InvalidPointer { pointer: usize, len: usize },

    /// Hit sample count does not match the batch stride.
    #[error("hit carries {got} samples, batch expects {expected}")]
    SampleCountMismatch { expected: usize, got: usize },
}
