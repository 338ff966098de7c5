//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header or frame decoding error.
    #[error("format error: {0}")]
    Format(#[from] sampic_format::Error),

    /// Invalid reader or batching configuration.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
