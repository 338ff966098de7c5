//! Capture-format error types.

use thiserror::Error;

/// Result type for format operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Capture-format error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Header missing, non-positive, or of an unknown version.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// A frame would read past the end of the stream.
    #[error("truncated stream at byte {offset}: frame needs {expected} bytes, {available} left")]
    TruncatedStream {
        offset: u64,
        expected: usize,
        available: usize,
    },

    /// A frame violates a structural invariant of the capture.
    #[error("corrupt frame #{frame_index}: channel {channel} outside 0..{channel_count}")]
    CorruptFrame {
        frame_index: u64,
        channel: u32,
        channel_count: u32,
    },

    /// A value does not fit the selected frame layout.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] sampic_core::Error),
}

impl Error {
    /// Returns true for errors a caller may skip past and keep decoding.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::CorruptFrame { .. })
    }
}
