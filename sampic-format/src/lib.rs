//! sampic-format: SAMPIC capture header parser, frame decoder and batching.
//!
//! This crate turns the raw bytes of a SAMPIC capture into [`HitBatch`]
//! values whose waveforms are in acquisition order.
//!
//! # Key Components
//!
//! - [`FileHeader`] - Acquisition parameters and layout selection
//! - [`FrameDecoder`] - Lazy, forward-only frame decoder
//! - [`HitBatches`] - Bounded-size batches of reconstructed hits
//! - [`FrameWriter`] - Encoder for synthetic captures
//!
//! # Processing Pipeline
//!
//! 1. Parse the header once and select the frame layout
//! 2. Decode frames one at a time from any [`std::io::Read`] source
//! 3. Rotate each ring buffer into acquisition order while batching
//!
//! No ordering across channels is imposed: hits come out in stream order.

mod batch;
mod decoder;
mod error;
pub mod header;
pub mod layout;
mod writer;

pub use batch::{DecodeStatistics, HitBatches};
pub use decoder::FrameDecoder;
pub use error::{Error, Result};
pub use header::{FileHeader, MetadataValue, MAX_MAPPED_CHANNELS};
pub use layout::{FormatVersion, FrameLayout, RawHitFrame};
pub use writer::FrameWriter;

// Re-export core types for convenience
pub use sampic_core::{Hit, HitBatch, HitView};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// What to do with a frame whose content breaks a capture invariant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptFramePolicy {
    /// Stop iterating and hand the error to the caller.
    #[default]
    Abort,
    /// Drop the frame, log it and continue.
    Skip,
}

/// Decoder configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum number of hits per batch (default: 100 000).
    pub batch_size: usize,
    /// Handling of corrupt frames (default: abort).
    pub corrupt_frame_policy: CorruptFramePolicy,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            batch_size: 100_000,
            corrupt_frame_policy: CorruptFramePolicy::Abort,
        }
    }
}

#[derive(Deserialize)]
struct JsonConfig {
    #[serde(default)]
    decoder: DecoderConfig,
}

impl DecoderConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the corrupt frame policy.
    #[must_use]
    pub fn with_corrupt_frame_policy(mut self, policy: CorruptFramePolicy) -> Self {
        self.corrupt_frame_policy = policy;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if `batch_size` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::ConfigError(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a JSON file.
    ///
    /// The document has a single `decoder` object; missing keys keep their
    /// defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// the resulting configuration is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let json: JsonConfig =
            serde_json::from_reader(reader).map_err(|e| Error::ConfigError(e.to_string()))?;
        json.decoder.validate()?;
        Ok(json.decoder)
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string is not valid JSON or the resulting
    /// configuration is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let json: JsonConfig =
            serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))?;
        json.decoder.validate()?;
        Ok(json.decoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.batch_size, 100_000);
        assert_eq!(config.corrupt_frame_policy, CorruptFramePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_loading() {
        let json = r#"{
            "decoder": {
                "batch_size": 512,
                "corrupt_frame_policy": "skip"
            }
        }"#;
        let config = DecoderConfig::from_json(json).expect("Failed to parse JSON");
        assert_eq!(config.batch_size, 512);
        assert_eq!(config.corrupt_frame_policy, CorruptFramePolicy::Skip);
    }

    #[test]
    fn test_json_partial_config() {
        let config = DecoderConfig::from_json(r#"{ "decoder": { "batch_size": 64 } }"#)
            .expect("Should parse partial config");
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.corrupt_frame_policy, CorruptFramePolicy::Abort);

        let config = DecoderConfig::from_json("{}").expect("Should parse empty config");
        assert_eq!(config, DecoderConfig::default());
    }

    #[test]
    fn test_json_invalid_values() {
        assert!(DecoderConfig::from_json(r#"{ "decoder": { "batch_size": 0 } }"#).is_err());
        assert!(
            DecoderConfig::from_json(r#"{ "decoder": { "corrupt_frame_policy": "retry" } }"#)
                .is_err()
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "decoder": {{ "corrupt_frame_policy": "skip" }} }}"#).unwrap();
        file.flush().unwrap();
        let config = DecoderConfig::from_file(file.path()).unwrap();
        assert_eq!(config.corrupt_frame_policy, CorruptFramePolicy::Skip);
    }
}
