//! Memory-bounded batch sizing.

use crate::{Error, Result};
use sampic_format::{CorruptFramePolicy, DecoderConfig, FileHeader};
use std::mem::size_of;
use sysinfo::System;

const MEMORY_OVERHEAD_FACTOR: f64 = 1.2;

/// How many hits to hold per batch.
///
/// An explicit `batch_size` wins; otherwise the batch is sized to fit a
/// memory budget, given in bytes or as a fraction of available memory.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchSizing {
    /// Fixed number of hits per batch.
    pub batch_size: Option<usize>,
    /// Fraction of available system memory to target (0.0 < fraction <= 1.0).
    pub memory_fraction: f64,
    /// Explicit memory budget override (bytes). If set, `memory_fraction` is ignored.
    pub memory_budget_bytes: Option<usize>,
}

impl Default for BatchSizing {
    fn default() -> Self {
        Self {
            batch_size: None,
            memory_fraction: 0.5,
            memory_budget_bytes: None,
        }
    }
}

impl BatchSizing {
    /// Use a fixed number of hits per batch.
    #[must_use]
    pub fn with_batch_size(mut self, hits: usize) -> Self {
        self.batch_size = Some(hits);
        self
    }

    /// Set the fraction of available system memory to target.
    #[must_use]
    pub fn with_memory_fraction(mut self, fraction: f64) -> Self {
        self.memory_fraction = fraction;
        self
    }

    /// Set an explicit memory budget in bytes.
    #[must_use]
    pub fn with_memory_budget_bytes(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = Some(bytes);
        self
    }

    /// Resolve the target memory budget in bytes.
    ///
    /// # Errors
    /// Returns an error if the memory fraction is invalid or system memory cannot be queried.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn resolve_budget_bytes(&self) -> Result<usize> {
        if let Some(bytes) = self.memory_budget_bytes {
            return Ok(bytes);
        }
        if !(0.0 < self.memory_fraction && self.memory_fraction <= 1.0) {
            return Err(Error::ConfigError(
                "memory_fraction must be in (0.0, 1.0]".to_string(),
            ));
        }
        let mut system = System::new();
        system.refresh_memory();
        let available = system.available_memory();
        if available == 0 {
            return Err(Error::ConfigError(
                "available system memory reported as 0".to_string(),
            ));
        }
        let budget = (available as f64 * self.memory_fraction).floor() as u64;
        Ok(usize::try_from(budget).unwrap_or(usize::MAX))
    }

    /// Resolve the number of hits per batch for a capture.
    ///
    /// # Errors
    /// Returns an error if the fixed size is 0 or the budget cannot be
    /// resolved.
    pub fn resolve_batch_size(&self, header: &FileHeader) -> Result<usize> {
        match self.batch_size {
            Some(0) => Err(Error::ConfigError(
                "batch_size must be at least 1".to_string(),
            )),
            Some(hits) => Ok(hits),
            None => {
                let budget = self.resolve_budget_bytes()?;
                let hits = max_hits_for_budget(budget, bytes_per_hit(header));
                log::debug!("memory budget {budget} bytes -> {hits} hits per batch");
                Ok(hits)
            }
        }
    }

    /// Builds a decoder configuration for a capture.
    ///
    /// # Errors
    /// See [`BatchSizing::resolve_batch_size`].
    pub fn decoder_config(
        &self,
        header: &FileHeader,
        policy: CorruptFramePolicy,
    ) -> Result<DecoderConfig> {
        Ok(DecoderConfig::new()
            .with_batch_size(self.resolve_batch_size(header)?)
            .with_corrupt_frame_policy(policy))
    }
}

/// In-memory footprint of one reconstructed hit.
#[must_use]
pub fn bytes_per_hit(header: &FileHeader) -> usize {
    size_of::<u32>()
        + size_of::<u64>()
        + size_of::<f64>()
        + size_of::<u32>() * header.capacity() as usize
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn max_hits_for_budget(budget_bytes: usize, bytes_per_hit: usize) -> usize {
    let per_hit = (bytes_per_hit as f64 * MEMORY_OVERHEAD_FACTOR).ceil() as usize;
    let per_hit = per_hit.max(1);
    (budget_bytes / per_hit).max(1)
}
