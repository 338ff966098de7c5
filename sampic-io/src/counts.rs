//! Per-channel hit counting.

use crate::reader::SampicFileReader;
use crate::Result;
use sampic_core::HitBatch;
use sampic_format::DecoderConfig;
use std::collections::BTreeMap;

/// Number of hits seen on each channel, ordered by channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelHitCounts {
    counts: BTreeMap<u32, u64>,
}

impl ChannelHitCounts {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every hit of `batch` to the tally.
    pub fn add_batch(&mut self, batch: &HitBatch) {
        for &channel in &batch.channel {
            *self.counts.entry(channel).or_insert(0) += 1;
        }
    }

    /// Hits on `channel`; zero if none were seen.
    #[must_use]
    pub fn get(&self, channel: u32) -> u64 {
        self.counts.get(&channel).copied().unwrap_or(0)
    }

    /// Total number of hits.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of channels with at least one hit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no hit was counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(channel, hits)` pairs for channels that were hit, in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.counts.iter().map(|(&ch, &n)| (ch, n))
    }

    /// `(channel, hits)` for every channel in `first..=last`, zero-filled.
    #[must_use]
    pub fn range(&self, first: u32, last: u32) -> Vec<(u32, u64)> {
        (first..=last).map(|ch| (ch, self.get(ch))).collect()
    }
}

impl SampicFileReader {
    /// Streams the capture in batches and counts hits per channel.
    ///
    /// # Errors
    /// Returns the first fatal decoding error.
    pub fn channel_hit_counts(&self, config: DecoderConfig) -> Result<ChannelHitCounts> {
        let mut counts = ChannelHitCounts::new();
        let mut stream = self.hit_batches(config)?;
        for batch in stream.by_ref() {
            counts.add_batch(&batch?);
        }
        let stats = stream.stats();
        log::debug!(
            "counted {} hits on {} channels ({} corrupt, {} invalid-pointer frames skipped)",
            counts.total(),
            counts.len(),
            stats.corrupt_frames_skipped,
            stats.invalid_pointer_frames_skipped
        );
        Ok(counts)
    }
}
