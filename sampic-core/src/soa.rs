//! Structure of Arrays (`SoA`) types for batched hits.
//!
//! This module defines the `HitBatch` structure which stores hit data in
//! parallel vectors (`SoA` layout) rather than an array of structs (`AoS`).
//! Waveforms of every hit share one flat sample column with a fixed stride
//! equal to the circular-buffer capacity, so a columnar writer can take the
//! columns as they are.

use crate::hit::peak_of;
use crate::ring::reorganize_into;
use crate::{Error, Hit, Result, Timestamp};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A batch of hits stored in Structure of Arrays (`SoA`) format.
///
/// Insertion order is decode order. No ordering by channel or time is
/// applied.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitBatch {
    /// Columnar storage for channel indices.
    pub channel: Vec<u32>,
    /// Columnar storage for timestamps in ticks.
    pub timestamp: Vec<u64>,
    /// Columnar storage for timestamps in seconds.
    pub time_seconds: Vec<f64>,
    /// Flat sample storage, `samples_per_hit` codes per hit.
    pub samples: Vec<u32>,
    samples_per_hit: usize,
}

impl HitBatch {
    /// Creates an empty batch for waveforms of `samples_per_hit` samples.
    #[must_use]
    pub fn new(samples_per_hit: usize) -> Self {
        Self {
            samples_per_hit,
            ..Self::default()
        }
    }

    /// Creates a new empty batch with room for `capacity` hits.
    #[must_use]
    pub fn with_capacity(capacity: usize, samples_per_hit: usize) -> Self {
        Self {
            channel: Vec::with_capacity(capacity),
            timestamp: Vec::with_capacity(capacity),
            time_seconds: Vec::with_capacity(capacity),
            samples: Vec::with_capacity(capacity.saturating_mul(samples_per_hit)),
            samples_per_hit,
        }
    }

    /// Number of samples stored per hit.
    #[must_use]
    pub fn samples_per_hit(&self) -> usize {
        self.samples_per_hit
    }

    /// Returns the number of hits in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Clears all vectors in the batch.
    pub fn clear(&mut self) {
        self.channel.clear();
        self.timestamp.clear();
        self.time_seconds.clear();
        self.samples.clear();
    }

    /// Appends all hits from another batch to this one.
    ///
    /// # Errors
    /// Returns [`Error::SampleCountMismatch`] if the batches use different
    /// waveform lengths.
    pub fn append(&mut self, other: &HitBatch) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() && self.samples_per_hit == 0 {
            self.samples_per_hit = other.samples_per_hit;
        }
        if other.samples_per_hit != self.samples_per_hit {
            return Err(Error::SampleCountMismatch {
                expected: self.samples_per_hit,
                got: other.samples_per_hit,
            });
        }
        self.channel.extend_from_slice(&other.channel);
        self.timestamp.extend_from_slice(&other.timestamp);
        self.time_seconds.extend_from_slice(&other.time_seconds);
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Pushes an already ordered hit.
    ///
    /// # Errors
    /// Returns [`Error::SampleCountMismatch`] if the waveform length differs
    /// from the batch stride.
    pub fn push(&mut self, hit: &Hit) -> Result<()> {
        if hit.samples.len() != self.samples_per_hit {
            return Err(Error::SampleCountMismatch {
                expected: self.samples_per_hit,
                got: hit.samples.len(),
            });
        }
        self.channel.push(hit.channel);
        self.timestamp.push(hit.timestamp.ticks());
        self.time_seconds.push(hit.time_seconds);
        self.samples.extend_from_slice(&hit.samples);
        Ok(())
    }

    /// Pushes a hit straight from its ring buffer, restoring sample order on
    /// the way in.
    ///
    /// The batch is unchanged on error.
    ///
    /// # Errors
    /// Returns [`Error::SampleCountMismatch`] for a buffer of the wrong size
    /// and [`Error::InvalidPointer`] for a write pointer outside the buffer.
    pub fn push_ring(
        &mut self,
        channel: u32,
        ticks: u64,
        time_seconds: f64,
        raw: &[u32],
        write_pointer: usize,
    ) -> Result<()> {
        if raw.len() != self.samples_per_hit {
            return Err(Error::SampleCountMismatch {
                expected: self.samples_per_hit,
                got: raw.len(),
            });
        }
        reorganize_into(raw, write_pointer, &mut self.samples)?;
        self.channel.push(channel);
        self.timestamp.push(ticks);
        self.time_seconds.push(time_seconds);
        Ok(())
    }

    /// Samples of the hit at `index`.
    #[must_use]
    pub fn samples_of(&self, index: usize) -> Option<&[u32]> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.samples_per_hit;
        self.samples.get(start..start + self.samples_per_hit)
    }

    /// Borrowed view of the hit at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<HitView<'_>> {
        Some(HitView {
            channel: *self.channel.get(index)?,
            timestamp: Timestamp::new(*self.timestamp.get(index)?),
            time_seconds: *self.time_seconds.get(index)?,
            samples: self.samples_of(index)?,
        })
    }

    /// Iterates over the hits in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = HitView<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Copies the batch out into owned hits.
    #[must_use]
    pub fn to_hits(&self) -> Vec<Hit> {
        self.iter().map(|view| view.to_hit()).collect()
    }
}

/// A borrowed hit inside a [`HitBatch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitView<'a> {
    /// Logical channel index.
    pub channel: u32,
    /// Trigger timestamp.
    pub timestamp: Timestamp,
    /// Trigger time in seconds.
    pub time_seconds: f64,
    /// Ordered sample codes.
    pub samples: &'a [u32],
}

impl HitView<'_> {
    /// Largest sample code and its index.
    #[must_use]
    pub fn peak(&self) -> Option<(usize, u32)> {
        peak_of(self.samples)
    }

    /// Sample codes widened to `f64`.
    #[must_use]
    pub fn samples_f64(&self) -> Vec<f64> {
        self.samples.iter().map(|&s| f64::from(s)).collect()
    }

    /// Copies the view into an owned hit.
    #[must_use]
    pub fn to_hit(&self) -> Hit {
        Hit {
            channel: self.channel,
            timestamp: self.timestamp,
            time_seconds: self.time_seconds,
            samples: self.samples.to_vec(),
        }
    }
}

impl Hit {
    /// Borrows the hit as a [`HitView`].
    #[must_use]
    pub fn as_view(&self) -> HitView<'_> {
        HitView {
            channel: self.channel,
            timestamp: self.timestamp,
            time_seconds: self.time_seconds,
            samples: &self.samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_batch_operations() {
        let mut batch = HitBatch::with_capacity(10, 4);
        assert!(batch.is_empty());

        batch.push(&Hit::new(0, 1_000, 1e9, vec![1, 2, 3, 4])).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.samples_of(0), Some(&[1, 2, 3, 4][..]));

        batch.push_ring(1, 2_000, 2e-6, &[10, 20, 30, 40], 2).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.samples_of(1), Some(&[30, 40, 10, 20][..]));

        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_view_round_trip() {
        let hit = Hit::new(3, 500, 1e9, vec![4, 9, 2]);
        let view = hit.as_view();
        assert_eq!(view.peak(), Some((1, 9)));
        assert_eq!(view.to_hit(), hit);
    }

    #[test]
    fn test_push_ring_failure_leaves_batch_untouched() {
        let mut batch = HitBatch::new(3);
        assert!(batch.push_ring(0, 0, 0.0, &[1, 2, 3], 3).is_err());
        assert!(batch.push_ring(0, 0, 0.0, &[1, 2], 0).is_err());
        assert!(batch.is_empty());
        assert!(batch.samples.is_empty());
    }

    #[test]
    fn test_append_checks_stride() {
        let mut a = HitBatch::new(2);
        a.push(&Hit::new(0, 1, 1.0, vec![1, 2])).unwrap();
        let mut b = HitBatch::new(3);
        b.push(&Hit::new(1, 2, 1.0, vec![1, 2, 3])).unwrap();
        assert!(a.append(&b).is_err());

        let mut empty = HitBatch::default();
        empty.append(&a).unwrap();
        assert_eq!(empty.samples_per_hit(), 2);
        assert_eq!(empty.to_hits(), a.to_hits());
    }

    #[test]
    fn test_views_follow_insertion_order() {
        let mut batch = HitBatch::new(1);
        for (ch, ts) in [(1u32, 50u64), (0, 10), (1, 20)] {
            batch.push(&Hit::new(ch, ts, 1.0, vec![ch])).unwrap();
        }
        let channels: Vec<u32> = batch.iter().map(|h| h.channel).collect();
        let ticks: Vec<u64> = batch.iter().map(|h| h.timestamp.ticks()).collect();
        assert_eq!(channels, vec![1, 0, 1]);
        assert_eq!(ticks, vec![50, 10, 20]);
        assert!(batch.get(3).is_none());
    }
}
