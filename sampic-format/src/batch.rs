//! Batched hit reconstruction.

use crate::decoder::FrameDecoder;
use crate::layout::RawHitFrame;
use crate::{CorruptFramePolicy, DecoderConfig, Error, Result};
use sampic_core::{HitBatch, Timestamp};
use std::io::Read;

/// Sample budget reserved up front for a batch; more grows as frames arrive.
const PREALLOCATED_SAMPLES: usize = 1 << 20;

/// Counters collected while iterating a capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStatistics {
    /// Frames read from the stream, corrupt ones included.
    pub frames_read: u64,
    /// Hits placed into emitted or pending batches.
    pub hits_decoded: u64,
    /// Corrupt frames dropped under [`CorruptFramePolicy::Skip`].
    pub corrupt_frames_skipped: u64,
    /// Frames with an out-of-range write pointer dropped under
    /// [`CorruptFramePolicy::Skip`].
    pub invalid_pointer_frames_skipped: u64,
    /// Batches handed to the caller.
    pub batches_emitted: u64,
}

/// Iterator of [`HitBatch`] values reconstructed from a frame stream.
///
/// Each batch holds at most `batch_size` hits in stream order with samples
/// already in acquisition order. When a fatal error stops decoding, the
/// hits decoded before it are emitted first and the error follows as the
/// next item; the iterator ends after that.
pub struct HitBatches<R> {
    decoder: FrameDecoder<R>,
    config: DecoderConfig,
    scratch: RawHitFrame,
    pending_error: Option<Error>,
    done: bool,
    stats: DecodeStatistics,
}

impl<R: Read> HitBatches<R> {
    /// Wraps a frame decoder.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if the configuration is invalid.
    pub fn new(decoder: FrameDecoder<R>, config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            decoder,
            config,
            scratch: RawHitFrame::default(),
            pending_error: None,
            done: false,
            stats: DecodeStatistics::default(),
        })
    }

    /// Reads the header from `reader` and iterates its hits.
    ///
    /// # Errors
    /// Returns an error if the header or the configuration is invalid.
    pub fn open(reader: R, config: DecoderConfig) -> Result<Self> {
        Self::new(FrameDecoder::open(reader)?, config)
    }

    /// Header of the file being decoded.
    #[must_use]
    pub fn header(&self) -> &crate::FileHeader {
        self.decoder.header()
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> DecodeStatistics {
        self.stats
    }

    fn fill_batch(&mut self) -> HitBatch {
        let header = self.decoder.header();
        let frequency = header.sampling_frequency_hz();
        let capacity = header.capacity() as usize;
        let reserved = (PREALLOCATED_SAMPLES / capacity.max(1)).min(self.config.batch_size);
        let mut batch = HitBatch::with_capacity(reserved, capacity);

        while batch.len() < self.config.batch_size {
            match self.decoder.read_frame_into(&mut self.scratch) {
                None => {
                    self.done = true;
                    break;
                }
                Some(Ok(())) => {
                    self.stats.frames_read += 1;
                    let frame = &self.scratch;
                    let ts = Timestamp::new(frame.timestamp);
                    let pushed = batch.push_ring(
                        frame.channel,
                        frame.timestamp,
                        ts.to_seconds(frequency),
                        &frame.samples,
                        frame.write_pointer as usize,
                    );
                    if let Err(e) = pushed {
                        if self.config.corrupt_frame_policy == CorruptFramePolicy::Skip {
                            log::warn!(
                                "skipping frame {}: {e}",
                                self.decoder.frames_read().saturating_sub(1)
                            );
                            self.stats.invalid_pointer_frames_skipped += 1;
                            continue;
                        }
                        self.pending_error = Some(Error::Core(e));
                        break;
                    }
                    self.stats.hits_decoded += 1;
                }
                Some(Err(e)) => {
                    if let Error::CorruptFrame { .. } = e {
                        self.stats.frames_read += 1;
                        if self.config.corrupt_frame_policy == CorruptFramePolicy::Skip {
                            log::warn!("skipping {e}");
                            self.stats.corrupt_frames_skipped += 1;
                            continue;
                        }
                    }
                    self.pending_error = Some(e);
                    break;
                }
            }
        }
        batch
    }
}

impl<R: Read> Iterator for HitBatches<R> {
    type Item = Result<HitBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending_error.take() {
            self.done = true;
            return Some(Err(e));
        }
        if self.done {
            return None;
        }

        let batch = self.fill_batch();
        if batch.is_empty() {
            return self.pending_error.take().map(|e| {
                self.done = true;
                Err(e)
            });
        }
        self.stats.batches_emitted += 1;
        Some(Ok(batch))
    }
}
