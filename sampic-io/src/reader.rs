//! Memory-mapped file readers.
//!

use crate::{Error, Result};
use memmap2::Mmap;
use sampic_core::HitBatch;
use sampic_format::{
    DecodeStatistics, DecoderConfig, FileHeader, FrameDecoder, HitBatches,
};
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A memory-mapped file reader.
///
/// Uses memmap2 to efficiently access file contents without
/// loading the entire file into memory.
pub struct MappedFileReader {
    mmap: Arc<Mmap>,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap: Arc::new(mmap),
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Clone)]
struct SharedMmap(Arc<Mmap>);

impl AsRef<[u8]> for SharedMmap {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

/// Hit batches of a capture; owns its share of the file mapping.
pub struct HitBatchStream {
    inner: HitBatches<Cursor<SharedMmap>>,
}

impl HitBatchStream {
    /// Header of the capture.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        self.inner.header()
    }

    /// Decode counters so far.
    #[must_use]
    pub fn stats(&self) -> DecodeStatistics {
        self.inner.stats()
    }
}

impl Iterator for HitBatchStream {
    type Item = Result<HitBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| item.map_err(Error::from))
    }
}

/// A SAMPIC capture reader with memory-mapped I/O.
///
/// The header is parsed once at open time; frames are decoded lazily by
/// the streams this reader hands out.
pub struct SampicFileReader {
    reader: MappedFileReader,
    header: FileHeader,
}

impl SampicFileReader {
    /// Opens a capture and parses its header.
    ///
    /// # Errors
    /// Returns an error if the file cannot be mapped or the header is
    /// malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        let header = FileHeader::parse(reader.as_bytes())?;
        let this = Self { reader, header };
        log::info!(
            "opened {}: format v{}, {} channels x {} samples at {} Hz, {} frames",
            this.reader.path().display(),
            this.header.version().tag(),
            this.header.channel_count(),
            this.header.capacity(),
            this.header.sampling_frequency_hz(),
            this.frame_count()
        );
        if this.trailing_bytes() > 0 {
            log::warn!(
                "{}: {} trailing bytes after the last complete frame",
                this.reader.path().display(),
                this.trailing_bytes()
            );
        }
        Ok(this)
    }

    /// Parsed header.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Path of the capture.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    fn payload_len(&self) -> usize {
        self.reader.len().saturating_sub(self.header.encoded_len())
    }

    /// Number of complete frames after the header.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.payload_len() / self.header.frame_width()
    }

    /// Bytes after the last complete frame; non-zero means a truncated capture.
    #[must_use]
    pub fn trailing_bytes(&self) -> usize {
        self.payload_len() % self.header.frame_width()
    }

    fn payload_cursor(&self) -> Cursor<SharedMmap> {
        let mut cursor = Cursor::new(SharedMmap(self.reader.mmap.clone()));
        cursor.set_position(self.header.encoded_len() as u64);
        cursor
    }

    /// Returns a lazy decoder over the raw frames.
    #[must_use]
    pub fn frames(&self) -> FrameDecoder<impl std::io::Read> {
        FrameDecoder::new(self.payload_cursor(), self.header.clone())
    }

    /// Returns a stream of hit batches.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn hit_batches(&self, config: DecoderConfig) -> Result<HitBatchStream> {
        let decoder = FrameDecoder::new(self.payload_cursor(), self.header.clone());
        Ok(HitBatchStream {
            inner: HitBatches::new(decoder, config)?,
        })
    }

    /// Decodes every hit into a single batch.
    ///
    /// # Errors
    /// Returns the first fatal decoding error.
    pub fn read_all(&self, config: DecoderConfig) -> Result<HitBatch> {
        let mut all = HitBatch::with_capacity(self.frame_count(), self.header.capacity() as usize);
        for batch in self.hit_batches(config)? {
            all.append(&batch?)
                .map_err(|e| Error::Format(sampic_format::Error::Core(e)))?;
        }
        Ok(all)
    }
}
