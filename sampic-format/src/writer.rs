//! Capture writer for synthetic files and re-encoding.

use crate::layout::{FrameLayout, RawHitFrame};
use crate::{FileHeader, Result};
use std::io::Write;

/// Writes a header followed by frames in the header's layout.
pub struct FrameWriter<W: Write> {
    writer: W,
    layout: FrameLayout,
    capacity: usize,
    buf: Vec<u8>,
    frames_written: u64,
}

impl<W: Write> FrameWriter<W> {
    /// Writes `header` and returns a writer ready for frames.
    ///
    /// # Errors
    /// Returns an error if the header cannot be written.
    pub fn new(mut writer: W, header: &FileHeader) -> Result<Self> {
        writer.write_all(&header.to_bytes())?;
        let layout = header.frame_layout();
        let capacity = header.capacity() as usize;
        Ok(Self {
            writer,
            layout,
            capacity,
            buf: Vec::with_capacity(layout.frame_width(capacity)),
            frames_written: 0,
        })
    }

    /// Encodes and writes one frame.
    ///
    /// Channel indices are not checked against the header, so corrupt
    /// captures can be produced on purpose.
    ///
    /// # Errors
    /// Returns [`crate::Error::EncodeError`] if the frame does not fit the
    /// layout and [`crate::Error::Io`] if writing fails.
    pub fn write_frame(&mut self, frame: &RawHitFrame) -> Result<()> {
        self.buf.clear();
        self.layout.encode(frame, self.capacity, &mut self.buf)?;
        self.writer.write_all(&self.buf)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Number of frames written so far.
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flushes the underlying writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
