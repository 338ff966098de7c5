//! Lazy frame decoder.

use crate::layout::{FrameLayout, RawHitFrame};
use crate::{Error, FileHeader, Result};
use std::io::Read;

/// Forward-only decoder over the frame stream that follows a header.
///
/// The decoder reads exactly one frame width per step. A stream that ends
/// on a frame boundary ends the sequence; a stream that ends inside a frame
/// yields [`Error::TruncatedStream`] once and then stops. Frames naming a
/// channel outside the header's range yield [`Error::CorruptFrame`] and the
/// decoder carries on with the next frame.
///
/// The frame buffer grows with the bytes actually read, so a header that
/// declares a huge capacity costs nothing until the frames are there.
pub struct FrameDecoder<R> {
    reader: R,
    header: FileHeader,
    layout: FrameLayout,
    capacity: usize,
    width: usize,
    buf: Vec<u8>,
    offset: u64,
    frames_read: u64,
    finished: bool,
}

impl<R: Read> FrameDecoder<R> {
    /// Creates a decoder for a source already positioned after `header`.
    pub fn new(reader: R, header: FileHeader) -> Self {
        let layout = header.frame_layout();
        let capacity = header.capacity() as usize;
        let width = layout.frame_width(capacity);
        log::debug!(
            "frame layout {:?}: {} bytes per frame, {} samples",
            layout,
            width,
            capacity
        );
        Self {
            reader,
            offset: header.encoded_len() as u64,
            header,
            layout,
            capacity,
            width,
            buf: Vec::new(),
            frames_read: 0,
            finished: false,
        }
    }

    /// Reads the header from `reader` and returns a decoder over the frames.
    ///
    /// # Errors
    /// Returns [`Error::MalformedHeader`] if the header is invalid.
    pub fn open(mut reader: R) -> Result<Self> {
        let header = FileHeader::read_from(&mut reader)?;
        Ok(Self::new(reader, header))
    }

    /// Header of the file being decoded.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Number of frames consumed so far, corrupt ones included.
    #[must_use]
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Byte offset of the next frame from the start of the file.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Decodes the next frame into `frame`, reusing its allocation.
    ///
    /// Returns `None` once the stream is exhausted or after a fatal error.
    /// On `Some(Err(_))` the content of `frame` is unspecified.
    pub fn read_frame_into(&mut self, frame: &mut RawHitFrame) -> Option<Result<()>> {
        if self.finished {
            return None;
        }

        let width = self.width;
        let filled = match fill(&mut self.reader, width, &mut self.buf) {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Some(Err(Error::Io(e)));
            }
        };
        if filled == 0 {
            self.finished = true;
            return None;
        }
        if filled < width {
            self.finished = true;
            return Some(Err(Error::TruncatedStream {
                offset: self.offset,
                expected: width,
                available: filled,
            }));
        }

        let frame_index = self.frames_read;
        self.frames_read += 1;
        self.offset += width as u64;
        self.layout.decode_into(&self.buf, self.capacity, frame);

        let channel_count = self.header.channel_count();
        if frame.channel >= channel_count {
            return Some(Err(Error::CorruptFrame {
                frame_index,
                channel: frame.channel,
                channel_count,
            }));
        }
        Some(Ok(()))
    }
}

impl<R: Read> Iterator for FrameDecoder<R> {
    type Item = Result<RawHitFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut frame = RawHitFrame::default();
        self.read_frame_into(&mut frame)
            .map(|status| status.map(|()| frame))
    }
}

/// Replaces `buf` with up to `width` bytes from `reader`; returns the count.
fn fill<R: Read>(reader: &mut R, width: usize, buf: &mut Vec<u8>) -> std::io::Result<usize> {
    buf.clear();
    reader.take(width as u64).read_to_end(buf)
}
