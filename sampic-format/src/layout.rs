//! Frame layouts of the SAMPIC capture format.
//!
//! Every format version maps to exactly one [`FrameLayout`]. The layout is
//! picked once from the file header and then used for every frame, so the
//! per-frame path is a plain `match` on a two-variant enum.
//!
//! | layout   | channel | timestamp | write pointer | sample codes     |
//! |----------|---------|-----------|---------------|------------------|
//! | Compact  | u16 @0  | u32 @2    | u16 @6        | N x u16 from @8  |
//! | Extended | u32 @0  | u64 @4    | u32 @12       | N x u32 from @16 |
//!
//! All fields are little-endian.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Known capture format versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum FormatVersion {
    /// 16-bit fields, 12-bit ADC codes stored as u16, identity channel map.
    V1 = 1,
    /// 32/64-bit fields, u32 sample codes, explicit channel map.
    V2 = 2,
}

impl FormatVersion {
    /// Resolves a raw version tag.
    #[must_use]
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }

    /// Raw version tag as stored in the file.
    #[must_use]
    pub fn tag(self) -> u16 {
        self as u16
    }

    /// Frame layout used by this version.
    #[must_use]
    pub fn frame_layout(self) -> FrameLayout {
        match self {
            Self::V1 => FrameLayout::Compact,
            Self::V2 => FrameLayout::Extended,
        }
    }

    /// Size of the fixed part of the header, prelude included.
    #[must_use]
    pub fn fixed_header_len(self) -> usize {
        match self {
            Self::V1 => 24,
            Self::V2 => 32,
        }
    }
}

/// Byte layout of one hit frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLayout {
    /// Version 1 frames.
    Compact,
    /// Version 2 frames.
    Extended,
}

impl FrameLayout {
    /// Bytes in front of the sample codes.
    #[inline]
    #[must_use]
    pub fn prefix_width(self) -> usize {
        match self {
            Self::Compact => 8,
            Self::Extended => 16,
        }
    }

    /// Bytes per sample code.
    #[inline]
    #[must_use]
    pub fn sample_width(self) -> usize {
        match self {
            Self::Compact => 2,
            Self::Extended => 4,
        }
    }

    /// Total frame width for a ring of `capacity` samples.
    #[inline]
    #[must_use]
    pub fn frame_width(self, capacity: usize) -> usize {
        self.prefix_width() + self.sample_width() * capacity
    }

    /// Decodes one frame from `buf` into `frame`, reusing its sample buffer.
    ///
    /// `buf` must hold exactly `frame_width(capacity)` bytes; the decoder
    /// guarantees this before calling.
    pub(crate) fn decode_into(self, buf: &[u8], capacity: usize, frame: &mut RawHitFrame) {
        frame.samples.clear();
        frame.samples.reserve(capacity);
        let codes = &buf[self.prefix_width()..self.frame_width(capacity)];
        match self {
            Self::Compact => {
                frame.channel = u32::from(le_u16(buf, 0));
                frame.timestamp = u64::from(le_u32(buf, 2));
                frame.write_pointer = u32::from(le_u16(buf, 6));
                frame.samples.extend(
                    codes
                        .chunks_exact(2)
                        .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]]))),
                );
            }
            Self::Extended => {
                frame.channel = le_u32(buf, 0);
                frame.timestamp = le_u64(buf, 4);
                frame.write_pointer = le_u32(buf, 12);
                frame
                    .samples
                    .extend(codes.chunks_exact(4).map(|c| le_u32(c, 0)));
            }
        }
    }

    /// Appends the encoded frame to `out`.
    ///
    /// # Errors
    /// Returns [`Error::EncodeError`] if the sample count differs from
    /// `capacity` or a field does not fit the layout's width.
    pub(crate) fn encode(self, frame: &RawHitFrame, capacity: usize, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        let encoded = self.encode_fields(frame, capacity, out);
        if encoded.is_err() {
            out.truncate(start);
        }
        encoded
    }

    fn encode_fields(self, frame: &RawHitFrame, capacity: usize, out: &mut Vec<u8>) -> Result<()> {
        if frame.samples.len() != capacity {
            return Err(Error::EncodeError(format!(
                "frame carries {} samples, capacity is {}",
                frame.samples.len(),
                capacity
            )));
        }
        out.reserve(self.frame_width(capacity));
        match self {
            Self::Compact => {
                let channel = narrow_u16(frame.channel, "channel")?;
                let timestamp = u32::try_from(frame.timestamp).map_err(|_| {
                    Error::EncodeError(format!(
                        "timestamp {} does not fit 32 bits",
                        frame.timestamp
                    ))
                })?;
                let pointer = narrow_u16(frame.write_pointer, "write pointer")?;
                out.extend_from_slice(&channel.to_le_bytes());
                out.extend_from_slice(&timestamp.to_le_bytes());
                out.extend_from_slice(&pointer.to_le_bytes());
                for &code in &frame.samples {
                    out.extend_from_slice(&narrow_u16(code, "sample code")?.to_le_bytes());
                }
            }
            Self::Extended => {
                out.extend_from_slice(&frame.channel.to_le_bytes());
                out.extend_from_slice(&frame.timestamp.to_le_bytes());
                out.extend_from_slice(&frame.write_pointer.to_le_bytes());
                for &code in &frame.samples {
                    out.extend_from_slice(&code.to_le_bytes());
                }
            }
        }
        Ok(())
    }
}

fn narrow_u16(value: u32, field: &str) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| Error::EncodeError(format!("{field} {value} does not fit 16 bits")))
}

/// One frame as stored on disk, before ring reorganization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHitFrame {
    /// Logical channel index.
    pub channel: u32,
    /// Trigger timestamp in ticks.
    pub timestamp: u64,
    /// Ring write pointer at trigger time.
    pub write_pointer: u32,
    /// Raw sample codes in storage order.
    pub samples: Vec<u32>,
}

impl RawHitFrame {
    /// Creates a frame.
    #[must_use]
    pub fn new(channel: u32, timestamp: u64, write_pointer: u32, samples: Vec<u32>) -> Self {
        Self {
            channel,
            timestamp,
            write_pointer,
            samples,
        }
    }
}

#[inline]
fn array_at<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

#[inline]
pub(crate) fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(array_at(bytes, offset))
}

#[inline]
pub(crate) fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(array_at(bytes, offset))
}

#[inline]
pub(crate) fn le_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(array_at(bytes, offset))
}

#[inline]
pub(crate) fn le_f64(bytes: &[u8], offset: usize) -> f64 {
    f64::from_le_bytes(array_at(bytes, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_tags() {
        assert_eq!(FormatVersion::from_tag(1), Some(FormatVersion::V1));
        assert_eq!(FormatVersion::from_tag(2), Some(FormatVersion::V2));
        assert_eq!(FormatVersion::from_tag(0), None);
        assert_eq!(FormatVersion::from_tag(3), None);
        assert_eq!(FormatVersion::V2.tag(), 2);
    }

    #[test]
    fn test_frame_widths() {
        assert_eq!(FrameLayout::Compact.frame_width(4), 16);
        assert_eq!(FrameLayout::Extended.frame_width(4), 32);
        assert_eq!(FrameLayout::Compact.frame_width(64), 8 + 128);
    }

    #[test]
    fn test_compact_field_offsets() {
        // channel 3, timestamp 0x0102_0304, pointer 1, samples [0xABC, 7]
        let buf = [
            0x03, 0x00, 0x04, 0x03, 0x02, 0x01, 0x01, 0x00, 0xBC, 0x0A, 0x07, 0x00,
        ];
        let mut frame = RawHitFrame::default();
        FrameLayout::Compact.decode_into(&buf, 2, &mut frame);
        assert_eq!(frame, RawHitFrame::new(3, 0x0102_0304, 1, vec![0xABC, 7]));
    }

    #[test]
    fn test_encode_decode_extended() {
        let frame = RawHitFrame::new(70_000, u64::MAX - 1, 5, vec![u32::MAX, 0, 1]);
        let mut buf = Vec::new();
        FrameLayout::Extended.encode(&frame, 3, &mut buf).unwrap();
        assert_eq!(buf.len(), FrameLayout::Extended.frame_width(3));

        let mut decoded = RawHitFrame::default();
        FrameLayout::Extended.decode_into(&buf, 3, &mut decoded);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_compact_rejects_wide_values() {
        let mut buf = Vec::new();
        let wide_code = RawHitFrame::new(0, 0, 0, vec![0x1_0000]);
        assert!(FrameLayout::Compact.encode(&wide_code, 1, &mut buf).is_err());

        let wide_ts = RawHitFrame::new(0, 1 << 33, 0, vec![0]);
        assert!(FrameLayout::Compact.encode(&wide_ts, 1, &mut buf).is_err());

        let short = RawHitFrame::new(0, 0, 0, vec![0]);
        assert!(FrameLayout::Compact.encode(&short, 2, &mut buf).is_err());
        assert!(buf.is_empty());
    }
}
