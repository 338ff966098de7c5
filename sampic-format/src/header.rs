//! File header parsing.
//!
//! Every capture starts with an 8-byte prelude (`b"SMPC"`, version `u16`,
//! reserved `u16`) followed by a version-specific body:
//!
//! - V1: `f64` sampling frequency @8, `u16` channel count @16, `u16`
//!   capacity @18, 4 reserved bytes. 24 bytes in total.
//! - V2: `f64` sampling frequency @8, `u32` channel count @16, `u32`
//!   capacity @20, 8 reserved bytes, then one `u16` physical channel id per
//!   logical channel. `32 + 2 * channels` bytes in total.

use crate::layout::{le_f64, le_u16, le_u32, FormatVersion, FrameLayout};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;

/// Magic bytes opening every capture file.
pub const MAGIC: [u8; 4] = *b"SMPC";

/// Size of the version-independent prelude.
pub const PRELUDE_LEN: usize = 8;

/// Most channels a header can describe: one per `u16` physical id.
pub const MAX_MAPPED_CHANNELS: u32 = 1 << 16;

/// Acquisition parameters of one capture file.
///
/// Immutable once built; every value is validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    version: FormatVersion,
    sampling_frequency_hz: f64,
    channel_count: u32,
    capacity: u32,
    channel_map: Vec<u16>,
}

impl FileHeader {
    /// Builds a header with the identity channel map.
    ///
    /// # Errors
    /// Returns [`Error::MalformedHeader`] if the frequency is not a positive
    /// finite number, a count is zero, or a count does not fit the version.
    /// Any version is limited to [`MAX_MAPPED_CHANNELS`] channels.
    pub fn new(
        version: FormatVersion,
        sampling_frequency_hz: f64,
        channel_count: u32,
        capacity: u32,
    ) -> Result<Self> {
        if !(sampling_frequency_hz.is_finite() && sampling_frequency_hz > 0.0) {
            return Err(Error::MalformedHeader(format!(
                "sampling frequency must be positive and finite, got {sampling_frequency_hz}"
            )));
        }
        if channel_count == 0 {
            return Err(Error::MalformedHeader("channel count is zero".to_string()));
        }
        if capacity == 0 {
            return Err(Error::MalformedHeader(
                "circular buffer capacity is zero".to_string(),
            ));
        }
        if version == FormatVersion::V1 {
            // V1 stores both counts and the channel index as u16.
            let limit = u32::from(u16::MAX);
            if channel_count > limit || capacity > limit {
                return Err(Error::MalformedHeader(format!(
                    "V1 header cannot describe {channel_count} channels of {capacity} samples"
                )));
            }
        }
        if channel_count > MAX_MAPPED_CHANNELS {
            // Physical channel ids in the map are u16.
            return Err(Error::MalformedHeader(format!(
                "{channel_count} channels exceed the {MAX_MAPPED_CHANNELS} physical channel ids"
            )));
        }
        let channel_map = (0..=u16::MAX).take(channel_count as usize).collect();
        Ok(Self {
            version,
            sampling_frequency_hz,
            channel_count,
            capacity,
            channel_map,
        })
    }

    /// Replaces the channel map.
    ///
    /// # Errors
    /// Returns [`Error::MalformedHeader`] if the map length differs from the
    /// channel count, or the version has no channel map (V1).
    pub fn with_channel_map(mut self, channel_map: Vec<u16>) -> Result<Self> {
        if self.version == FormatVersion::V1 {
            return Err(Error::MalformedHeader(
                "V1 headers carry no channel map".to_string(),
            ));
        }
        if channel_map.len() != self.channel_count as usize {
            return Err(Error::MalformedHeader(format!(
                "channel map has {} entries for {} channels",
                channel_map.len(),
                self.channel_count
            )));
        }
        self.channel_map = channel_map;
        Ok(self)
    }

    /// Parses a header from the start of `bytes`.
    ///
    /// Trailing bytes (the frame stream) are ignored; use
    /// [`Self::encoded_len`] to find where frames begin.
    ///
    /// # Errors
    /// Returns [`Error::MalformedHeader`] for short input, a bad magic, an
    /// unknown version or an invalid field value.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let version = parse_prelude(bytes)?;
        let fixed = version.fixed_header_len();
        require(bytes, fixed, "fixed header")?;

        let sampling_frequency_hz = le_f64(bytes, 8);
        let header = match version {
            FormatVersion::V1 => {
                let channels = u32::from(le_u16(bytes, 16));
                let capacity = u32::from(le_u16(bytes, 18));
                Self::new(version, sampling_frequency_hz, channels, capacity)?
            }
            FormatVersion::V2 => {
                let channels = le_u32(bytes, 16);
                let capacity = le_u32(bytes, 20);
                let map_end = fixed + 2 * channels as usize;
                require(bytes, map_end, "channel map")?;
                let header = Self::new(version, sampling_frequency_hz, channels, capacity)?;
                let map = bytes[fixed..map_end]
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                header.with_channel_map(map)?
            }
        };

        log::debug!(
            "parsed {:?} header: {} Hz, {} channels x {} samples",
            header.version,
            header.sampling_frequency_hz,
            header.channel_count,
            header.capacity
        );
        Ok(header)
    }

    /// Reads exactly one header from a sequential source.
    ///
    /// On success the source is positioned at the first frame.
    ///
    /// # Errors
    /// Returns [`Error::MalformedHeader`] if the source ends inside the
    /// header or the header is invalid, and [`Error::Io`] for read failures.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::with_capacity(FormatVersion::V2.fixed_header_len());
        read_up_to(reader, PRELUDE_LEN, &mut bytes)?;
        let version = parse_prelude(&bytes)?;

        let fixed = version.fixed_header_len();
        read_up_to(reader, fixed - PRELUDE_LEN, &mut bytes)?;
        require(&bytes, fixed, "fixed header")?;

        if version == FormatVersion::V2 {
            let channels = le_u32(&bytes, 16) as usize;
            read_up_to(reader, 2 * channels, &mut bytes)?;
        }
        Self::parse(&bytes)
    }

    /// Serializes the header in its on-disk layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.version.tag().to_le_bytes());
        out.extend_from_slice(&[0u8; 2]);
        out.extend_from_slice(&self.sampling_frequency_hz.to_le_bytes());
        match self.version {
            FormatVersion::V1 => {
                // Bounds checked in `new`.
                let channels = u16::try_from(self.channel_count).unwrap_or(u16::MAX);
                let capacity = u16::try_from(self.capacity).unwrap_or(u16::MAX);
                out.extend_from_slice(&channels.to_le_bytes());
                out.extend_from_slice(&capacity.to_le_bytes());
                out.extend_from_slice(&[0u8; 4]);
            }
            FormatVersion::V2 => {
                out.extend_from_slice(&self.channel_count.to_le_bytes());
                out.extend_from_slice(&self.capacity.to_le_bytes());
                out.extend_from_slice(&[0u8; 8]);
                for id in &self.channel_map {
                    out.extend_from_slice(&id.to_le_bytes());
                }
            }
        }
        out
    }

    /// Size of the header on disk.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self.version {
            FormatVersion::V1 => self.version.fixed_header_len(),
            FormatVersion::V2 => self.version.fixed_header_len() + 2 * self.channel_map.len(),
        }
    }

    /// Format version.
    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Frame layout selected by the format version.
    #[must_use]
    pub fn frame_layout(&self) -> FrameLayout {
        self.version.frame_layout()
    }

    /// Bytes per frame in this file.
    #[must_use]
    pub fn frame_width(&self) -> usize {
        self.frame_layout().frame_width(self.capacity as usize)
    }

    /// Sampling frequency in Hz.
    #[must_use]
    pub fn sampling_frequency_hz(&self) -> f64 {
        self.sampling_frequency_hz
    }

    /// Sampling period in seconds, also the duration of one timestamp tick.
    #[must_use]
    pub fn sampling_period_s(&self) -> f64 {
        1.0 / self.sampling_frequency_hz
    }

    /// Number of logical channels.
    #[must_use]
    pub fn channel_count(&self) -> u32 {
        self.channel_count
    }

    /// Circular buffer capacity per channel, in samples.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Physical channel id per logical channel index.
    #[must_use]
    pub fn channel_map(&self) -> &[u16] {
        &self.channel_map
    }

    /// Physical channel id of a logical channel.
    #[must_use]
    pub fn physical_channel(&self, channel: u32) -> Option<u16> {
        self.channel_map.get(channel as usize).copied()
    }

    /// Header fields as an ordered name -> scalar mapping, for writers that
    /// keep the acquisition parameters next to converted data.
    #[must_use]
    pub fn metadata(&self) -> BTreeMap<String, MetadataValue> {
        let map_text = self
            .channel_map
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        BTreeMap::from([
            (
                "format_version".to_string(),
                MetadataValue::Integer(u64::from(self.version.tag())),
            ),
            (
                "sampling_frequency_hz".to_string(),
                MetadataValue::Float(self.sampling_frequency_hz),
            ),
            (
                "sampling_period_s".to_string(),
                MetadataValue::Float(self.sampling_period_s()),
            ),
            (
                "channel_count".to_string(),
                MetadataValue::Integer(u64::from(self.channel_count)),
            ),
            (
                "buffer_capacity".to_string(),
                MetadataValue::Integer(u64::from(self.capacity)),
            ),
            (
                "frame_width_bytes".to_string(),
                MetadataValue::Integer(self.frame_width() as u64),
            ),
            ("channel_map".to_string(), MetadataValue::Text(map_text)),
        ])
    }
}

/// A scalar header value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Integer field.
    Integer(u64),
    /// Real-valued field.
    Float(f64),
    /// Text field.
    Text(String),
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

fn parse_prelude(bytes: &[u8]) -> Result<FormatVersion> {
    require(bytes, PRELUDE_LEN, "prelude")?;
    if bytes[..4] != MAGIC {
        return Err(Error::MalformedHeader(format!(
            "bad magic {:02x?}, expected {:02x?}",
            &bytes[..4],
            MAGIC
        )));
    }
    let tag = le_u16(bytes, 4);
    FormatVersion::from_tag(tag)
        .ok_or_else(|| Error::MalformedHeader(format!("unrecognized format version {tag}")))
}

fn require(bytes: &[u8], len: usize, what: &str) -> Result<()> {
    if bytes.len() < len {
        return Err(Error::MalformedHeader(format!(
            "{what} needs {len} bytes, only {} available",
            bytes.len()
        )));
    }
    Ok(())
}

fn read_up_to<R: Read>(reader: &mut R, len: usize, out: &mut Vec<u8>) -> Result<()> {
    reader.take(len as u64).read_to_end(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_bytes(freq: f64, channels: u16, capacity: u16) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"SMPC");
        b.extend_from_slice(&1u16.to_le_bytes());
        b.extend_from_slice(&[0, 0]);
        b.extend_from_slice(&freq.to_le_bytes());
        b.extend_from_slice(&channels.to_le_bytes());
        b.extend_from_slice(&capacity.to_le_bytes());
        b.extend_from_slice(&[0; 4]);
        b
    }

    #[test]
    fn test_parse_v1() {
        let header = FileHeader::parse(&v1_bytes(1e9, 2, 4)).unwrap();
        assert_eq!(header.version(), FormatVersion::V1);
        assert_eq!(header.sampling_frequency_hz(), 1e9);
        assert_eq!(header.channel_count(), 2);
        assert_eq!(header.capacity(), 4);
        assert_eq!(header.channel_map(), &[0, 1]);
        assert_eq!(header.encoded_len(), 24);
        assert_eq!(header.frame_width(), 16);
    }

    #[test]
    fn test_parse_v2_channel_map() {
        let header = FileHeader::new(FormatVersion::V2, 6.4e9, 3, 64)
            .unwrap()
            .with_channel_map(vec![8, 9, 15])
            .unwrap();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), 32 + 6);

        let parsed = FileHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.physical_channel(2), Some(15));
        assert_eq!(parsed.physical_channel(3), None);
    }

    #[test]
    fn test_zero_fields_are_fatal() {
        assert!(matches!(
            FileHeader::parse(&v1_bytes(1e9, 0, 4)),
            Err(Error::MalformedHeader(_))
        ));
        assert!(matches!(
            FileHeader::parse(&v1_bytes(1e9, 2, 0)),
            Err(Error::MalformedHeader(_))
        ));
        assert!(FileHeader::parse(&v1_bytes(0.0, 2, 4)).is_err());
        assert!(FileHeader::parse(&v1_bytes(-5.0, 2, 4)).is_err());
        assert!(FileHeader::parse(&v1_bytes(f64::NAN, 2, 4)).is_err());
    }

    #[test]
    fn test_unknown_version_and_magic() {
        let mut bytes = v1_bytes(1e9, 2, 4);
        bytes[4] = 9;
        let err = FileHeader::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("unrecognized format version 9"));

        let mut bytes = v1_bytes(1e9, 2, 4);
        bytes[0] = b'X';
        assert!(FileHeader::parse(&bytes).is_err());
    }

    #[test]
    fn test_short_input() {
        let bytes = v1_bytes(1e9, 2, 4);
        for len in [0, 4, 8, 23] {
            assert!(matches!(
                FileHeader::parse(&bytes[..len]),
                Err(Error::MalformedHeader(_))
            ));
        }
    }

    #[test]
    fn test_read_from_stops_at_first_frame() {
        let header = FileHeader::new(FormatVersion::V2, 1e9, 2, 8)
            .unwrap()
            .with_channel_map(vec![4, 5])
            .unwrap();
        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(&[0xAA; 5]);

        let mut cursor = std::io::Cursor::new(bytes);
        let parsed = FileHeader::read_from(&mut cursor).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(cursor.position() as usize, header.encoded_len());
    }

    #[test]
    fn test_read_from_truncated_map() {
        let header = FileHeader::new(FormatVersion::V2, 1e9, 4, 8).unwrap();
        let bytes = header.to_bytes();
        let mut short = &bytes[..bytes.len() - 1];
        assert!(matches!(
            FileHeader::read_from(&mut short),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_metadata_mapping() {
        let header = FileHeader::parse(&v1_bytes(2e9, 2, 4)).unwrap();
        let meta = header.metadata();
        assert_eq!(meta["sampling_frequency_hz"], MetadataValue::Float(2e9));
        assert_eq!(meta["channel_count"], MetadataValue::Integer(2));
        assert_eq!(meta["buffer_capacity"], MetadataValue::Integer(4));
        assert_eq!(meta["format_version"], MetadataValue::Integer(1));
        assert_eq!(meta["channel_map"].to_string(), "0,1");
    }

    #[test]
    fn test_v1_limits() {
        assert!(FileHeader::new(FormatVersion::V1, 1e9, 70_000, 4).is_err());
        assert!(FileHeader::new(FormatVersion::V2, 1e9, 70_000, 4).is_err());
        assert!(FileHeader::new(FormatVersion::V1, 1e9, 2, 4)
            .unwrap()
            .with_channel_map(vec![1, 0])
            .is_err());
    }

    #[test]
    fn test_v2_identity_map_covers_every_id() {
        let header = FileHeader::new(FormatVersion::V2, 1e9, 65_536, 4).unwrap();
        assert_eq!(header.physical_channel(0), Some(0));
        assert_eq!(header.physical_channel(65_535), Some(u16::MAX));
        assert_eq!(header.physical_channel(65_536), None);

        let err = FileHeader::new(FormatVersion::V2, 1e9, 65_537, 4).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }
}
