use sampic_format::{
    CorruptFramePolicy, DecoderConfig, FileHeader, FormatVersion, FrameWriter, RawHitFrame,
};
use sampic_io::{BatchSizing, Error, SampicFileReader};
use std::io::Write;

fn write_file(header: &FileHeader, frames: &[RawHitFrame]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut writer = FrameWriter::new(&mut file, header).unwrap();
    for frame in frames {
        writer.write_frame(frame).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);
    file
}

fn frames_on(channels: &[u32], capacity: u32) -> Vec<RawHitFrame> {
    channels
        .iter()
        .enumerate()
        .map(|(i, &ch)| {
            let i = u32::try_from(i).unwrap();
            RawHitFrame::new(ch, u64::from(i) * 1_000, i % capacity, vec![i; capacity as usize])
        })
        .collect()
}

#[test]
fn test_channel_hit_counts() {
    let header = FileHeader::new(FormatVersion::V2, 5e9, 8, 16).unwrap();
    let frames = frames_on(&[0, 2, 2, 5, 0, 2, 7, 2], 16);
    let file = write_file(&header, &frames);

    let reader = SampicFileReader::open(file.path()).unwrap();
    assert_eq!(reader.header(), &header);
    assert_eq!(reader.frame_count(), 8);

    let counts = reader
        .channel_hit_counts(DecoderConfig::new().with_batch_size(3))
        .unwrap();
    assert_eq!(
        counts.iter().collect::<Vec<_>>(),
        vec![(0, 2), (2, 4), (5, 1), (7, 1)]
    );
    assert_eq!(counts.range(0, 3), vec![(0, 2), (1, 0), (2, 4), (3, 0)]);
}

#[test]
fn test_counts_skip_corrupt_frames() {
    let header = FileHeader::new(FormatVersion::V1, 1e9, 4, 8).unwrap();
    let frames = frames_on(&[0, 1, 9, 1, 3], 8);
    let file = write_file(&header, &frames);
    let reader = SampicFileReader::open(file.path()).unwrap();

    let config = DecoderConfig::new().with_corrupt_frame_policy(CorruptFramePolicy::Skip);
    let counts = reader.channel_hit_counts(config).unwrap();
    assert_eq!(counts.total(), 4);

    let aborted = reader.channel_hit_counts(DecoderConfig::default());
    assert!(matches!(
        aborted,
        Err(Error::Format(sampic_format::Error::CorruptFrame { channel: 9, .. }))
    ));
}

#[test]
fn test_memory_budget_batches() {
    let header = FileHeader::new(FormatVersion::V1, 1e9, 2, 8).unwrap();
    let frames = frames_on(&[0, 1, 0, 1, 0, 1, 0], 8);
    let file = write_file(&header, &frames);
    let reader = SampicFileReader::open(file.path()).unwrap();

    // 52 bytes per hit, 63 with overhead: room for two hits.
    let config = BatchSizing::default()
        .with_memory_budget_bytes(130)
        .decoder_config(reader.header(), CorruptFramePolicy::Abort)
        .unwrap();
    assert_eq!(config.batch_size, 2);

    let sizes: Vec<usize> = reader
        .hit_batches(config)
        .unwrap()
        .map(|b| b.unwrap().len())
        .collect();
    assert_eq!(sizes, vec![2, 2, 2, 1]);
}

#[test]
fn test_truncated_file_reports_after_hits() {
    let header = FileHeader::new(FormatVersion::V1, 1e9, 2, 4).unwrap();
    let frames = frames_on(&[0, 1, 1], 4);
    let file = write_file(&header, &frames);
    file.as_file().set_len(24 + 16 * 2 + 5).unwrap();

    let reader = SampicFileReader::open(file.path()).unwrap();
    assert_eq!(reader.frame_count(), 2);
    assert_eq!(reader.trailing_bytes(), 5);

    let mut stream = reader.hit_batches(DecoderConfig::default()).unwrap();
    assert_eq!(stream.next().unwrap().unwrap().len(), 2);
    assert!(matches!(
        stream.next(),
        Some(Err(Error::Format(sampic_format::Error::TruncatedStream { .. })))
    ));
    assert!(stream.next().is_none());
    assert_eq!(stream.stats().hits_decoded, 2);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = SampicFileReader::open(dir.path().join("absent.bin"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_header_only_file() {
    let header = FileHeader::new(FormatVersion::V1, 1e9, 1, 2).unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&header.to_bytes()).unwrap();
    file.flush().unwrap();
    let reader = SampicFileReader::open(file.path()).unwrap();
    assert_eq!(reader.frame_count(), 0);
    assert!(reader.read_all(DecoderConfig::default()).unwrap().is_empty());
}
