//! sampic-io: Memory-mapped file I/O for SAMPIC captures.
//!
//! This crate maps capture files with memmap2, parses their header once
//! and hands out owned batch streams that decode frames lazily.
//!

mod counts;
mod error;
mod reader;
pub mod sizing;

pub use counts::ChannelHitCounts;
pub use error::{Error, Result};
pub use reader::{HitBatchStream, MappedFileReader, SampicFileReader};
pub use sizing::BatchSizing;
