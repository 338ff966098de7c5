//! sampic-core: Core types for SAMPIC digitizer data.
//!
//! This crate provides the decoded hit model shared by the format decoder,
//! the waveform tools and the file readers, together with the circular
//! buffer reorganizer that restores acquisition order of a sample buffer.
//!

pub mod error;
pub mod hit;
pub mod ring;
pub mod soa;

pub use error::{Error, Result};
pub use hit::{Hit, Timestamp};
pub use ring::{reorganize, reorganize_in_place, reorganize_into};
pub use soa::{HitBatch, HitView};
