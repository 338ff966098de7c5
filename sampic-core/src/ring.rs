//! Circular sample buffer reorganization.
//!
//! The digitizer stores each channel's samples in a fixed-size ring and
//! reports the write pointer at trigger time. The slot under the write
//! pointer holds the oldest sample, so acquisition order is the rotation
//! that starts there:
//!
//! `output[i] = raw[(write_pointer + i) % N]`

use crate::{Error, Result};

#[inline]
fn check_pointer(len: usize, write_pointer: usize) -> Result<()> {
    if write_pointer >= len {
        return Err(Error::InvalidPointer {
            pointer: write_pointer,
            len,
        });
    }
    Ok(())
}

/// Returns the samples of `raw` in acquisition order.
///
/// # Errors
/// Returns [`Error::InvalidPointer`] if `write_pointer >= raw.len()`, which
/// includes every pointer into an empty buffer.
pub fn reorganize<T: Copy>(raw: &[T], write_pointer: usize) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(raw.len());
    reorganize_into(raw, write_pointer, &mut out)?;
    Ok(out)
}

/// Appends the samples of `raw` in acquisition order to `out`.
///
/// `out` is left untouched on error.
///
/// # Errors
/// Returns [`Error::InvalidPointer`] if `write_pointer >= raw.len()`.
pub fn reorganize_into<T: Copy>(raw: &[T], write_pointer: usize, out: &mut Vec<T>) -> Result<()> {
    check_pointer(raw.len(), write_pointer)?;
    let (newer, older) = raw.split_at(write_pointer);
    out.reserve(raw.len());
    out.extend_from_slice(older);
    out.extend_from_slice(newer);
    Ok(())
}

/// Rotates `samples` in place into acquisition order.
///
/// # Errors
/// Returns [`Error::InvalidPointer`] if `write_pointer >= samples.len()`.
pub fn reorganize_in_place<T>(samples: &mut [T], write_pointer: usize) -> Result<()> {
    check_pointer(samples.len(), write_pointer)?;
    samples.rotate_left(write_pointer);
    Ok(())
}
