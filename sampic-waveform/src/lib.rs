//! sampic-waveform: Band-limited reconstruction of SAMPIC waveforms.
//!
//! This crate evaluates a hit's samples at arbitrary times:
//! - **Windowed-sinc** - sinc kernel under a Hann window
//! - **Lanczos** - sinc kernel under a sinc window (default, half-width 3)
//!
//! Every target is evaluated independently; [`interpolate_par`] and
//! [`reconstruct_batch`] spread the work over the rayon pool.
#![warn(missing_docs)]

mod error;
mod interpolate;
pub mod kernel;
mod reconstruct;

pub use error::{Error, Result};
pub use interpolate::{
    interpolate, interpolate_par, InterpolationConfig, InterpolationRequest, Interpolator,
};
pub use kernel::KernelKind;
pub use reconstruct::{
    reconstruct_batch, reconstruct_hit, uniform_time_axis, Waveform, MAX_TIME_AXIS_POINTS,
};
