//! Interpolation kernels.
//!
//! Both kernels are band-limited sinc kernels truncated to a finite support:
//! - **Windowed-sinc** - `sinc(d) * hann(d)` with a Hann window spanning
//!   `half_width + 1` samples on each side
//! - **Lanczos** - `sinc(d) * sinc(d / a)` for `|d| < a`, with `a = half_width`
//!
//! Both kernels weigh 1 at `d = 0` and 0 at every other integer offset, so
//! reconstruction passes exactly through the samples.

use std::f64::consts::PI;

/// Kernel used to reconstruct a waveform between samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KernelKind {
    /// Sinc kernel shaped by a Hann window.
    WindowedSinc,
    /// Sinc kernel shaped by a wider sinc lobe.
    #[default]
    Lanczos,
}

impl KernelKind {
    /// Returns the kernel weight at offset `d` (in samples) for `half_width`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn weight(self, d: f64, half_width: usize) -> f64 {
        match self {
            Self::WindowedSinc => {
                let span = (half_width + 1) as f64;
                if d.abs() >= span {
                    return 0.0;
                }
                sinc(d) * 0.5 * (1.0 + (PI * d / span).cos())
            }
            Self::Lanczos => {
                let a = half_width as f64;
                if d.abs() >= a {
                    return 0.0;
                }
                sinc(d) * sinc(d / a)
            }
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::WindowedSinc => "windowed-sinc",
            Self::Lanczos => "lanczos",
        }
    }
}

impl std::fmt::Display for KernelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for KernelKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "windowed-sinc" | "windowed_sinc" | "sinc" => Ok(Self::WindowedSinc),
            "lanczos" => Ok(Self::Lanczos),
            other => Err(crate::Error::ConfigError(format!(
                "unknown kernel '{other}' (expected windowed-sinc or lanczos)"
            ))),
        }
    }
}

/// Normalized sinc, `sin(pi x) / (pi x)`.
///
/// Exact 1 at zero and exact 0 at every other integer.
#[must_use]
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    if x.fract() == 0.0 {
        return 0.0;
    }
    let px = PI * x;
    px.sin() / px
}
