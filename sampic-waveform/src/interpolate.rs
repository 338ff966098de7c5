//! Interpolation engine.

use crate::kernel::KernelKind;
use crate::{Error, Result};
use rayon::prelude::*;

/// Kernel selection and width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InterpolationConfig {
    /// Kernel shape (default: Lanczos).
    pub kernel: KernelKind,
    /// Samples used on each side of the target (default: 3).
    pub half_width: usize,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            kernel: KernelKind::Lanczos,
            half_width: 3,
        }
    }
}

impl InterpolationConfig {
    /// Creates a configuration.
    #[must_use]
    pub fn new(kernel: KernelKind, half_width: usize) -> Self {
        Self { kernel, half_width }
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKernelWidth`] if `half_width` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.half_width == 0 {
            return Err(Error::InvalidKernelWidth(self.half_width));
        }
        Ok(())
    }
}

/// Validated kernel, width and sampling period.
///
/// Holds no mutable state, so one value can serve any number of threads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interpolator {
    kernel: KernelKind,
    half_width: usize,
    sampling_period: f64,
}

impl Interpolator {
    /// Creates an interpolator.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKernelWidth`] if `half_width` is 0 and
    /// [`Error::InvalidSamplingPeriod`] if the period is not a positive
    /// finite number.
    pub fn new(kernel: KernelKind, half_width: usize, sampling_period: f64) -> Result<Self> {
        if half_width == 0 {
            return Err(Error::InvalidKernelWidth(half_width));
        }
        if !(sampling_period.is_finite() && sampling_period > 0.0) {
            return Err(Error::InvalidSamplingPeriod(sampling_period));
        }
        Ok(Self {
            kernel,
            half_width,
            sampling_period,
        })
    }

    /// Creates an interpolator from a configuration.
    ///
    /// # Errors
    /// See [`Interpolator::new`].
    pub fn from_config(config: &InterpolationConfig, sampling_period: f64) -> Result<Self> {
        Self::new(config.kernel, config.half_width, sampling_period)
    }

    /// Kernel in use.
    #[must_use]
    pub fn kernel(&self) -> KernelKind {
        self.kernel
    }

    /// Half-width in samples.
    #[must_use]
    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Sampling period in seconds.
    #[must_use]
    pub fn sampling_period(&self) -> f64 {
        self.sampling_period
    }

    /// Reconstructed amplitude at time `t` (seconds from the first sample).
    ///
    /// Only samples within `half_width` of the nearest sample index take
    /// part; indices outside `samples` contribute nothing. The result for a
    /// non-finite `t` is unspecified.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn value_at(&self, samples: &[f64], t: f64) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let x = t / self.sampling_period;
        // Float to int casts saturate, so far-away targets get an empty window.
        let nearest = x.round() as i64;
        let hw = i64::try_from(self.half_width).unwrap_or(i64::MAX);
        let last = i64::try_from(samples.len() - 1).unwrap_or(i64::MAX);
        let lo = nearest.saturating_sub(hw).max(0);
        let hi = nearest.saturating_add(hw).min(last);
        if lo > hi {
            return 0.0;
        }

        let mut acc = 0.0;
        for k in lo as usize..=hi as usize {
            let w = self.kernel.weight(x - k as f64, self.half_width);
            acc += samples[k] * w;
        }
        acc
    }

    /// Evaluates every target in order.
    ///
    /// # Errors
    /// Returns [`Error::NonFiniteTarget`] for the first NaN or infinite
    /// target.
    pub fn evaluate(&self, samples: &[f64], target_times: &[f64]) -> Result<Vec<f64>> {
        check_targets(target_times)?;
        Ok(target_times
            .iter()
            .map(|&t| self.value_at(samples, t))
            .collect())
    }

    /// Evaluates targets in parallel on the rayon pool.
    ///
    /// Produces the same values, in the same order, as [`evaluate`](Self::evaluate).
    ///
    /// # Errors
    /// Returns [`Error::NonFiniteTarget`] for the first NaN or infinite
    /// target.
    pub fn evaluate_par(&self, samples: &[f64], target_times: &[f64]) -> Result<Vec<f64>> {
        check_targets(target_times)?;
        Ok(target_times
            .par_iter()
            .map(|&t| self.value_at(samples, t))
            .collect())
    }
}

fn check_targets(target_times: &[f64]) -> Result<()> {
    match target_times.iter().position(|t| !t.is_finite()) {
        Some(index) => Err(Error::NonFiniteTarget {
            index,
            value: target_times[index],
        }),
        None => Ok(()),
    }
}

/// One reconstruction job: samples, their period and where to evaluate.
#[derive(Clone, Copy, Debug)]
pub struct InterpolationRequest<'a> {
    /// Samples in acquisition order.
    pub samples: &'a [f64],
    /// Seconds between consecutive samples.
    pub sampling_period: f64,
    /// Kernel shape.
    pub kernel: KernelKind,
    /// Samples used on each side of a target.
    pub half_width: usize,
    /// Evaluation times in seconds from the first sample.
    pub target_times: &'a [f64],
}

impl<'a> InterpolationRequest<'a> {
    /// Builds a request from a configuration.
    #[must_use]
    pub fn new(
        samples: &'a [f64],
        sampling_period: f64,
        config: &InterpolationConfig,
        target_times: &'a [f64],
    ) -> Self {
        Self {
            samples,
            sampling_period,
            kernel: config.kernel,
            half_width: config.half_width,
            target_times,
        }
    }

    /// Runs the request sequentially.
    ///
    /// # Errors
    /// See [`interpolate`].
    pub fn run(&self) -> Result<Vec<f64>> {
        Interpolator::new(self.kernel, self.half_width, self.sampling_period)?
            .evaluate(self.samples, self.target_times)
    }

    /// Runs the request with targets spread over the rayon pool.
    ///
    /// # Errors
    /// See [`interpolate`].
    pub fn run_par(&self) -> Result<Vec<f64>> {
        Interpolator::new(self.kernel, self.half_width, self.sampling_period)?
            .evaluate_par(self.samples, self.target_times)
    }
}

/// Reconstructs `samples` at each of `target_times`.
///
/// Targets are seconds relative to the first sample and may be
/// non-uniform or lie outside the sampled range. An empty `samples`
/// yields zeros.
///
/// # Errors
/// - [`Error::InvalidKernelWidth`] if `half_width` is 0
/// - [`Error::InvalidSamplingPeriod`] if the period is not positive and finite
/// - [`Error::NonFiniteTarget`] if a target is NaN or infinite
pub fn interpolate(
    samples: &[f64],
    sampling_period: f64,
    kernel: KernelKind,
    half_width: usize,
    target_times: &[f64],
) -> Result<Vec<f64>> {
    Interpolator::new(kernel, half_width, sampling_period)?.evaluate(samples, target_times)
}

/// Parallel form of [`interpolate`].
///
/// # Errors
/// Same as [`interpolate`].
pub fn interpolate_par(
    samples: &[f64],
    sampling_period: f64,
    kernel: KernelKind,
    half_width: usize,
    target_times: &[f64],
) -> Result<Vec<f64>> {
    Interpolator::new(kernel, half_width, sampling_period)?.evaluate_par(samples, target_times)
}
