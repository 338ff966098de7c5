//! Waveform reconstruction for decoded hits.

use crate::{Error, InterpolationConfig, Interpolator, Result};
use rayon::prelude::*;
use sampic_core::{HitBatch, HitView};

/// Reconstructed waveform: evaluation times and amplitudes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Waveform {
    /// Seconds from the first sample of the hit.
    pub times: Vec<f64>,
    /// Amplitude in raw ADC units.
    pub values: Vec<f64>,
}

impl Waveform {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the waveform has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Largest amplitude and the time it occurs at.
    #[must_use]
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.times
            .iter()
            .zip(&self.values)
            .fold(None, |best: Option<(f64, f64)>, (&t, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((t, v)),
            })
    }
}

/// Longest time axis [`uniform_time_axis`] will build.
pub const MAX_TIME_AXIS_POINTS: usize = 1 << 26;

/// Uniform time axis from the first to the last sample instant with
/// `oversample` points per sampling period.
///
/// # Errors
/// Returns [`Error::ConfigError`] if `oversample` is 0 or the axis would
/// exceed [`MAX_TIME_AXIS_POINTS`], and [`Error::InvalidSamplingPeriod`] for
/// a bad period.
#[allow(clippy::cast_precision_loss)]
pub fn uniform_time_axis(
    sample_count: usize,
    sampling_period: f64,
    oversample: usize,
) -> Result<Vec<f64>> {
    if oversample == 0 {
        return Err(Error::ConfigError(
            "oversample factor must be at least 1".to_string(),
        ));
    }
    if !(sampling_period.is_finite() && sampling_period > 0.0) {
        return Err(Error::InvalidSamplingPeriod(sampling_period));
    }
    if sample_count == 0 {
        return Ok(Vec::new());
    }
    let points = (sample_count - 1)
        .checked_mul(oversample)
        .and_then(|n| n.checked_add(1))
        .filter(|&n| n <= MAX_TIME_AXIS_POINTS)
        .ok_or_else(|| {
            Error::ConfigError(format!(
                "{sample_count} samples oversampled {oversample}x exceed {MAX_TIME_AXIS_POINTS} points"
            ))
        })?;
    let step = sampling_period / oversample as f64;
    Ok((0..points).map(|i| i as f64 * step).collect())
}

/// Reconstructs one hit on a uniform oversampled axis.
///
/// # Errors
/// Returns an error if the configuration, period or oversample factor is
/// invalid.
pub fn reconstruct_hit(
    hit: &HitView<'_>,
    sampling_period: f64,
    config: &InterpolationConfig,
    oversample: usize,
) -> Result<Waveform> {
    let interpolator = Interpolator::from_config(config, sampling_period)?;
    let times = uniform_time_axis(hit.samples.len(), sampling_period, oversample)?;
    let samples = hit.samples_f64();
    let values = interpolator.evaluate(&samples, &times)?;
    Ok(Waveform { times, values })
}

/// Reconstructs every hit of a batch, one rayon task per hit.
///
/// # Errors
/// Returns an error if the configuration, period or oversample factor is
/// invalid.
pub fn reconstruct_batch(
    batch: &HitBatch,
    sampling_period: f64,
    config: &InterpolationConfig,
    oversample: usize,
) -> Result<Vec<Waveform>> {
    let interpolator = Interpolator::from_config(config, sampling_period)?;
    let times = uniform_time_axis(batch.samples_per_hit(), sampling_period, oversample)?;
    Ok((0..batch.len())
        .into_par_iter()
        .filter_map(|i| batch.get(i))
        .map(|hit| {
            let samples = hit.samples_f64();
            let values = times
                .iter()
                .map(|&t| interpolator.value_at(&samples, t))
                .collect();
            Waveform {
                times: times.clone(),
                values,
            }
        })
        .collect())
}
