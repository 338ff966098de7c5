//! Hit types for SAMPIC waveform data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trigger timestamp in digitizer ticks.
///
/// One tick is one sampling period, so the conversion to seconds needs the
/// sampling frequency of the file the hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Creates a new timestamp.
    #[inline]
    #[must_use]
    pub fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick count.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.0
    }

    /// Converts the tick count to seconds.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_seconds(&self, sampling_frequency_hz: f64) -> f64 {
        self.0 as f64 / sampling_frequency_hz
    }

    /// Computes the absolute tick difference.
    #[inline]
    #[must_use]
    pub fn abs_diff(&self, other: &Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

/// One decoded trigger on a single channel.
///
/// `samples` is in acquisition order: index 0 is the oldest sample, the last
/// index the most recent one. Codes are raw ADC values without scaling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Logical channel index.
    pub channel: u32,
    /// Trigger timestamp.
    pub timestamp: Timestamp,
    /// Trigger time in seconds.
    pub time_seconds: f64,
    /// Ordered sample codes.
    pub samples: Vec<u32>,
}

impl Hit {
    /// Creates a hit, converting the tick timestamp with the given frequency.
    #[must_use]
    pub fn new(channel: u32, ticks: u64, sampling_frequency_hz: f64, samples: Vec<u32>) -> Self {
        let timestamp = Timestamp::new(ticks);
        Self {
            channel,
            timestamp,
            time_seconds: timestamp.to_seconds(sampling_frequency_hz),
            samples,
        }
    }

    /// Number of samples in the waveform.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the hit carries no samples.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest sample code and its index (first occurrence).
    #[must_use]
    pub fn peak(&self) -> Option<(usize, u32)> {
        peak_of(&self.samples)
    }

    /// Sample codes widened to `f64`, ready for interpolation.
    #[must_use]
    pub fn samples_f64(&self) -> Vec<f64> {
        self.samples.iter().map(|&s| f64::from(s)).collect()
    }
}

pub(crate) fn peak_of(samples: &[u32]) -> Option<(usize, u32)> {
    samples
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_timestamp_seconds() {
        let ts = Timestamp::new(2_500);
        assert_relative_eq!(ts.to_seconds(1e9), 2.5e-6);
        assert_eq!(ts.abs_diff(&Timestamp::new(2_000)), 500);
    }

    #[test]
    fn test_hit_new() {
        let hit = Hit::new(1, 1_000, 1e9, vec![1, 5, 3]);
        assert_eq!(hit.channel, 1);
        assert_eq!(hit.timestamp.ticks(), 1_000);
        assert_relative_eq!(hit.time_seconds, 1e-6);
        assert_eq!(hit.len(), 3);
    }

    #[test]
    fn test_peak_first_occurrence() {
        let hit = Hit::new(0, 0, 1.0, vec![4, 9, 2, 9]);
        assert_eq!(hit.peak(), Some((1, 9)));
        assert_eq!(Hit::new(0, 0, 1.0, Vec::new()).peak(), None);
    }
}
