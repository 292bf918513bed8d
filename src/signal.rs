//! Signal representation
//!
//! A uniformly sampled acceleration time history. Immutable once built.

use serde::{Deserialize, Serialize};

use crate::SsiError;

/// Relative tolerance on the sample spacing when checking uniformity.
const UNIFORM_TOLERANCE: f64 = 1e-6;

/// Uniformly sampled (time, acceleration) sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    time: Vec<f64>,
    values: Vec<f64>,
    dt: f64,
}

impl Signal {
    /// Create a signal from explicit time and acceleration vectors.
    ///
    /// Rejects mismatched lengths, fewer than two samples, non-finite values,
    /// and time vectors that are not strictly increasing with constant spacing.
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> Result<Self, SsiError> {
        if time.len() != values.len() {
            return Err(SsiError::ShapeMismatch {
                context: "signal time/value",
                expected: time.len(),
                got: values.len(),
            });
        }
        if time.len() < 2 {
            return Err(SsiError::InvalidSignal(
                "at least two samples are required".to_string(),
            ));
        }
        if time.iter().chain(values.iter()).any(|v| !v.is_finite()) {
            return Err(SsiError::InvalidSignal(
                "time and acceleration must be finite".to_string(),
            ));
        }

        let dt = (time[time.len() - 1] - time[0]) / (time.len() - 1) as f64;
        if dt <= 0.0 {
            return Err(SsiError::InvalidSignal(
                "time must be strictly increasing".to_string(),
            ));
        }
        for (i, pair) in time.windows(2).enumerate() {
            let step = pair[1] - pair[0];
            if (step - dt).abs() > UNIFORM_TOLERANCE * dt {
                return Err(SsiError::InvalidSignal(format!(
                    "non-uniform sampling at index {}: step {step} vs mean {dt}",
                    i + 1
                )));
            }
        }

        Ok(Self { time, values, dt })
    }

    /// Create a signal from acceleration samples with spacing `dt` starting at `t0`.
    pub fn from_acceleration(dt: f64, t0: f64, values: Vec<f64>) -> Result<Self, SsiError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SsiError::InvalidSignal(format!(
                "sample spacing must be positive and finite, got {dt}"
            )));
        }
        let time = (0..values.len()).map(|i| t0 + i as f64 * dt).collect();
        Self::new(time, values)
    }

    /// Time stamps
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Acceleration samples
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sample spacing
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Sample rate (1 / dt)
    pub fn sample_rate(&self) -> f64 {
        1.0 / self.dt
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total duration covered by the samples.
    pub fn duration(&self) -> f64 {
        self.time[self.time.len() - 1] - self.time[0]
    }

    /// Largest absolute acceleration and the time at which it occurs.
    pub fn peak(&self) -> (f64, f64) {
        let (idx, value) = argmax_abs(&self.values);
        (value, self.time[idx])
    }

    /// Return a copy extended with zero acceleration for at least `duration` seconds.
    ///
    /// Used to let the oscillators ring down after the end of the record.
    pub fn with_trailing_zeros(&self, duration: f64) -> Result<Self, SsiError> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(SsiError::InvalidSignal(format!(
                "padding duration must be non-negative, got {duration}"
            )));
        }
        let extra = (duration / self.dt).ceil() as usize;
        let mut values = Vec::with_capacity(self.values.len() + extra);
        values.extend_from_slice(&self.values);
        values.resize(self.values.len() + extra, 0.0);
        Self::from_acceleration(self.dt, self.time[0], values)
    }
}

/// Index and value of the largest absolute entry. Returns (0, 0.0) for empty input.
pub(crate) fn argmax_abs(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .enumerate()
        .fold((0, 0.0f64), |(best_idx, best), (idx, &v)| {
            if v.abs() > best {
                (idx, v.abs())
            } else {
                (best_idx, best)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_signal_from_acceleration() {
        let signal = Signal::from_acceleration(0.001, 0.0, vec![0.0; 1000]).unwrap();
        assert_eq!(signal.len(), 1000);
        assert_relative_eq!(signal.sample_rate(), 1000.0, max_relative = 1e-9);
        assert_relative_eq!(signal.duration(), 0.999, max_relative = 1e-9);
    }

    #[test]
    fn test_signal_rejects_length_mismatch() {
        let err = Signal::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, SsiError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_signal_rejects_non_uniform_time() {
        let err = Signal::new(vec![0.0, 0.1, 0.3], vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, SsiError::InvalidSignal(_)));
    }

    #[test]
    fn test_signal_rejects_single_sample() {
        assert!(Signal::new(vec![0.0], vec![1.0]).is_err());
    }

    #[test]
    fn test_signal_peak() {
        let signal = Signal::from_acceleration(0.5, 1.0, vec![0.2, -3.0, 2.5]).unwrap();
        let (peak, t) = signal.peak();
        assert_eq!(peak, 3.0);
        assert_eq!(t, 1.5);
    }

    #[test]
    fn test_trailing_zeros() {
        let signal = Signal::from_acceleration(0.01, 0.0, vec![1.0; 10]).unwrap();
        let padded = signal.with_trailing_zeros(0.05).unwrap();
        assert_eq!(padded.len(), 15);
        assert_eq!(&padded.values()[..10], signal.values());
        assert!(padded.values()[10..].iter().all(|&v| v == 0.0));
        assert_relative_eq!(padded.dt(), 0.01, max_relative = 1e-9);
    }
}
