//! Natural frequency grid
//!
//! Twelfth-octave geometric progression from min(start, sr/30) up to the first
//! value above sr/8.

use serde::{Deserialize, Serialize};

use crate::SsiError;

/// Ratio between adjacent grid frequencies (1/12 octave).
pub const TWELFTH_OCTAVE: f64 = 1.059_463_094_359_295_3;

/// Strictly increasing bank of natural frequencies (Hz)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyGrid {
    frequencies: Vec<f64>,
}

impl FrequencyGrid {
    /// Build the grid for a starting frequency and sample rate.
    ///
    /// The first value is clamped to `sample_rate / 30`. Generation stops after
    /// the first value exceeding `sample_rate / 8`, which is kept.
    pub fn build(start_frequency: f64, sample_rate: f64) -> Result<Self, SsiError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(SsiError::InvalidFrequencyRange(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if !(start_frequency.is_finite() && start_frequency > 0.0) {
            return Err(SsiError::InvalidFrequencyRange(format!(
                "starting frequency must be positive, got {start_frequency}"
            )));
        }
        let upper = sample_rate / 8.0;
        if start_frequency >= upper {
            return Err(SsiError::InvalidFrequencyRange(format!(
                "starting frequency {start_frequency} Hz must be below sample_rate/8 = {upper} Hz"
            )));
        }

        let f0 = start_frequency.min(sample_rate / 30.0);
        let mut frequencies = Vec::new();
        let mut j = 0i32;
        loop {
            let f = f0 * 2f64.powf(j as f64 / 12.0);
            frequencies.push(f);
            if f > upper {
                break;
            }
            j += 1;
        }

        Ok(Self { frequencies })
    }

    /// Wrap an explicit list of frequencies.
    ///
    /// The list must be non-empty, finite, positive and strictly increasing.
    pub fn from_frequencies(frequencies: Vec<f64>) -> Result<Self, SsiError> {
        if frequencies.is_empty() {
            return Err(SsiError::InvalidFrequencyRange(
                "frequency grid is empty".to_string(),
            ));
        }
        if frequencies.iter().any(|f| !(f.is_finite() && *f > 0.0)) {
            return Err(SsiError::InvalidFrequencyRange(
                "frequencies must be positive and finite".to_string(),
            ));
        }
        if frequencies.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(SsiError::InvalidFrequencyRange(
                "frequencies must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { frequencies })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn into_frequencies(self) -> Vec<f64> {
        self.frequencies
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.frequencies[0]
    }

    pub fn max(&self) -> f64 {
        self.frequencies[self.frequencies.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_grid_clamps_to_sr_over_30() {
        let grid = FrequencyGrid::build(100.0, 1000.0).unwrap();
        assert_relative_eq!(grid.min(), 1000.0 / 30.0, max_relative = 1e-12);
        assert!(grid.max() > 125.0);
        assert!(grid.frequencies()[grid.len() - 2] <= 125.0);
    }

    #[test]
    fn test_grid_unclamped_start() {
        let grid = FrequencyGrid::build(10.0, 10_000.0).unwrap();
        assert_eq!(grid.min(), 10.0);
    }

    #[test]
    fn test_grid_rejects_high_start() {
        assert!(FrequencyGrid::build(125.0, 1000.0).is_err());
        assert!(FrequencyGrid::build(-1.0, 1000.0).is_err());
    }

    #[test]
    fn test_from_frequencies_rejects_unsorted() {
        assert!(FrequencyGrid::from_frequencies(vec![10.0, 5.0]).is_err());
        assert!(FrequencyGrid::from_frequencies(vec![]).is_err());
        assert!(FrequencyGrid::from_frequencies(vec![5.0, 10.0]).is_ok());
    }

    proptest! {
        #[test]
        fn grid_is_twelfth_octave(start in 0.5f64..200.0, sr in 2_000.0f64..50_000.0) {
            let grid = FrequencyGrid::build(start, sr).unwrap();
            let f = grid.frequencies();
            prop_assert!(!f.is_empty());
            prop_assert!(f[0] <= sr / 30.0 + 1e-9);
            for pair in f.windows(2) {
                prop_assert!(pair[1] > pair[0]);
                prop_assert!((pair[1] / pair[0] - TWELFTH_OCTAVE).abs() < 1e-9);
            }
            prop_assert!(grid.max() > sr / 8.0);
        }
    }
}
