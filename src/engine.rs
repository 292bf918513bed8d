//! Response matrix engine
//!
//! Filters the input signal through every oscillator of the bank. Rows are
//! independent, so the map over frequencies can run in parallel and is joined
//! once when the matrix is assembled.

use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::filter::FilterBank;
use crate::grid::FrequencyGrid;
use crate::params::SrsParams;
use crate::response::ShockResponseMatrix;
use crate::signal::Signal;
use crate::SsiError;

/// Execution strategy for the per-frequency filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterBackend {
    /// One row after another on the calling thread
    Serial,
    /// Rows filtered on the rayon thread pool
    #[default]
    Parallel,
    /// Batched f32 recursion on the rayon thread pool
    SinglePrecision,
}

/// Computes shock response matrices for a fixed set of SRS parameters
#[derive(Debug, Clone)]
pub struct ResponseMatrixEngine {
    params: SrsParams,
    backend: FilterBackend,
}

impl ResponseMatrixEngine {
    /// Create an engine using the serial backend
    pub fn new(params: SrsParams) -> Self {
        Self {
            params,
            backend: FilterBackend::Serial,
        }
    }

    /// Select the filtering backend
    pub fn with_backend(mut self, backend: FilterBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn params(&self) -> &SrsParams {
        &self.params
    }

    pub fn backend(&self) -> FilterBackend {
        self.backend
    }

    /// Build the grid and filter bank for `signal` and compute its response matrix.
    #[tracing::instrument(skip(self, signal), fields(samples = signal.len(), backend = ?self.backend))]
    pub fn compute(&self, signal: &Signal) -> Result<ShockResponseMatrix, SsiError> {
        let sample_rate = signal.sample_rate();
        self.params.validate(sample_rate)?;

        let grid = FrequencyGrid::build(self.params.start_frequency, sample_rate)?;
        let bank = FilterBank::new(&grid, self.params.quality_factor, signal.dt())?;
        debug!(
            oscillators = grid.len(),
            f_min = grid.min(),
            f_max = grid.max(),
            zeta = bank.damping_ratio(),
            "filter bank ready"
        );

        // One period of the lowest oscillator is the bare minimum for a peak to develop.
        if signal.duration() < 1.0 / grid.min() {
            warn!(
                duration = signal.duration(),
                lowest_period = 1.0 / grid.min(),
                "signal shorter than one period of the lowest oscillator; SRS is unreliable"
            );
        }

        self.apply_bank(&bank, signal)
    }

    /// Filter `signal` through an existing bank.
    pub fn apply_bank(&self, bank: &FilterBank, signal: &Signal) -> Result<ShockResponseMatrix, SsiError> {
        if (bank.dt() - signal.dt()).abs() > 1e-9 * signal.dt() {
            return Err(SsiError::InvalidSignal(format!(
                "filter bank time step {} does not match signal time step {}",
                bank.dt(),
                signal.dt()
            )));
        }

        let rows = filter_rows(bank, signal.values(), self.backend);
        let values = assemble(&rows, signal.len());
        let frequencies = bank.coefficients().iter().map(|c| c.frequency).collect();

        ShockResponseMatrix::new(frequencies, signal.time().to_vec(), values)
    }
}

fn filter_rows(bank: &FilterBank, input: &[f64], backend: FilterBackend) -> Vec<Vec<f64>> {
    let coefficients = bank.coefficients();
    match backend {
        FilterBackend::Serial => coefficients.iter().map(|c| c.apply(input)).collect(),
        FilterBackend::Parallel => coefficients.par_iter().map(|c| c.apply(input)).collect(),
        FilterBackend::SinglePrecision => {
            let input32: Vec<f32> = input.iter().map(|&v| v as f32).collect();
            coefficients
                .par_iter()
                .map(|c| c.apply_f32(&input32).into_iter().map(f64::from).collect())
                .collect()
        }
    }
}

fn assemble(rows: &[Vec<f64>], n_samples: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), n_samples, |i, j| rows[i][j])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn half_sine(n: usize, width: usize) -> Signal {
        let values = (0..n)
            .map(|i| {
                if i < width {
                    (std::f64::consts::PI * i as f64 / width as f64).sin()
                } else {
                    0.0
                }
            })
            .collect();
        Signal::from_acceleration(1e-3, 0.0, values).unwrap()
    }

    #[test]
    fn test_matrix_shape() {
        let signal = half_sine(1000, 11);
        let engine = ResponseMatrixEngine::new(SrsParams::new(10.0, 10.0));
        let m = engine.compute(&signal).unwrap();
        let grid = FrequencyGrid::build(10.0, 1000.0).unwrap();
        assert_eq!(m.n_frequencies(), grid.len());
        assert_eq!(m.n_samples(), signal.len());
        assert!(m.maximax().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_backends_agree() {
        let signal = half_sine(800, 11);
        let params = SrsParams::new(20.0, 10.0);
        let serial = ResponseMatrixEngine::new(params).compute(&signal).unwrap();
        let parallel = ResponseMatrixEngine::new(params)
            .with_backend(FilterBackend::Parallel)
            .compute(&signal)
            .unwrap();
        let single = ResponseMatrixEngine::new(params)
            .with_backend(FilterBackend::SinglePrecision)
            .compute(&signal)
            .unwrap();

        assert_eq!(serial.values(), parallel.values());
        for (a, b) in serial.values().iter().zip(single.values().iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_rejects_high_start_frequency() {
        let signal = half_sine(100, 5);
        let err = ResponseMatrixEngine::new(SrsParams::new(200.0, 10.0))
            .compute(&signal)
            .unwrap_err();
        assert!(matches!(err, SsiError::InvalidFrequencyRange(_)));
    }

    #[test]
    fn test_bank_dt_mismatch() {
        let signal = half_sine(100, 5);
        let grid = FrequencyGrid::build(10.0, 500.0).unwrap();
        let bank = FilterBank::new(&grid, 10.0, 2e-3).unwrap();
        let engine = ResponseMatrixEngine::new(SrsParams::default());
        assert!(engine.apply_bank(&bank, &signal).is_err());
    }
}
