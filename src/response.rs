//! Shock response matrix
//!
//! Rows are oscillators (natural frequencies), columns are time samples.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use serde::Serialize;

use crate::grid::FrequencyGrid;
use crate::signal::{argmax_abs, Signal};
use crate::SsiError;

/// Time-resolved response of every oscillator in the bank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShockResponseMatrix {
    frequencies: Vec<f64>,
    time: Vec<f64>,
    #[serde(skip)]
    values: DMatrix<f64>,
    /// Largest absolute response of each oscillator
    maximax: Vec<f64>,
    /// Time at which `maximax` occurs
    t_peak: Vec<f64>,
}

impl ShockResponseMatrix {
    /// Assemble from a frequency-major value matrix.
    ///
    /// `values` must have one row per frequency and one column per time sample.
    /// Both grids must be non-empty and strictly increasing.
    pub fn new(frequencies: Vec<f64>, time: Vec<f64>, values: DMatrix<f64>) -> Result<Self, SsiError> {
        if frequencies.is_empty() {
            return Err(SsiError::ShapeMismatch {
                context: "response matrix frequency grid",
                expected: 1,
                got: 0,
            });
        }
        if time.is_empty() {
            return Err(SsiError::ShapeMismatch {
                context: "response matrix time grid",
                expected: 1,
                got: 0,
            });
        }
        let frequencies = FrequencyGrid::from_frequencies(frequencies)?.into_frequencies();
        if time.iter().any(|t| !t.is_finite()) || time.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(SsiError::InvalidSignal(
                "response time grid must be finite and strictly increasing".to_string(),
            ));
        }

        if values.nrows() != frequencies.len() {
            return Err(SsiError::ShapeMismatch {
                context: "response matrix rows vs frequency grid",
                expected: frequencies.len(),
                got: values.nrows(),
            });
        }
        if values.ncols() != time.len() {
            return Err(SsiError::ShapeMismatch {
                context: "response matrix columns vs time grid",
                expected: time.len(),
                got: values.ncols(),
            });
        }

        let mut maximax = Vec::with_capacity(frequencies.len());
        let mut t_peak = Vec::with_capacity(frequencies.len());
        for row in values.row_iter() {
            let row: Vec<f64> = row.iter().copied().collect();
            let (idx, peak) = argmax_abs(&row);
            maximax.push(peak);
            t_peak.push(time.get(idx).copied().unwrap_or(0.0));
        }

        Ok(Self {
            frequencies,
            time,
            values,
            maximax,
            t_peak,
        })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Response values, frequency x time.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Peak absolute response per frequency (the SRS).
    pub fn maximax(&self) -> &[f64] {
        &self.maximax
    }

    /// Time of peak response per frequency.
    pub fn t_peak(&self) -> &[f64] {
        &self.t_peak
    }

    pub fn n_frequencies(&self) -> usize {
        self.frequencies.len()
    }

    pub fn n_samples(&self) -> usize {
        self.time.len()
    }

    /// Response time history of oscillator `index`.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.frequencies.len() {
            return None;
        }
        Some(self.values.row(index).iter().copied().collect())
    }

    /// Response time history of oscillator `index` as a signal.
    pub fn row_signal(&self, index: usize) -> Result<Signal, SsiError> {
        let row = self.row(index).ok_or(SsiError::ShapeMismatch {
            context: "oscillator index",
            expected: self.frequencies.len(),
            got: index,
        })?;
        Signal::new(self.time.clone(), row)
    }

    /// Index of the grid frequency closest to `frequency`.
    pub fn frequency_index(&self, frequency: f64) -> usize {
        self.frequencies
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |(best_idx, best), (idx, &f)| {
                let d = (f - frequency).abs();
                if d < best {
                    (idx, d)
                } else {
                    (best_idx, best)
                }
            })
            .0
    }

    /// Pseudo-velocity SRS, maximax / (2 pi f).
    pub fn pseudo_velocity(&self) -> Vec<f64> {
        self.frequencies
            .iter()
            .zip(self.maximax.iter())
            .map(|(&f, &a)| a / (2.0 * PI * f))
            .collect()
    }

    /// Largest SRS value, its frequency and its time of occurrence.
    pub fn peak(&self) -> (f64, f64, f64) {
        let (idx, value) = argmax_abs(&self.maximax);
        (value, self.frequencies[idx], self.t_peak[idx])
    }

    /// Element-wise absolute value of the response.
    pub fn abs(&self) -> Self {
        Self {
            frequencies: self.frequencies.clone(),
            time: self.time.clone(),
            values: self.values.abs(),
            maximax: self.maximax.clone(),
            t_peak: self.t_peak.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ShockResponseMatrix {
        let values = DMatrix::from_row_slice(2, 3, &[0.0, -2.0, 1.0, 0.5, 0.25, -0.75]);
        ShockResponseMatrix::new(vec![10.0, 20.0], vec![0.0, 0.1, 0.2], values).unwrap()
    }

    #[test]
    fn test_summaries() {
        let m = sample();
        assert_eq!(m.maximax(), &[2.0, 0.75]);
        assert_eq!(m.t_peak(), &[0.1, 0.2]);
        assert_eq!(m.peak(), (2.0, 10.0, 0.1));
    }

    #[test]
    fn test_shape_mismatch() {
        let values = DMatrix::<f64>::zeros(3, 3);
        let err = ShockResponseMatrix::new(vec![10.0, 20.0], vec![0.0, 0.1, 0.2], values);
        assert!(matches!(err, Err(SsiError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_rejects_empty_grids() {
        let no_rows = ShockResponseMatrix::new(vec![], vec![0.0, 0.1], DMatrix::zeros(0, 2));
        assert!(matches!(no_rows, Err(SsiError::ShapeMismatch { got: 0, .. })));

        let no_cols = ShockResponseMatrix::new(vec![10.0], vec![], DMatrix::zeros(1, 0));
        assert!(matches!(no_cols, Err(SsiError::ShapeMismatch { got: 0, .. })));
    }

    #[test]
    fn test_rejects_unordered_grids() {
        let values = DMatrix::<f64>::zeros(2, 3);
        let unsorted = ShockResponseMatrix::new(vec![20.0, 10.0], vec![0.0, 0.1, 0.2], values.clone());
        assert!(matches!(unsorted, Err(SsiError::InvalidFrequencyRange(_))));

        let duplicate = ShockResponseMatrix::new(vec![10.0, 10.0], vec![0.0, 0.1, 0.2], values.clone());
        assert!(matches!(duplicate, Err(SsiError::InvalidFrequencyRange(_))));

        let repeated_time = ShockResponseMatrix::new(vec![10.0, 20.0], vec![0.0, 0.1, 0.1], values.clone());
        assert!(matches!(repeated_time, Err(SsiError::InvalidSignal(_))));

        let reversed_time = ShockResponseMatrix::new(vec![10.0, 20.0], vec![0.2, 0.1, 0.0], values);
        assert!(matches!(reversed_time, Err(SsiError::InvalidSignal(_))));
    }

    #[test]
    fn test_row_access() {
        let m = sample();
        assert_eq!(m.row(1), Some(vec![0.5, 0.25, -0.75]));
        assert_eq!(m.row(2), None);
        assert_eq!(m.frequency_index(19.0), 1);
    }

    #[test]
    fn test_abs_keeps_summaries() {
        let m = sample().abs();
        assert!(m.values().iter().all(|&v| v >= 0.0));
        assert_eq!(m.maximax(), &[2.0, 0.75]);
    }
}
