//! Shock Severity Infimum
//!
//! Singular value decomposition of the absolute response matrix (time-major)
//! and rank-reduced reconstructions of it. A reconstruction from a chosen set
//! of singular triplets is the SSI response matrix for that order; its peak
//! values are compared in dB against the full SRS.

use nalgebra::DMatrix;
use serde::Serialize;
use tracing::debug;

use crate::response::ShockResponseMatrix;
use crate::signal::argmax_abs;
use crate::SsiError;

/// Iteration cap handed to the SVD solver.
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Per-frequency and mean dB margin between two spectra
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    /// 20 log10(full / reduced) per frequency
    pub per_frequency: Vec<f64>,
    /// Mean of `per_frequency`
    pub mean: f64,
}

impl Margin {
    /// Compare a full SRS against a reduced one, frequency by frequency.
    ///
    /// Two zero peaks give 0 dB. A zero reduced peak under a non-zero full peak
    /// gives +inf.
    pub fn between(full: &[f64], reduced: &[f64]) -> Result<Self, SsiError> {
        if full.len() != reduced.len() {
            return Err(SsiError::ShapeMismatch {
                context: "margin spectra",
                expected: full.len(),
                got: reduced.len(),
            });
        }
        let per_frequency: Vec<f64> = full
            .iter()
            .zip(reduced.iter())
            .map(|(&f, &r)| decibel_ratio(f, r))
            .collect();
        let mean = if per_frequency.is_empty() {
            0.0
        } else {
            per_frequency.iter().sum::<f64>() / per_frequency.len() as f64
        };
        Ok(Self {
            per_frequency,
            mean,
        })
    }
}

fn decibel_ratio(full: f64, reduced: f64) -> f64 {
    match (full > 0.0, reduced > 0.0) {
        (false, false) => 0.0,
        (true, false) => f64::INFINITY,
        (false, true) => f64::NEG_INFINITY,
        (true, true) => 20.0 * (full / reduced).log10(),
    }
}

/// A rank-reduced response matrix and its diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct SsiResult {
    /// 1-based singular value indices used
    pub ranks: Vec<usize>,
    /// Reconstructed response, frequency x time
    pub matrix: ShockResponseMatrix,
    /// Share of the total energy (sum of squared singular values) kept
    pub retained_energy: f64,
    /// Energy outside the dominant singular value, see [`SeverityDecomposition::cost_fraction`]
    pub cost_fraction: f64,
    /// dB margin of the full SRS over the SSI
    pub margin: Margin,
}

/// Cached SVD of a shock response matrix
#[derive(Debug, Clone)]
pub struct SeverityDecomposition {
    frequencies: Vec<f64>,
    time: Vec<f64>,
    source_maximax: Vec<f64>,
    /// Left singular vectors, time x rank
    u: DMatrix<f64>,
    /// Right singular vectors, frequency x rank
    v: DMatrix<f64>,
    /// Singular values, descending
    singular_values: Vec<f64>,
}

impl SeverityDecomposition {
    /// Decompose |response| transposed to time x frequency.
    #[tracing::instrument(skip(matrix), fields(frequencies = matrix.n_frequencies(), samples = matrix.n_samples()))]
    pub fn new(matrix: &ShockResponseMatrix) -> Result<Self, SsiError> {
        let values = matrix.values();
        debug_assert_eq!(values.shape(), (matrix.n_frequencies(), matrix.n_samples()));
        if values.is_empty() {
            return Err(SsiError::Decomposition("response matrix is empty".to_string()));
        }

        let time_major = values.abs().transpose();
        let svd = time_major
            .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or_else(|| SsiError::Decomposition("SVD did not converge".to_string()))?;
        let u = svd
            .u
            .ok_or_else(|| SsiError::Decomposition("left singular vectors missing".to_string()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| SsiError::Decomposition("right singular vectors missing".to_string()))?;

        let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
        order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));

        let singular_values: Vec<f64> = order.iter().map(|&i| svd.singular_values[i]).collect();
        let u = DMatrix::from_fn(u.nrows(), order.len(), |r, c| u[(r, order[c])]);
        let v = DMatrix::from_fn(v_t.ncols(), order.len(), |r, c| v_t[(order[c], r)]);

        debug!(
            rank = singular_values.len(),
            sigma_max = singular_values.first().copied().unwrap_or(0.0),
            "response matrix decomposed"
        );

        Ok(Self {
            frequencies: matrix.frequencies().to_vec(),
            time: matrix.time().to_vec(),
            source_maximax: matrix.maximax().to_vec(),
            u,
            v,
            singular_values,
        })
    }

    /// Number of singular triplets available.
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// Singular values in descending order.
    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// SRS of the decomposed matrix.
    pub fn source_maximax(&self) -> &[f64] {
        &self.source_maximax
    }

    /// Squared ratio of the norm of all singular values but the first to the
    /// norm of all of them. Zero for a zero matrix.
    pub fn cost_fraction(&self) -> f64 {
        let total: f64 = self.singular_values.iter().map(|s| s * s).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let tail: f64 = self.singular_values.iter().skip(1).map(|s| s * s).sum();
        (tail / total).clamp(0.0, 1.0)
    }

    /// Energy fraction carried by the selected 1-based ranks.
    pub fn retained_energy(&self, ranks: &[usize]) -> Result<f64, SsiError> {
        self.check_ranks(ranks)?;
        let total: f64 = self.singular_values.iter().map(|s| s * s).sum();
        if total <= 0.0 {
            return Ok(1.0);
        }
        let kept: f64 = ranks
            .iter()
            .map(|&k| self.singular_values[k - 1].powi(2))
            .sum();
        Ok((kept / total).clamp(0.0, 1.0))
    }

    /// Rebuild the response from the selected 1-based singular triplets.
    ///
    /// The result is frequency-major, like the source matrix. Using every rank
    /// reproduces |source|.
    pub fn reconstruct(&self, ranks: &[usize]) -> Result<ShockResponseMatrix, SsiError> {
        self.check_ranks(ranks)?;

        let mut freq_major = DMatrix::<f64>::zeros(self.frequencies.len(), self.time.len());
        for &k in ranks {
            self.accumulate(&mut freq_major, k);
        }

        ShockResponseMatrix::new(self.frequencies.clone(), self.time.clone(), freq_major)
    }

    /// dB margin of the source SRS over the reconstruction from `ranks`.
    pub fn margin(&self, ranks: &[usize]) -> Result<Margin, SsiError> {
        let reduced = self.reconstruct(ranks)?;
        Margin::between(&self.source_maximax, reduced.maximax())
    }

    /// Reconstruction, energy diagnostics and margin for `ranks` together.
    pub fn ssi(&self, ranks: &[usize]) -> Result<SsiResult, SsiError> {
        let matrix = self.reconstruct(ranks)?;
        let margin = Margin::between(&self.source_maximax, matrix.maximax())?;
        Ok(SsiResult {
            ranks: ranks.to_vec(),
            matrix,
            retained_energy: self.retained_energy(ranks)?,
            cost_fraction: self.cost_fraction(),
            margin,
        })
    }

    /// Mean margin for the leading ranks 1..=k, for k from 1 to the full rank.
    ///
    /// Each step adds one rank-1 term to the running reconstruction.
    pub fn margin_sweep(&self) -> Result<Vec<f64>, SsiError> {
        let mut freq_major = DMatrix::<f64>::zeros(self.frequencies.len(), self.time.len());
        let mut sweep = Vec::with_capacity(self.rank());
        for k in 1..=self.rank() {
            self.accumulate(&mut freq_major, k);
            let reduced: Vec<f64> = freq_major
                .row_iter()
                .map(|row| argmax_abs(&row.iter().copied().collect::<Vec<f64>>()).1)
                .collect();
            sweep.push(Margin::between(&self.source_maximax, &reduced)?.mean);
        }
        Ok(sweep)
    }

    /// Add sigma_k v_k u_k^T, the transposed k-th triplet, to a frequency-major matrix.
    fn accumulate(&self, freq_major: &mut DMatrix<f64>, k: usize) {
        let sigma = self.singular_values[k - 1];
        let u_k = self.u.column(k - 1);
        let v_k = self.v.column(k - 1);
        *freq_major += (v_k * u_k.transpose()) * sigma;
    }

    fn check_ranks(&self, ranks: &[usize]) -> Result<(), SsiError> {
        if ranks.is_empty() {
            return Err(SsiError::InvalidRank("at least one rank is required".to_string()));
        }
        for (i, &k) in ranks.iter().enumerate() {
            if k == 0 || k > self.rank() {
                return Err(SsiError::InvalidRank(format!(
                    "rank {k} outside 1..={}",
                    self.rank()
                )));
            }
            if ranks[..i].contains(&k) {
                return Err(SsiError::InvalidRank(format!("rank {k} selected twice")));
            }
        }
        Ok(())
    }
}
