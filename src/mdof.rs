//! Multi-mode structural response from a shock response matrix
//!
//! Each mode contributes the response of the oscillator at its natural
//! frequency, weighted by participation factor times mode shape. Rows of the
//! response matrix are interpolated onto the modal frequencies.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::interp::{in_range, interp1, interp2, ExtrapolationPolicy};
use crate::response::ShockResponseMatrix;
use crate::severity::SeverityDecomposition;
use crate::signal::{argmax_abs, Signal};
use crate::SsiError;

/// One structural mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    /// Natural frequency (Hz)
    pub frequency_hz: f64,
    /// Modal participation factor
    pub participation: f64,
    /// Mode shape value at the point of interest
    pub mode_shape: f64,
}

impl Mode {
    pub fn new(frequency_hz: f64, participation: f64, mode_shape: f64) -> Self {
        Self {
            frequency_hz,
            participation,
            mode_shape,
        }
    }

    /// participation * mode shape
    pub fn weight(&self) -> f64 {
        self.participation * self.mode_shape
    }
}

/// Modal table of a structure. Order is not significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalInfo {
    modes: Vec<Mode>,
}

impl ModalInfo {
    pub fn new(modes: Vec<Mode>) -> Result<Self, SsiError> {
        if modes.is_empty() {
            return Err(SsiError::InvalidModalInfo("no modes given".to_string()));
        }
        for (i, mode) in modes.iter().enumerate() {
            if !(mode.frequency_hz.is_finite() && mode.frequency_hz > 0.0) {
                return Err(SsiError::InvalidModalInfo(format!(
                    "mode {i}: natural frequency must be positive, got {}",
                    mode.frequency_hz
                )));
            }
            if !(mode.participation.is_finite() && mode.mode_shape.is_finite()) {
                return Err(SsiError::InvalidModalInfo(format!(
                    "mode {i}: participation and mode shape must be finite"
                )));
            }
        }
        Ok(Self { modes })
    }

    /// Build from (frequency, participation, mode shape) rows.
    pub fn from_rows(rows: &[[f64; 3]]) -> Result<Self, SsiError> {
        Self::new(rows.iter().map(|r| Mode::new(r[0], r[1], r[2])).collect())
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.modes.iter().map(|m| m.frequency_hz).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.modes.iter().map(Mode::weight).collect()
    }
}

/// Estimated response of a structure to the shock
#[derive(Debug, Clone, Serialize)]
pub struct StructuralResponse {
    /// Signed modal combination of the interpolated response
    pub signed: Signal,
    /// Absolute combination of the interpolated |response|
    pub unsigned: Signal,
    /// Peak of `signed`
    pub signed_peak: f64,
    /// Peak of `unsigned`
    pub unsigned_peak: f64,
    /// Sum over modes of SRS(f_m) * |weight_m|
    pub srs_bound: f64,
    /// Sum over modes of rank-1 SSI(f_m) * |weight_m|
    pub ssi_bound: f64,
}

/// Interpolated modal responses, time x modes.
pub fn modal_responses(
    matrix: &ShockResponseMatrix,
    modes: &ModalInfo,
    policy: ExtrapolationPolicy,
) -> Result<DMatrix<f64>, SsiError> {
    interp2(
        matrix.frequencies(),
        matrix.time(),
        matrix.values(),
        &modes.frequencies(),
        matrix.time(),
        policy,
    )
}

/// Estimate the structural response of `modes` to the shock behind `matrix`.
///
/// `matrix` may be the full response or an SSI reconstruction.
#[tracing::instrument(skip(matrix, modes), fields(modes = modes.len()))]
pub fn estimate_structural_response(
    matrix: &ShockResponseMatrix,
    modes: &ModalInfo,
    policy: ExtrapolationPolicy,
) -> Result<StructuralResponse, SsiError> {
    let grid = matrix.frequencies();
    if matrix.values().shape() != (grid.len(), matrix.time().len()) {
        return Err(SsiError::ShapeMismatch {
            context: "structural response input",
            expected: grid.len(),
            got: matrix.values().nrows(),
        });
    }

    let frequencies = modes.frequencies();
    for &f in &frequencies {
        if !in_range(grid, f) {
            if policy == ExtrapolationPolicy::Reject {
                return Err(SsiError::InterpolationOutOfRange {
                    value: f,
                    min: grid[0],
                    max: grid[grid.len() - 1],
                });
            }
            warn!(frequency = f, ?policy, "modal frequency outside the oscillator grid");
        }
    }

    let weights = modes.weights();
    let abs_weights: Vec<f64> = weights.iter().map(|w| w.abs()).collect();

    let signed_modal = modal_responses(matrix, modes, policy)?;
    let abs_matrix = matrix.abs();
    // Linear extrapolation of a magnitude can cross zero; magnitudes stay >= 0.
    let unsigned_modal = interp2(
        grid,
        matrix.time(),
        abs_matrix.values(),
        &frequencies,
        matrix.time(),
        policy,
    )?
    .map(|v| v.max(0.0));

    let signed_values = combine(&signed_modal, &weights);
    let unsigned_values = combine(&unsigned_modal, &abs_weights);
    let signed_peak = argmax_abs(&signed_values).1;
    let unsigned_peak = argmax_abs(&unsigned_values).1;

    let srs_bound = scalar_bound(grid, matrix.maximax(), &frequencies, &abs_weights, policy)?;

    let rank_one = SeverityDecomposition::new(matrix)?.reconstruct(&[1])?;
    let ssi_bound = scalar_bound(grid, rank_one.maximax(), &frequencies, &abs_weights, policy)?;

    debug!(signed_peak, unsigned_peak, srs_bound, ssi_bound, "structural response estimated");

    Ok(StructuralResponse {
        signed: Signal::new(matrix.time().to_vec(), signed_values)?,
        unsigned: Signal::new(matrix.time().to_vec(), unsigned_values)?,
        signed_peak,
        unsigned_peak,
        srs_bound,
        ssi_bound,
    })
}

fn combine(modal: &DMatrix<f64>, weights: &[f64]) -> Vec<f64> {
    modal
        .row_iter()
        .map(|row| row.iter().zip(weights.iter()).map(|(r, w)| r * w).sum::<f64>())
        .collect()
}

fn scalar_bound(
    grid: &[f64],
    spectrum: &[f64],
    frequencies: &[f64],
    abs_weights: &[f64],
    policy: ExtrapolationPolicy,
) -> Result<f64, SsiError> {
    frequencies
        .iter()
        .zip(abs_weights.iter())
        .map(|(&f, &w)| interp1(grid, spectrum, f, policy).map(|s| s.max(0.0) * w))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn response() -> ShockResponseMatrix {
        let frequencies = vec![10.0, 20.0, 40.0];
        let time: Vec<f64> = (0..50).map(|j| j as f64 * 0.002).collect();
        let values = DMatrix::from_fn(3, 50, |i, j| {
            let f = frequencies[i];
            let t = time[j];
            (2.0 * std::f64::consts::PI * f * t).sin() * (1.0 + i as f64)
        });
        ShockResponseMatrix::new(frequencies, time, values).unwrap()
    }

    #[test]
    fn test_modal_info_validation() {
        assert!(ModalInfo::new(vec![]).is_err());
        assert!(ModalInfo::from_rows(&[[-1.0, 1.0, 1.0]]).is_err());
        assert!(ModalInfo::from_rows(&[[10.0, f64::NAN, 1.0]]).is_err());
        let info = ModalInfo::from_rows(&[[20.0, 0.5, 2.0]]).unwrap();
        assert_eq!(info.weights(), vec![1.0]);
    }

    #[test]
    fn test_single_mode_on_node() {
        let m = response();
        let modes = ModalInfo::from_rows(&[[20.0, 1.0, 1.0]]).unwrap();
        let est = estimate_structural_response(&m, &modes, ExtrapolationPolicy::Reject).unwrap();
        let row = m.row(1).unwrap();
        for (a, b) in est.signed.values().iter().zip(row.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
        for (a, b) in est.unsigned.values().iter().zip(row.iter()) {
            assert_abs_diff_eq!(*a, b.abs(), epsilon = 1e-12);
        }
        assert_abs_diff_eq!(est.srs_bound, m.maximax()[1], epsilon = 1e-12);
        assert_abs_diff_eq!(est.signed_peak, m.maximax()[1], epsilon = 1e-12);
    }

    #[test]
    fn test_unsigned_dominates_signed() {
        let m = response();
        let modes = ModalInfo::from_rows(&[[15.0, 1.0, 1.0], [30.0, -0.5, 1.2]]).unwrap();
        let est = estimate_structural_response(&m, &modes, ExtrapolationPolicy::Reject).unwrap();
        assert!(est.unsigned_peak + 1e-12 >= est.signed_peak);
        assert!(est.srs_bound + 1e-12 >= est.unsigned_peak);
    }

    #[test]
    fn test_out_of_range_policies() {
        let m = response();
        let modes = ModalInfo::from_rows(&[[80.0, 1.0, 1.0]]).unwrap();
        let err = estimate_structural_response(&m, &modes, ExtrapolationPolicy::Reject).unwrap_err();
        assert!(matches!(err, SsiError::InterpolationOutOfRange { .. }));

        let clamped = estimate_structural_response(&m, &modes, ExtrapolationPolicy::Clamp).unwrap();
        assert_abs_diff_eq!(clamped.srs_bound, m.maximax()[2], epsilon = 1e-12);
        assert!(estimate_structural_response(&m, &modes, ExtrapolationPolicy::Linear).is_ok());
    }

    #[test]
    fn test_extrapolated_bounds_stay_non_negative() {
        let peaks = [0.1, 5.0, 6.0];
        let time: Vec<f64> = (0..20).map(|j| j as f64 * 0.01).collect();
        let values = DMatrix::from_fn(3, 20, |i, j| if j % 2 == 0 { peaks[i] } else { -peaks[i] });
        let m = ShockResponseMatrix::new(vec![10.0, 20.0, 40.0], time, values).unwrap();
        let modes = ModalInfo::from_rows(&[[2.0, 1.0, 1.0]]).unwrap();

        let est = estimate_structural_response(&m, &modes, ExtrapolationPolicy::default()).unwrap();
        assert!(est.unsigned.values().iter().all(|&v| v >= 0.0));
        assert!(est.srs_bound >= 0.0);
        assert!(est.ssi_bound >= 0.0);
        assert!(est.srs_bound + 1e-12 >= est.unsigned_peak);
    }
}
