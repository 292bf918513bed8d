//! Linear and bilinear interpolation on strictly increasing grids
//!
//! Queries outside the grid follow an [`ExtrapolationPolicy`].
//!
//! Both directions are piecewise linear. For modal frequencies between or
//! beyond oscillator nodes the result therefore differs from a cubic-spline
//! interpolation or extrapolation of the same rows; on a node it is exact.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::SsiError;

/// What to do with a query outside `[grid.first, grid.last]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    /// Fail with `InterpolationOutOfRange`
    Reject,
    /// Extend the edge segment linearly
    #[default]
    Linear,
    /// Hold the edge value
    Clamp,
}

/// Lower node index and weight of the upper node for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bracket {
    lo: usize,
    hi: usize,
    weight: f64,
}

impl Bracket {
    fn blend(&self, lo_value: f64, hi_value: f64) -> f64 {
        if self.weight == 0.0 {
            lo_value
        } else if self.weight == 1.0 {
            hi_value
        } else {
            (1.0 - self.weight) * lo_value + self.weight * hi_value
        }
    }
}

/// Whether `x` lies inside the closed range of `grid`.
pub fn in_range(grid: &[f64], x: f64) -> bool {
    !grid.is_empty() && x >= grid[0] && x <= grid[grid.len() - 1]
}

pub(crate) fn locate(grid: &[f64], x: f64, policy: ExtrapolationPolicy) -> Result<Bracket, SsiError> {
    if grid.is_empty() {
        return Err(SsiError::ShapeMismatch {
            context: "interpolation grid",
            expected: 1,
            got: 0,
        });
    }
    let n = grid.len();
    let (min, max) = (grid[0], grid[n - 1]);
    let outside = !in_range(grid, x);
    if outside && policy == ExtrapolationPolicy::Reject {
        return Err(SsiError::InterpolationOutOfRange { value: x, min, max });
    }
    if n == 1 {
        return Ok(Bracket {
            lo: 0,
            hi: 0,
            weight: 0.0,
        });
    }

    let lo = grid.partition_point(|&g| g <= x).saturating_sub(1).min(n - 2);
    let hi = lo + 1;
    if grid[hi] <= grid[lo] {
        return Err(SsiError::InvalidFrequencyRange(
            "interpolation grid must be strictly increasing".to_string(),
        ));
    }
    let mut weight = (x - grid[lo]) / (grid[hi] - grid[lo]);
    if policy == ExtrapolationPolicy::Clamp {
        weight = weight.clamp(0.0, 1.0);
    }

    Ok(Bracket { lo, hi, weight })
}

/// Piecewise-linear interpolation of `values` sampled on `grid` at `x`.
pub fn interp1(grid: &[f64], values: &[f64], x: f64, policy: ExtrapolationPolicy) -> Result<f64, SsiError> {
    if grid.len() != values.len() {
        return Err(SsiError::ShapeMismatch {
            context: "interpolation grid/values",
            expected: grid.len(),
            got: values.len(),
        });
    }
    let b = locate(grid, x, policy)?;
    Ok(b.blend(values[b.lo], values[b.hi]))
}

/// Bilinear interpolation of `values` (rows on `x_grid`, columns on `y_grid`).
///
/// Returns a matrix of shape (`y_query.len()`, `x_query.len()`).
pub fn interp2(
    x_grid: &[f64],
    y_grid: &[f64],
    values: &DMatrix<f64>,
    x_query: &[f64],
    y_query: &[f64],
    policy: ExtrapolationPolicy,
) -> Result<DMatrix<f64>, SsiError> {
    if values.nrows() != x_grid.len() {
        return Err(SsiError::ShapeMismatch {
            context: "bilinear rows vs x grid",
            expected: x_grid.len(),
            got: values.nrows(),
        });
    }
    if values.ncols() != y_grid.len() {
        return Err(SsiError::ShapeMismatch {
            context: "bilinear columns vs y grid",
            expected: y_grid.len(),
            got: values.ncols(),
        });
    }

    let xb = x_query
        .iter()
        .map(|&x| locate(x_grid, x, policy))
        .collect::<Result<Vec<_>, _>>()?;
    let yb = y_query
        .iter()
        .map(|&y| locate(y_grid, y, policy))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DMatrix::from_fn(y_query.len(), x_query.len(), |j, i| {
        let (bx, by) = (xb[i], yb[j]);
        let lo = by.blend(values[(bx.lo, by.lo)], values[(bx.lo, by.hi)]);
        let hi = by.blend(values[(bx.hi, by.lo)], values[(bx.hi, by.hi)]);
        bx.blend(lo, hi)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_interp1_nodes_and_midpoints() {
        let grid = [1.0, 2.0, 4.0];
        let values = [10.0, 20.0, 0.0];
        let p = ExtrapolationPolicy::Reject;
        assert_eq!(interp1(&grid, &values, 1.0, p).unwrap(), 10.0);
        assert_eq!(interp1(&grid, &values, 4.0, p).unwrap(), 0.0);
        assert_abs_diff_eq!(interp1(&grid, &values, 1.5, p).unwrap(), 15.0, epsilon = 1e-12);
        assert_abs_diff_eq!(interp1(&grid, &values, 3.0, p).unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_interp1_policies() {
        let grid = [1.0, 2.0];
        let values = [0.0, 1.0];
        assert!(matches!(
            interp1(&grid, &values, 3.0, ExtrapolationPolicy::Reject),
            Err(SsiError::InterpolationOutOfRange { .. })
        ));
        assert_abs_diff_eq!(
            interp1(&grid, &values, 3.0, ExtrapolationPolicy::Linear).unwrap(),
            2.0,
            epsilon = 1e-12
        );
        assert_eq!(interp1(&grid, &values, 3.0, ExtrapolationPolicy::Clamp).unwrap(), 1.0);
        assert_eq!(interp1(&grid, &values, 0.0, ExtrapolationPolicy::Clamp).unwrap(), 0.0);
    }

    #[test]
    fn test_repeated_node_is_rejected() {
        let values = [0.0, 1.0, 5.0];
        assert!(matches!(
            interp1(&[1.0, 2.0, 2.0], &values, 3.0, ExtrapolationPolicy::Linear),
            Err(SsiError::InvalidFrequencyRange(_))
        ));
        assert!(matches!(
            interp1(&[2.0, 2.0, 3.0], &values, 1.0, ExtrapolationPolicy::Clamp),
            Err(SsiError::InvalidFrequencyRange(_))
        ));
    }

    #[test]
    fn test_interp2_exact_on_nodes() {
        let x = [1.0, 2.0, 3.0];
        let y = [0.0, 0.5];
        let values = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = interp2(&x, &y, &values, &[2.0], &y, ExtrapolationPolicy::Reject).unwrap();
        assert_eq!(out.shape(), (2, 1));
        assert_eq!(out[(0, 0)], 3.0);
        assert_eq!(out[(1, 0)], 4.0);
    }

    #[test]
    fn test_interp2_center() {
        let x = [0.0, 1.0];
        let y = [0.0, 1.0];
        let values = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 2.0, 3.0]);
        let out = interp2(&x, &y, &values, &[0.5], &[0.5], ExtrapolationPolicy::Reject).unwrap();
        assert_abs_diff_eq!(out[(0, 0)], 1.5, epsilon = 1e-12);
    }
}
