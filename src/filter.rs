//! Oscillator filter coefficients
//!
//! Ramp-invariant recursive filters reproducing the absolute acceleration
//! response of a damped SDOF oscillator to a piecewise-linear base input.
//!
//! ```text
//! y[n] = b1*x[n] + b2*x[n-1] + b3*x[n-2] + a1*y[n-1] + a2*y[n-2]
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::grid::FrequencyGrid;
use crate::params::check_damping;
use crate::SsiError;

/// Coefficients of one oscillator in the bank.
///
/// Feedback terms use the sign convention of the recursion above, so `a1`
/// and `a2` are added, not subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorCoefficients {
    /// Natural frequency (Hz)
    pub frequency: f64,
    pub a1: f64,
    pub a2: f64,
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
}

impl OscillatorCoefficients {
    /// Solve the coefficients for one natural frequency.
    ///
    /// Caller guarantees `0 <= damping_ratio < 1` and `dt > 0`.
    pub fn solve(frequency: f64, damping_ratio: f64, dt: f64) -> Self {
        let omega = 2.0 * PI * frequency;
        let omega_d = omega * (1.0 - damping_ratio * damping_ratio).sqrt();
        let e = (-damping_ratio * omega * dt).exp();
        let k = omega_d * dt;
        let c = e * k.cos();
        let s = e * k.sin();
        let sp = s / k;

        Self {
            frequency,
            a1: 2.0 * c,
            a2: -e * e,
            b1: 1.0 - sp,
            b2: 2.0 * (sp - c),
            b3: e * e - sp,
        }
    }

    /// Run the recursion over `input` from zero initial conditions.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut output = Vec::with_capacity(input.len());
        let (mut x1, mut x2) = (0.0, 0.0);
        let (mut y1, mut y2) = (0.0, 0.0);

        for &x0 in input {
            let y0 = self.b1 * x0 + self.b2 * x1 + self.b3 * x2 + self.a1 * y1 + self.a2 * y2;
            output.push(y0);
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
        }

        output
    }

    /// Single-precision variant of [`apply`](Self::apply).
    pub fn apply_f32(&self, input: &[f32]) -> Vec<f32> {
        let (a1, a2) = (self.a1 as f32, self.a2 as f32);
        let (b1, b2, b3) = (self.b1 as f32, self.b2 as f32, self.b3 as f32);
        let mut output = Vec::with_capacity(input.len());
        let (mut x1, mut x2) = (0.0f32, 0.0f32);
        let (mut y1, mut y2) = (0.0f32, 0.0f32);

        for &x0 in input {
            let y0 = b1 * x0 + b2 * x1 + b3 * x2 + a1 * y1 + a2 * y2;
            output.push(y0);
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
        }

        output
    }

    /// Poles inside the unit circle.
    ///
    /// With denominator 1 - a1*z^-1 - a2*z^-2 this is |a2| < 1 and |a1| < 1 - a2.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 - self.a2
    }
}

/// Coefficients for every oscillator of a frequency grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterBank {
    damping_ratio: f64,
    dt: f64,
    coefficients: Vec<OscillatorCoefficients>,
}

impl FilterBank {
    /// Derive the bank for `grid` at quality factor `quality_factor` and step `dt`.
    pub fn new(grid: &FrequencyGrid, quality_factor: f64, dt: f64) -> Result<Self, SsiError> {
        let damping_ratio = check_damping(quality_factor)?;
        Self::with_damping_ratio(grid, damping_ratio, dt)
    }

    /// Derive the bank from a damping ratio directly (`0 <= zeta < 1`).
    pub fn with_damping_ratio(
        grid: &FrequencyGrid,
        damping_ratio: f64,
        dt: f64,
    ) -> Result<Self, SsiError> {
        if !(damping_ratio.is_finite() && (0.0..1.0).contains(&damping_ratio)) {
            return Err(SsiError::InvalidDamping {
                quality_factor: 1.0 / (2.0 * damping_ratio),
                damping_ratio,
            });
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SsiError::InvalidSignal(format!(
                "time step must be positive, got {dt}"
            )));
        }

        let coefficients = grid
            .frequencies()
            .iter()
            .map(|&f| OscillatorCoefficients::solve(f, damping_ratio, dt))
            .collect();

        Ok(Self {
            damping_ratio,
            dt,
            coefficients,
        })
    }

    pub fn damping_ratio(&self) -> f64 {
        self.damping_ratio
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn coefficients(&self) -> &[OscillatorCoefficients] {
        &self.coefficients
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}
