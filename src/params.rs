//! SRS parameters
//!
//! Starting frequency and quality factor shared by the whole oscillator bank.

use serde::{Deserialize, Serialize};

use crate::SsiError;

/// Parameters for a shock response computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SrsParams {
    /// Lowest requested natural frequency (Hz)
    pub start_frequency: f64,
    /// Quality factor Q = 1 / (2 zeta)
    pub quality_factor: f64,
}

impl SrsParams {
    /// Create new SRS parameters
    pub fn new(start_frequency: f64, quality_factor: f64) -> Self {
        Self {
            start_frequency,
            quality_factor,
        }
    }

    /// Damping ratio zeta = 1 / (2Q)
    pub fn damping_ratio(&self) -> f64 {
        1.0 / (2.0 * self.quality_factor)
    }

    /// Check the parameters against a sample rate.
    ///
    /// The starting frequency must be positive and below `sample_rate / 8`, and
    /// the quality factor must give an underdamped oscillator (Q > 0.5).
    pub fn validate(&self, sample_rate: f64) -> Result<(), SsiError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(SsiError::InvalidFrequencyRange(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if !(self.start_frequency.is_finite() && self.start_frequency > 0.0) {
            return Err(SsiError::InvalidFrequencyRange(format!(
                "starting frequency must be positive, got {}",
                self.start_frequency
            )));
        }
        if self.start_frequency >= sample_rate / 8.0 {
            return Err(SsiError::InvalidFrequencyRange(format!(
                "starting frequency {} Hz must be below sample_rate/8 = {} Hz",
                self.start_frequency,
                sample_rate / 8.0
            )));
        }
        check_damping(self.quality_factor)?;
        Ok(())
    }
}

/// Validate a quality factor and return its damping ratio.
pub(crate) fn check_damping(quality_factor: f64) -> Result<f64, SsiError> {
    let damping_ratio = 1.0 / (2.0 * quality_factor);
    if !(quality_factor.is_finite() && quality_factor > 0.5) {
        return Err(SsiError::InvalidDamping {
            quality_factor,
            damping_ratio,
        });
    }
    Ok(damping_ratio)
}

impl Default for SrsParams {
    fn default() -> Self {
        Self {
            start_frequency: 10.0,
            quality_factor: 10.0,
        }
    }
}
