//! SSI - Shock Severity Infimum
//!
//! Computes the Shock Response Spectrum (SRS) of an acceleration time history
//! through a bank of single-degree-of-freedom oscillators, decomposes the full
//! time-frequency response matrix by SVD into a rank-reduced Shock Severity
//! Infimum, and estimates the response of a multi-mode structure from either.

pub mod config;
pub mod engine;
pub mod filter;
pub mod grid;
pub mod interp;
pub mod mdof;
pub mod params;
pub mod response;
pub mod severity;
pub mod signal;
pub mod sim;

use thiserror::Error;

// Re-export main types
pub use config::AnalysisConfig;
pub use engine::{FilterBackend, ResponseMatrixEngine};
pub use filter::{FilterBank, OscillatorCoefficients};
pub use grid::FrequencyGrid;
pub use interp::ExtrapolationPolicy;
pub use mdof::{estimate_structural_response, ModalInfo, Mode, StructuralResponse};
pub use params::SrsParams;
pub use response::ShockResponseMatrix;
pub use severity::{Margin, SeverityDecomposition, SsiResult};
pub use signal::Signal;

#[derive(Debug, Error)]
pub enum SsiError {
    #[error("invalid frequency range: {0}")]
    InvalidFrequencyRange(String),
    #[error("invalid damping: quality factor {quality_factor} gives damping ratio {damping_ratio} (must be < 1)")]
    InvalidDamping {
        quality_factor: f64,
        damping_ratio: f64,
    },
    #[error("{context} shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{value} outside interpolation range [{min}, {max}]")]
    InterpolationOutOfRange { value: f64, min: f64, max: f64 },
    #[error("invalid signal: {0}")]
    InvalidSignal(String),
    #[error("invalid rank selection: {0}")]
    InvalidRank(String),
    #[error("invalid modal information: {0}")]
    InvalidModalInfo(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("decomposition failed: {0}")]
    Decomposition(String),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Compute the full shock response matrix of `signal` in one call.
///
/// Shorthand for validating `params`, building the grid and filter bank, and
/// running the serial engine.
pub fn shock_response(signal: &Signal, params: &SrsParams) -> Result<ShockResponseMatrix, SsiError> {
    ResponseMatrixEngine::new(*params).compute(signal)
}
