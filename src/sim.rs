//! Synthetic shock inputs
//!
//! Deterministic classical pulses with optional seeded background noise, used
//! by the report binary, the demo, and tests.

use std::f64::consts::PI;

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::signal::Signal;
use crate::SsiError;

/// Classical pulse shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PulseShape {
    /// A sin(pi t / T) for 0 <= t < T
    HalfSine,
    /// A (1 - cos(2 pi t / T)) / 2 for 0 <= t < T
    Haversine,
    /// A exp(-2 pi f zeta t) sin(2 pi f t) for t >= 0
    DecayingSine { frequency_hz: f64, damping_ratio: f64 },
    /// A single sample of amplitude A at the pulse start
    Impulse,
}

/// Shock generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockConfig {
    pub shape: PulseShape,
    /// Sample rate (Hz)
    pub sample_rate: f64,
    /// Record length (s)
    pub duration: f64,
    /// Pulse start time (s)
    pub delay: f64,
    /// Pulse width T (s), ignored by `Impulse` and `DecayingSine`
    pub pulse_width: f64,
    /// Peak amplitude A
    pub amplitude: f64,
    /// Standard deviation of additive Gaussian noise
    pub sigma_noise: f64,
    pub seed: u64,
}

impl Default for ShockConfig {
    fn default() -> Self {
        Self {
            shape: PulseShape::HalfSine,
            sample_rate: 10_000.0,
            duration: 0.5,
            delay: 0.01,
            pulse_width: 0.011,
            amplitude: 100.0,
            sigma_noise: 0.0,
            seed: 42,
        }
    }
}

impl ShockConfig {
    pub fn validate(&self) -> Result<(), SsiError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(SsiError::InvalidConfig(
                "sample_rate must be positive".to_string(),
            ));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(SsiError::InvalidConfig("duration must be positive".to_string()));
        }
        if self.steps() < 2 {
            return Err(SsiError::InvalidConfig(
                "duration must cover at least two samples".to_string(),
            ));
        }
        if !(self.delay.is_finite() && self.delay >= 0.0) {
            return Err(SsiError::InvalidConfig("delay must be non-negative".to_string()));
        }
        if matches!(self.shape, PulseShape::HalfSine | PulseShape::Haversine)
            && !(self.pulse_width.is_finite() && self.pulse_width > 0.0)
        {
            return Err(SsiError::InvalidConfig(
                "pulse_width must be positive".to_string(),
            ));
        }
        if let PulseShape::DecayingSine {
            frequency_hz,
            damping_ratio,
        } = self.shape
        {
            if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
                return Err(SsiError::InvalidConfig(
                    "decaying sine frequency must be positive".to_string(),
                ));
            }
            if !(damping_ratio.is_finite() && damping_ratio >= 0.0) {
                return Err(SsiError::InvalidConfig(
                    "decaying sine damping must be non-negative".to_string(),
                ));
            }
        }
        if !(self.amplitude.is_finite() && self.sigma_noise.is_finite() && self.sigma_noise >= 0.0) {
            return Err(SsiError::InvalidConfig(
                "amplitude and sigma_noise must be finite, sigma_noise non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of samples in the record
    pub fn steps(&self) -> usize {
        (self.duration * self.sample_rate).round() as usize
    }

    pub fn dt(&self) -> f64 {
        1.0 / self.sample_rate
    }
}

/// Generate the shock described by `config`.
pub fn generate_shock(config: &ShockConfig) -> Result<Signal, SsiError> {
    config.validate()?;

    let dt = config.dt();
    let start = (config.delay / dt).round() as usize;
    let mut values: Vec<f64> = (0..config.steps())
        .map(|step| {
            if step < start {
                return 0.0;
            }
            let t = (step - start) as f64 * dt;
            pulse_value(config, t, step == start)
        })
        .collect();

    if config.sigma_noise > 0.0 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
        let noise = Normal::new(0.0, config.sigma_noise)
            .map_err(|e| SsiError::InvalidConfig(format!("noise distribution: {e}")))?;
        for v in values.iter_mut() {
            *v += noise.sample(&mut rng);
        }
    }

    Signal::from_acceleration(dt, 0.0, values)
}

fn pulse_value(config: &ShockConfig, t: f64, first: bool) -> f64 {
    let a = config.amplitude;
    let width = config.pulse_width;
    match config.shape {
        PulseShape::HalfSine if t < width => a * (PI * t / width).sin(),
        PulseShape::Haversine if t < width => a * 0.5 * (1.0 - (2.0 * PI * t / width).cos()),
        PulseShape::DecayingSine {
            frequency_hz,
            damping_ratio,
        } => {
            let w = 2.0 * PI * frequency_hz;
            a * (-damping_ratio * w * t).exp() * (w * t).sin()
        }
        PulseShape::Impulse if first => a,
        _ => 0.0,
    }
}

/// Unit sample at t = 0 followed by zeros.
pub fn unit_impulse(samples: usize, dt: f64) -> Result<Signal, SsiError> {
    let mut values = vec![0.0; samples];
    if let Some(first) = values.first_mut() {
        *first = 1.0;
    }
    Signal::from_acceleration(dt, 0.0, values)
}

/// Root mean square of `values`; zero for an empty slice.
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|&v| v * v).sum();
    (sum_sq / values.len() as f64).sqrt()
}
