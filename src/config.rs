//! Analysis configuration
//!
//! TOML-loadable settings for the SRS engine, SSI orders, modal table and the
//! synthetic shock driving the report binary.

use serde::{Deserialize, Serialize};

use crate::engine::FilterBackend;
use crate::interp::ExtrapolationPolicy;
use crate::mdof::{ModalInfo, Mode};
use crate::params::{check_damping, SrsParams};
use crate::sim::ShockConfig;
use crate::SsiError;

/// Analysis configuration, usually read from TOML.
///
/// ```toml
/// start_frequency_hz = 10.0
/// quality_factor = 10.0
/// backend = "parallel"
/// ranks = [1, 2, 3]
/// extrapolation = "linear"
///
/// [shock]
/// shape = { kind = "half_sine" }
/// sample_rate = 10000.0
///
/// [[modes]]
/// frequency_hz = 120.0
/// participation = 1.2
/// mode_shape = 0.8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub start_frequency_hz: f64,
    pub quality_factor: f64,
    pub backend: FilterBackend,
    /// 1-based SSI orders to report; each entry keeps ranks 1..=k
    pub ranks: Vec<usize>,
    pub extrapolation: ExtrapolationPolicy,
    pub modes: Vec<Mode>,
    pub shock: ShockConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_frequency_hz: 10.0,
            quality_factor: 10.0,
            backend: FilterBackend::Parallel,
            ranks: vec![1, 2, 3],
            extrapolation: ExtrapolationPolicy::Linear,
            modes: Vec::new(),
            shock: ShockConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, SsiError> {
        let config: AnalysisConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SsiError> {
        if !(self.start_frequency_hz.is_finite() && self.start_frequency_hz > 0.0) {
            return Err(SsiError::InvalidConfig(
                "start_frequency_hz must be positive".to_string(),
            ));
        }

        check_damping(self.quality_factor).map_err(|_| {
            SsiError::InvalidConfig(format!(
                "quality_factor must be greater than 0.5, got {}",
                self.quality_factor
            ))
        })?;

        if self.ranks.iter().any(|&k| k == 0) {
            return Err(SsiError::InvalidConfig(
                "ranks must contain only values greater than zero".to_string(),
            ));
        }

        if !self.modes.is_empty() {
            ModalInfo::new(self.modes.clone())
                .map_err(|e| SsiError::InvalidConfig(e.to_string()))?;
        }

        self.shock.validate()?;

        if self.start_frequency_hz >= self.shock.sample_rate / 8.0 {
            return Err(SsiError::InvalidConfig(format!(
                "start_frequency_hz must be below sample_rate/8 = {}",
                self.shock.sample_rate / 8.0
            )));
        }

        Ok(())
    }

    pub fn srs_params(&self) -> SrsParams {
        SrsParams::new(self.start_frequency_hz, self.quality_factor)
    }

    /// Modal table, if any modes are configured.
    pub fn modal_info(&self) -> Result<Option<ModalInfo>, SsiError> {
        if self.modes.is_empty() {
            return Ok(None);
        }
        ModalInfo::new(self.modes.clone()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PulseShape;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let raw = r#"
            start_frequency_hz = 20.0
            quality_factor = 25.0
            backend = "single_precision"
            ranks = [1, 4]
            extrapolation = "reject"

            [shock]
            shape = { kind = "decaying_sine", frequency_hz = 300.0, damping_ratio = 0.02 }
            sample_rate = 20000.0
            duration = 0.25

            [[modes]]
            frequency_hz = 150.0
            participation = 1.1
            mode_shape = -0.4
        "#;
        let config = AnalysisConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.backend, FilterBackend::SinglePrecision);
        assert_eq!(config.extrapolation, ExtrapolationPolicy::Reject);
        assert_eq!(config.ranks, vec![1, 4]);
        assert_eq!(config.modes.len(), 1);
        assert_eq!(config.shock.sample_rate, 20_000.0);
        assert_eq!(config.shock.pulse_width, ShockConfig::default().pulse_width);
        assert!(matches!(config.shock.shape, PulseShape::DecayingSine { .. }));
        assert_eq!(config.modal_info().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_q = AnalysisConfig {
            quality_factor: 0.4,
            ..Default::default()
        };
        assert!(matches!(bad_q.validate(), Err(SsiError::InvalidConfig(_))));

        let bad_rank = AnalysisConfig {
            ranks: vec![0],
            ..Default::default()
        };
        assert!(bad_rank.validate().is_err());

        let bad_start = AnalysisConfig {
            start_frequency_hz: 5_000.0,
            ..Default::default()
        };
        assert!(bad_start.validate().is_err());

        assert!(matches!(
            AnalysisConfig::from_toml_str("quality_factor = \"high\""),
            Err(SsiError::Toml(_))
        ));
    }
}
