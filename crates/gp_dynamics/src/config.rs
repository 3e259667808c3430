//! Global dynamics model configuration

use crate::opt::NelderMeadConfig;
use crate::regressor::GpConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for [`MeanFunctionModel`](crate::mean_model::MeanFunctionModel)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeanModelConfig {
    /// Simplex settings for the joint squared-error fit
    pub nelder_mead: NelderMeadConfig,
}

impl MeanModelConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.nelder_mead.validate()
    }
}

/// Configuration shared by both dynamics model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicsConfig {
    /// Length of the state vector
    pub state_dim: usize,

    /// Length of the action vector
    pub action_dim: usize,

    /// Number of predicted outputs (one regressor each)
    pub pred_dim: usize,

    /// Where `learn` writes the binary training snapshot (`None` disables it)
    pub snapshot_path: Option<PathBuf>,

    /// Gaussian-process regressor settings
    pub gp: GpConfig,

    /// Mean-function model settings
    pub mean_model: MeanModelConfig,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            state_dim: 1,
            action_dim: 1,
            pred_dim: 1,
            snapshot_path: None,
            gp: GpConfig::default(),
            mean_model: MeanModelConfig::default(),
        }
    }
}

impl DynamicsConfig {
    /// Default settings for the given dimensions
    pub fn new(state_dim: usize, action_dim: usize, pred_dim: usize) -> Self {
        Self {
            state_dim,
            action_dim,
            pred_dim,
            ..Self::default()
        }
    }

    /// Cheap fitting for inner loops and tests
    pub fn fast(state_dim: usize, action_dim: usize, pred_dim: usize) -> Self {
        Self {
            gp: GpConfig::fast(),
            ..Self::new(state_dim, action_dim, pred_dim)
        }
    }

    /// Expensive offline fitting
    pub fn thorough(state_dim: usize, action_dim: usize, pred_dim: usize) -> Self {
        Self {
            gp: GpConfig::thorough(),
            mean_model: MeanModelConfig {
                nelder_mead: NelderMeadConfig {
                    max_iterations: 20_000,
                    ..NelderMeadConfig::default()
                },
            },
            ..Self::new(state_dim, action_dim, pred_dim)
        }
    }

    /// Set the snapshot path
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Regression input length (`state_dim + action_dim`)
    pub fn input_dim(&self) -> usize {
        self.state_dim + self.action_dim
    }

    /// Load configuration from TOML
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.input_dim() == 0 {
            return Err("state_dim + action_dim must be > 0".to_string());
        }
        if self.pred_dim == 0 {
            return Err("pred_dim must be > 0".to_string());
        }
        self.gp.validate()?;
        self.mean_model.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regressor::NoiseProfile;

    #[test]
    fn test_default_config() {
        let config = DynamicsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input_dim(), 2);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_presets() {
        let fast = DynamicsConfig::fast(4, 1, 4);
        let thorough = DynamicsConfig::thorough(4, 1, 4);
        assert!(fast.validate().is_ok());
        assert!(thorough.validate().is_ok());
        assert_eq!(fast.input_dim(), 5);
        assert!(fast.gp.restarts < thorough.gp.restarts);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = DynamicsConfig::fast(3, 2, 3).with_snapshot_path("/tmp/model.bin");
        config.gp.noise_profile = NoiseProfile::Ignored;

        let toml = config.to_toml().unwrap();
        let parsed = DynamicsConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed.state_dim, 3);
        assert_eq!(parsed.action_dim, 2);
        assert_eq!(parsed.snapshot_path, config.snapshot_path);
        assert_eq!(parsed.gp.noise_profile, NoiseProfile::Ignored);
        assert_eq!(parsed.gp.rprop.iterations, config.gp.rprop.iterations);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(DynamicsConfig::new(0, 0, 1).validate().is_err());
        assert!(DynamicsConfig::new(1, 0, 0).validate().is_err());
        assert!(DynamicsConfig::new(1, 0, 1).validate().is_ok());

        let mut config = DynamicsConfig::default();
        config.gp.noise = f64::NAN;
        assert!(config.validate().is_err());
    }
}
