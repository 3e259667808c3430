//! Gaussian-process regressor configuration

use crate::opt::RpropConfig;
use serde::{Deserialize, Serialize};

/// How a regressor treats per-sample noise supplied to `fit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseProfile {
    /// Supplied noise is added to the covariance diagonal
    PerSample,
    /// Supplied noise is ignored; only the learned kernel noise applies
    Ignored,
}

/// Configuration for [`GaussianProcess`](super::GaussianProcess)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpConfig {
    /// Noise handling profile
    pub noise_profile: NoiseProfile,

    /// Uniform per-sample noise variance passed to `PerSample` regressors
    pub noise: f64,

    /// Random restarts in addition to the start from the current hyperparameters
    pub restarts: usize,

    /// Seed for restart sampling (combined with the output dimension)
    pub seed: u64,

    /// Bounds applied to every log-space hyperparameter
    pub log_bounds: (f64, f64),

    /// Initial log standard deviation of the learned kernel noise
    pub initial_log_noise: f64,

    /// Rprop settings for log marginal likelihood maximization
    pub rprop: RpropConfig,
}

impl Default for GpConfig {
    fn default() -> Self {
        Self {
            noise_profile: NoiseProfile::PerSample,
            noise: 0.01,
            restarts: 2,
            seed: 42,
            log_bounds: (-6.0, 6.0),
            initial_log_noise: -2.0,
            rprop: RpropConfig::default(),
        }
    }
}

impl GpConfig {
    /// Cheap settings for tight inner loops
    pub fn fast() -> Self {
        Self {
            restarts: 0,
            rprop: RpropConfig {
                iterations: 100,
                ..RpropConfig::default()
            },
            ..Self::default()
        }
    }

    /// Expensive settings for offline fitting
    pub fn thorough() -> Self {
        Self {
            restarts: 8,
            rprop: RpropConfig {
                iterations: 1000,
                ..RpropConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err("gp.noise must be finite and >= 0".to_string());
        }
        let (lo, hi) = self.log_bounds;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err("gp.log_bounds must be finite with lower < upper".to_string());
        }
        if self.initial_log_noise < lo || self.initial_log_noise > hi {
            return Err("gp.initial_log_noise must lie within gp.log_bounds".to_string());
        }
        self.rprop.validate()
    }
}
