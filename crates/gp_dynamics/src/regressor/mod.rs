//! # Scalar Regressors
//!
//! The single-output regression capability the ensemble fans out to.
//!
//! A [`ScalarRegressor`] is fit on input vectors and scalar targets (with
//! optional per-sample noise), optimizes its own hyperparameters and answers
//! `(mean, variance)` queries. A [`RegressorFactory`] builds fresh instances;
//! the ensemble is generic over the factory, so the back-end is chosen once
//! when the ensemble is constructed.
//!
//! The crate ships [`GaussianProcess`] (built by [`GpFactory`]): squared
//! exponential ARD kernel, data-mean prior, hyperparameters fit by maximizing
//! the log marginal likelihood with Rprop and seeded random restarts.
//!
//! ## Noise profiles
//!
//! - [`NoiseProfile::PerSample`]: the supplied per-sample noise is added to the
//!   covariance diagonal on top of the learned kernel noise
//! - [`NoiseProfile::Ignored`]: any supplied noise is dropped; only the learned
//!   kernel noise is used

mod config;
mod gp;
mod kernel;
pub mod linalg;

pub use config::{GpConfig, NoiseProfile};
pub use gp::{GaussianProcess, GpFactory};
pub use kernel::SquaredExpArd;

use crate::error::RegressorError;
use ndarray::{Array1, ArrayView1};

/// A single-output probabilistic regressor
pub trait ScalarRegressor: Send + Sync {
    /// Fit on `samples` and `targets` (same length).
    ///
    /// `noise`, when given, holds one noise variance per sample. Regressors
    /// whose [`noise_profile`](Self::noise_profile) is `Ignored` drop it.
    fn fit(
        &mut self,
        samples: &[Array1<f64>],
        targets: &[f64],
        noise: Option<&[f64]>,
    ) -> Result<(), RegressorError>;

    /// Optimize hyperparameters against the data given to the last `fit`
    fn optimize_hyperparameters(&mut self) -> Result<(), RegressorError>;

    /// Predictive `(mean, variance)` at `x`
    fn query(&self, x: ArrayView1<f64>) -> (f64, f64);

    /// Training inputs from the last `fit`
    fn samples(&self) -> &[Array1<f64>];

    /// Current kernel hyperparameters in log space, laid out as
    /// `[log l_1, .., log l_D, log sf, log sn]`
    fn hyperparameters(&self) -> Array1<f64>;

    /// The same hyperparameters in natural space: length scales, then the
    /// signal and noise variances
    fn natural_hyperparameters(&self) -> Array1<f64>;

    /// How this regressor treats supplied per-sample noise
    fn noise_profile(&self) -> NoiseProfile;
}

/// Builds fresh regressors for the ensemble
pub trait RegressorFactory: Send + Sync {
    /// Regressor type produced by this factory
    type Regressor: ScalarRegressor;

    /// Create an unfitted regressor for `input_dim`-dimensional inputs that
    /// will model output dimension `dimension`
    fn create(&self, input_dim: usize, dimension: usize) -> Self::Regressor;
}
