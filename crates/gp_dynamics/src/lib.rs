//! # GP Dynamics
//!
//! Learned dynamics models for model-based policy search. Given observed
//! transitions `(state, action, target)` the crate fits a model that predicts
//! the target distribution (mean and uncertainty) for any `(state, action)`
//! query.
//!
//! - **Regression Ensemble**: one probabilistic scalar regressor per output
//!   dimension, fit and queried in parallel
//! - **Mean-Function Model**: uncertainty-blind variant fitting one parametric
//!   mean function jointly over all outputs
//! - **Gaussian Process**: the shipped scalar regressor (squared exponential
//!   ARD kernel, Rprop hyperparameter search)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      DYNAMICS MODEL                         │
//! │        learn(transitions) / predict(state ‖ action)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TRAINING DATA LAYER                       │
//! │  ┌──────────────────┐    ┌──────────────────┐               │
//! │  │ ASSEMBLER        │───►│ NORMALIZER       │               │
//! │  │ (samples/targets)│    │ (diagnostics)    │               │
//! │  └──────────────────┘    └──────────────────┘               │
//! │            │  snapshot / text dump                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REGRESSOR LAYER                          │
//! │      one ScalarRegressor per output (rayon fan-out)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use gp_dynamics::prelude::*;
//! use ndarray::array;
//!
//! let config = DynamicsConfig::fast(1, 1, 1);
//! let mut model = RegressionEnsemble::gp(config)?;
//!
//! let transitions: Vec<Transition> = (0..5)
//!     .map(|i| {
//!         let s = i as f64;
//!         Transition::new(vec![s], vec![0.0], vec![0.5 * s])
//!     })
//!     .collect();
//! model.learn(&transitions, false)?;
//!
//! let (mean, variance) = model.predict_full(array![2.5, 0.0].view())?;
//! # Ok::<(), gp_dynamics::DynamicsError>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod ensemble;
pub mod mean_model;
pub mod normalizer;
pub mod opt;
pub mod regressor;
pub mod snapshot;

mod config;
mod error;
mod model;
mod types;

pub use config::{DynamicsConfig, MeanModelConfig};
pub use error::{DynamicsError, DynamicsResult, RegressorError};
pub use model::DynamicsModel;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assembler::{assemble, TrainingSet};
    pub use crate::config::{DynamicsConfig, MeanModelConfig};
    pub use crate::ensemble::RegressionEnsemble;
    pub use crate::error::{DynamicsError, DynamicsResult, RegressorError};
    pub use crate::mean_model::{ConstantMean, LinearMean, MeanFunction, MeanFunctionModel};
    pub use crate::model::DynamicsModel;
    pub use crate::normalizer::{Diagnostics, Normalizer};
    pub use crate::regressor::{
        GaussianProcess, GpConfig, GpFactory, NoiseProfile, RegressorFactory, ScalarRegressor,
    };
    pub use crate::types::{FullPrediction, Prediction, Transition};
}
