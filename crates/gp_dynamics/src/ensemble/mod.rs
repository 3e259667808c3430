//! # Regression Ensemble
//!
//! One independent scalar regressor per output dimension.
//!
//! ```text
//!   transitions ──► assemble ──► TrainingSet ──► Normalizer ──► Diagnostics
//!                                    │
//!                     ┌──────────────┼──────────────┐      (rayon fan-out)
//!                     ▼              ▼              ▼
//!                 regressor 0    regressor 1 ...  regressor D_t-1
//!                     │              │              │
//!                     └──────────────┼──────────────┘      (barrier)
//!                                    ▼
//!                          commit all or nothing
//! ```
//!
//! Queries fan out the same way and gather `(mean, variance)` per dimension.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gp_dynamics::prelude::*;
//! use ndarray::array;
//!
//! let config = DynamicsConfig::fast(1, 1, 1);
//! let mut model = RegressionEnsemble::gp(config).unwrap();
//!
//! let transitions = vec![
//!     Transition::new(vec![0.0], vec![0.0], vec![0.0]),
//!     Transition::new(vec![1.0], vec![0.0], vec![1.0]),
//!     Transition::new(vec![2.0], vec![0.0], vec![2.0]),
//! ];
//! model.learn(&transitions, false).unwrap();
//!
//! let (mean, uncertainty) = model.predict(array![1.5, 0.0].view()).unwrap();
//! ```

use crate::assembler::{assemble, to_matrix, TrainingSet};
use crate::config::DynamicsConfig;
use crate::error::{DynamicsError, DynamicsResult};
use crate::model::DynamicsModel;
use crate::normalizer::{Diagnostics, Normalizer};
use crate::regressor::{GpFactory, NoiseProfile, RegressorFactory, ScalarRegressor};
use crate::snapshot::{read_snapshot, write_snapshot, write_text_dump};
use crate::types::{FullPrediction, Prediction, Transition};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Committed result of a successful fit
#[derive(Debug, Clone)]
struct Fitted<R> {
    regressors: Vec<R>,
    targets: Array2<f64>,
}

/// Multi-output probabilistic regression model
pub struct RegressionEnsemble<F: RegressorFactory> {
    config: DynamicsConfig,
    factory: F,
    fitted: Option<Fitted<F::Regressor>>,
    diagnostics: Option<Diagnostics>,
}

impl RegressionEnsemble<GpFactory> {
    /// Ensemble of Gaussian processes configured by `config.gp`
    pub fn gp(config: DynamicsConfig) -> DynamicsResult<Self> {
        let factory = GpFactory::new(config.gp.clone());
        Self::new(config, factory)
    }
}

impl<F: RegressorFactory> RegressionEnsemble<F> {
    /// Create an unfitted ensemble whose regressors come from `factory`
    pub fn new(config: DynamicsConfig, factory: F) -> DynamicsResult<Self> {
        config.validate().map_err(DynamicsError::InvalidConfig)?;
        Ok(Self {
            config,
            factory,
            fitted: None,
            diagnostics: None,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    /// Number of output dimensions
    pub fn output_dim(&self) -> usize {
        self.config.pred_dim
    }

    /// `true` once a full `learn` has succeeded
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Diagnostics from the most recent `learn`
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    /// Robust per-input magnitude limits from the most recent `learn`
    pub fn limits(&self) -> Option<&Array1<f64>> {
        self.diagnostics.as_ref().map(|d| &d.limits)
    }

    /// Fitted regressors, one per output dimension
    pub fn regressors(&self) -> DynamicsResult<&[F::Regressor]> {
        Ok(&self.fitted()?.regressors)
    }

    /// Training inputs as seen by the first regressor
    pub fn samples(&self) -> DynamicsResult<Array2<f64>> {
        let fitted = self.fitted()?;
        let samples = fitted
            .regressors
            .first()
            .map_or(&[][..], |r| r.samples());
        Ok(to_matrix(samples, self.config.input_dim()))
    }

    /// Training targets, one column per output dimension
    pub fn targets(&self) -> DynamicsResult<&Array2<f64>> {
        Ok(&self.fitted()?.targets)
    }

    /// Log-space hyperparameters of every regressor
    pub fn hyperparameters(&self) -> DynamicsResult<Vec<Array1<f64>>> {
        Ok(self
            .fitted()?
            .regressors
            .iter()
            .map(|r| r.hyperparameters())
            .collect())
    }

    /// Fit on `transitions`.
    ///
    /// With `only_limits` set, only the diagnostics are refreshed. Otherwise
    /// every output dimension is refit from scratch. On error the previous fit
    /// is kept.
    ///
    /// The training data is persisted only when
    /// [`DynamicsConfig::snapshot_path`] is set, which it is not by default.
    /// Use [`DynamicsConfig::with_snapshot_path`] to turn it on.
    pub fn learn(&mut self, transitions: &[Transition], only_limits: bool) -> DynamicsResult<()> {
        let training = assemble(transitions)?;
        self.check_dimensions(&training)?;

        if only_limits {
            let diagnostics = Normalizer::compute(&training.sample_matrix());
            debug!(samples = training.len(), "Refreshed input limits");
            self.diagnostics = Some(diagnostics);
            return Ok(());
        }

        if let Some(path) = &self.config.snapshot_path {
            write_snapshot(path, &training.to_data_matrix())?;
            debug!(path = %path.display(), rows = training.len(), "Wrote training snapshot");
        }

        self.fit(training)
    }

    /// Refit from a snapshot written by an earlier `learn`, using at most
    /// `limit` rows
    pub fn learn_from_snapshot(
        &mut self,
        path: impl AsRef<Path>,
        limit: Option<usize>,
    ) -> DynamicsResult<()> {
        let data = read_snapshot(path.as_ref())?;
        let training = TrainingSet::from_data_matrix(&data, self.config.input_dim(), limit)?;
        info!(
            path = %path.as_ref().display(),
            rows = training.len(),
            available = data.nrows(),
            "Loaded training snapshot"
        );
        self.fit(training)
    }

    /// Fit every output dimension on `training` in parallel and commit the
    /// result only if all of them succeed
    pub fn fit(&mut self, training: TrainingSet) -> DynamicsResult<()> {
        self.check_dimensions(&training)?;
        let diagnostics = Normalizer::compute(&training.sample_matrix());

        let input_dim = training.input_dim();
        let noise = vec![self.config.gp.noise; training.len()];
        let factory = &self.factory;

        let regressors = (0..training.output_dim())
            .into_par_iter()
            .map(|dimension| {
                let mut regressor = factory.create(input_dim, dimension);
                let targets = training.target_column(dimension);
                let noise = match regressor.noise_profile() {
                    NoiseProfile::PerSample => Some(noise.as_slice()),
                    NoiseProfile::Ignored => None,
                };
                regressor
                    .fit(&training.samples, &targets, noise)
                    .and_then(|_| regressor.optimize_hyperparameters())
                    .map(|_| regressor)
                    .map_err(|cause| DynamicsError::FitFailure { dimension, cause })
            })
            .collect::<DynamicsResult<Vec<_>>>()?;

        info!(
            samples = training.len(),
            dimensions = regressors.len(),
            "Dynamics ensemble fitted"
        );
        for (dimension, regressor) in regressors.iter().enumerate() {
            debug!(
                dimension,
                hyperparameters = ?regressor.natural_hyperparameters().to_vec(),
                "Regressor hyperparameters"
            );
        }

        self.fitted = Some(Fitted {
            regressors,
            targets: training.targets,
        });
        self.diagnostics = Some(diagnostics);
        Ok(())
    }

    /// Mean vector and the arithmetic mean of the per-dimension variances
    pub fn predict(&self, x: ArrayView1<f64>) -> DynamicsResult<Prediction> {
        let (mean, variance) = self.predict_full(x)?;
        let uncertainty = variance.mean().unwrap_or(0.0);
        Ok((mean, uncertainty))
    }

    /// Mean vector and one variance per output dimension
    pub fn predict_full(&self, x: ArrayView1<f64>) -> DynamicsResult<FullPrediction> {
        let fitted = self.fitted()?;
        if x.len() != self.config.input_dim() {
            return Err(DynamicsError::DimensionMismatch {
                field: "query",
                index: 0,
                expected: self.config.input_dim(),
                found: x.len(),
            });
        }

        let (mean, variance): (Vec<f64>, Vec<f64>) =
            fitted.regressors.par_iter().map(|r| r.query(x)).unzip();
        Ok((Array1::from(mean), Array1::from(variance)))
    }

    /// Write the training samples and targets as a text dump
    pub fn save(&self, path: impl AsRef<Path>) -> DynamicsResult<()> {
        let fitted = self.fitted()?;
        let samples = fitted
            .regressors
            .first()
            .map_or(&[][..], |r| r.samples());
        write_text_dump(path, samples, &fitted.targets)
    }

    fn fitted(&self) -> DynamicsResult<&Fitted<F::Regressor>> {
        self.fitted.as_ref().ok_or(DynamicsError::NotFitted)
    }

    fn check_dimensions(&self, training: &TrainingSet) -> DynamicsResult<()> {
        let input_dim = self.config.input_dim();
        if let Some((index, sample)) = training
            .samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.len() != input_dim)
        {
            return Err(DynamicsError::DimensionMismatch {
                field: "sample",
                index,
                expected: input_dim,
                found: sample.len(),
            });
        }
        if training.targets.nrows() != training.len() {
            return Err(DynamicsError::DimensionMismatch {
                field: "target rows",
                index: 0,
                expected: training.len(),
                found: training.targets.nrows(),
            });
        }
        if training.output_dim() != self.config.pred_dim {
            return Err(DynamicsError::DimensionMismatch {
                field: "target",
                index: 0,
                expected: self.config.pred_dim,
                found: training.output_dim(),
            });
        }
        Ok(())
    }
}

impl<F: RegressorFactory> DynamicsModel for RegressionEnsemble<F> {
    fn learn(&mut self, transitions: &[Transition], only_limits: bool) -> DynamicsResult<()> {
        RegressionEnsemble::learn(self, transitions, only_limits)
    }

    fn predict(&self, x: ArrayView1<f64>) -> DynamicsResult<Prediction> {
        RegressionEnsemble::predict(self, x)
    }

    fn predict_full(&self, x: ArrayView1<f64>) -> DynamicsResult<FullPrediction> {
        RegressionEnsemble::predict_full(self, x)
    }

    fn save(&self, path: &Path) -> DynamicsResult<()> {
        RegressionEnsemble::save(self, path)
    }

    fn is_fitted(&self) -> bool {
        RegressionEnsemble::is_fitted(self)
    }
}
