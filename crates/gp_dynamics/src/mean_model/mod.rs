//! # Mean-Function Model
//!
//! Uncertainty-blind alternative to the regression ensemble. A single
//! [`MeanFunction`] maps a sample to every output dimension at once and is
//! fit by minimizing the squared error over all samples and dimensions
//! jointly. Predictions always carry zero uncertainty, so this model must
//! not feed algorithms that need calibrated variance.
//!
//! Hyperparameters are warm-started from the previous fit on every `learn`.

mod mean_function;

pub use mean_function::{ConstantMean, LinearMean, MeanFunction};

use crate::assembler::assemble;
use crate::config::DynamicsConfig;
use crate::error::{DynamicsError, DynamicsResult, RegressorError};
use crate::model::DynamicsModel;
use crate::normalizer::{Diagnostics, Normalizer};
use crate::opt::{Evaluation, NelderMead, Optimizer};
use crate::snapshot::write_text_dump;
use crate::types::{FullPrediction, Prediction, Transition};
use ndarray::{Array1, Array2, ArrayView1};
use std::path::Path;
use tracing::{debug, info};

/// Dynamics model backed by one parametric mean function
pub struct MeanFunctionModel<M: MeanFunction = LinearMean, O: Optimizer = NelderMead> {
    config: DynamicsConfig,
    optimizer: O,
    mean: Option<M>,
    samples: Vec<Array1<f64>>,
    targets: Array2<f64>,
    diagnostics: Option<Diagnostics>,
}

impl<M: MeanFunction> MeanFunctionModel<M, NelderMead> {
    /// Create an unfitted model using Nelder-Mead with `config.mean_model` settings
    pub fn new(config: DynamicsConfig) -> DynamicsResult<Self> {
        let optimizer = NelderMead::new(config.mean_model.nelder_mead.clone());
        Self::with_optimizer(config, optimizer)
    }
}

impl<M: MeanFunction, O: Optimizer> MeanFunctionModel<M, O> {
    /// Create an unfitted model with a custom optimizer
    pub fn with_optimizer(config: DynamicsConfig, optimizer: O) -> DynamicsResult<Self> {
        config.validate().map_err(DynamicsError::InvalidConfig)?;
        let targets = Array2::zeros((0, config.pred_dim));
        Ok(Self {
            config,
            optimizer,
            mean: None,
            samples: Vec::new(),
            targets,
            diagnostics: None,
        })
    }

    /// `true` once a full `learn` has succeeded
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Fitted mean function
    pub fn mean_function(&self) -> Option<&M> {
        self.mean.as_ref()
    }

    /// Diagnostics from the most recent `learn`
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    /// Robust per-input magnitude limits from the most recent `learn`
    pub fn limits(&self) -> Option<&Array1<f64>> {
        self.diagnostics.as_ref().map(|d| &d.limits)
    }

    /// Hyperparameters of the fitted mean function
    pub fn hyperparameters(&self) -> DynamicsResult<Array1<f64>> {
        Ok(self.fitted()?.h_params())
    }

    /// Fit the mean function on `transitions`.
    ///
    /// With `only_limits` set, only the diagnostics are refreshed.
    pub fn learn(&mut self, transitions: &[Transition], only_limits: bool) -> DynamicsResult<()> {
        let training = assemble(transitions)?;
        if training.input_dim() != self.config.input_dim() {
            return Err(DynamicsError::DimensionMismatch {
                field: "sample",
                index: 0,
                expected: self.config.input_dim(),
                found: training.input_dim(),
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

        let diagnostics = Normalizer::compute(&training.sample_matrix());
        if only_limits {
            self.diagnostics = Some(diagnostics);
            return Ok(());
        }

        let mut mean = self
            .mean
            .clone()
            .unwrap_or_else(|| M::new(training.input_dim(), training.output_dim()));
        let start = mean.h_params();

        let objective = |p: &Array1<f64>| {
            let mut candidate = mean.clone();
            candidate.set_h_params(p);
            Evaluation::no_grad(-squared_error(&candidate, &training.samples, &training.targets))
        };
        let optimum = self.optimizer.maximize(objective, &start, None);

        if !optimum.value.is_finite() {
            return Err(DynamicsError::FitFailure {
                dimension: 0,
                cause: RegressorError::OptimizationDiverged(
                    "squared error is not finite".to_string(),
                ),
            });
        }

        mean.set_h_params(&optimum.params);
        info!(
            samples = training.len(),
            sse = -optimum.value,
            "Mean function fitted"
        );
        debug!(hyperparameters = ?optimum.params.to_vec(), "Mean function hyperparameters");

        self.mean = Some(mean);
        self.samples = training.samples;
        self.targets = training.targets;
        self.diagnostics = Some(diagnostics);
        Ok(())
    }

    /// Mean function output with zero uncertainty
    pub fn predict(&self, x: ArrayView1<f64>) -> DynamicsResult<Prediction> {
        Ok((self.evaluate(x)?, 0.0))
    }

    /// Mean function output with a zero variance per output dimension
    pub fn predict_full(&self, x: ArrayView1<f64>) -> DynamicsResult<FullPrediction> {
        let mean = self.evaluate(x)?;
        let variance = Array1::zeros(mean.len());
        Ok((mean, variance))
    }

    /// Write the training samples and targets as a text dump
    pub fn save(&self, path: impl AsRef<Path>) -> DynamicsResult<()> {
        self.fitted()?;
        write_text_dump(path, &self.samples, &self.targets)
    }

    fn fitted(&self) -> DynamicsResult<&M> {
        self.mean.as_ref().ok_or(DynamicsError::NotFitted)
    }

    fn evaluate(&self, x: ArrayView1<f64>) -> DynamicsResult<Array1<f64>> {
        let mean = self.fitted()?;
        if x.len() != self.config.input_dim() {
            return Err(DynamicsError::DimensionMismatch {
                field: "query",
                index: 0,
                expected: self.config.input_dim(),
                found: x.len(),
            });
        }
        Ok(mean.evaluate(x))
    }
}

impl<M: MeanFunction, O: Optimizer> DynamicsModel for MeanFunctionModel<M, O> {
    fn learn(&mut self, transitions: &[Transition], only_limits: bool) -> DynamicsResult<()> {
        MeanFunctionModel::learn(self, transitions, only_limits)
    }

    fn predict(&self, x: ArrayView1<f64>) -> DynamicsResult<Prediction> {
        MeanFunctionModel::predict(self, x)
    }

    fn predict_full(&self, x: ArrayView1<f64>) -> DynamicsResult<FullPrediction> {
        MeanFunctionModel::predict_full(self, x)
    }

    fn save(&self, path: &Path) -> DynamicsResult<()> {
        MeanFunctionModel::save(self, path)
    }

    fn is_fitted(&self) -> bool {
        MeanFunctionModel::is_fitted(self)
    }
}

/// Sum of squared errors over every sample and output dimension
fn squared_error<M: MeanFunction>(mean: &M, samples: &[Array1<f64>], targets: &Array2<f64>) -> f64 {
    samples
        .iter()
        .zip(targets.rows())
        .map(|(x, y)| {
            let residual = mean.evaluate(x.view()) - &y;
            residual.dot(&residual)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn affine(n: usize) -> Vec<Transition> {
        (0..n)
            .map(|i| {
                let s = i as f64 * 0.5;
                let a = (i % 3) as f64 - 1.0;
                Transition::new(vec![s], vec![a], vec![2.0 * s - a + 0.5])
            })
            .collect()
    }

    #[test]
    fn test_recovers_affine_map() {
        let mut model: MeanFunctionModel = MeanFunctionModel::new(DynamicsConfig::new(1, 1, 1)).unwrap();
        model.learn(&affine(8), false).unwrap();

        let p = model.hyperparameters().unwrap();
        assert!((p[0] - 2.0).abs() < 1e-3, "{:?}", p);
        assert!((p[1] + 1.0).abs() < 1e-3, "{:?}", p);
        assert!((p[2] - 0.5).abs() < 1e-3, "{:?}", p);

        let (mean, uncertainty) = model.predict(array![1.0, 0.0].view()).unwrap();
        assert!((mean[0] - 2.5).abs() < 1e-3);
        assert_eq!(uncertainty, 0.0);
    }

    #[test]
    fn test_constant_mean_fits_column_means() {
        let mut model: MeanFunctionModel<ConstantMean> =
            MeanFunctionModel::new(DynamicsConfig::new(1, 0, 2)).unwrap();
        let transitions = vec![
            Transition::new(vec![0.0], vec![], vec![1.0, 10.0]),
            Transition::new(vec![1.0], vec![], vec![3.0, 30.0]),
        ];
        model.learn(&transitions, false).unwrap();

        let (mean, variance) = model.predict_full(array![5.0].view()).unwrap();
        assert!((mean[0] - 2.0).abs() < 1e-3);
        assert!((mean[1] - 20.0).abs() < 1e-3);
        assert_eq!(variance, array![0.0, 0.0]);
    }

    #[test]
    fn test_non_finite_error_keeps_previous_fit() {
        let mut model: MeanFunctionModel = MeanFunctionModel::new(DynamicsConfig::new(1, 1, 1)).unwrap();
        model.learn(&affine(6), false).unwrap();
        let before = model.hyperparameters().unwrap();

        let mut bad = affine(6);
        bad[2] = Transition::new(vec![1.0], vec![0.0], vec![f64::NAN]);
        assert!(matches!(
            model.learn(&bad, false),
            Err(DynamicsError::FitFailure { dimension: 0, .. })
        ));
        assert_eq!(model.hyperparameters().unwrap(), before);
    }

    #[test]
    fn test_only_limits_keeps_fit() {
        let mut model: MeanFunctionModel = MeanFunctionModel::new(DynamicsConfig::new(1, 1, 1)).unwrap();
        model.learn(&affine(6), false).unwrap();
        let before = model.hyperparameters().unwrap();

        let wide: Vec<Transition> = (0..4)
            .map(|i| Transition::new(vec![100.0 * i as f64], vec![0.0], vec![0.0]))
            .collect();
        model.learn(&wide, true).unwrap();

        assert_eq!(model.hyperparameters().unwrap(), before);
        assert!(model.limits().unwrap()[0] > 100.0);
    }

    #[test]
    fn test_not_fitted() {
        let model: MeanFunctionModel = MeanFunctionModel::new(DynamicsConfig::new(1, 1, 1)).unwrap();
        assert!(matches!(
            model.predict(array![0.0, 0.0].view()),
            Err(DynamicsError::NotFitted)
        ));
        assert!(matches!(
            model.save(Path::new("unused.txt")),
            Err(DynamicsError::NotFitted)
        ));
    }
}
