//! Gaussian-process regressor

use super::config::{GpConfig, NoiseProfile};
use super::kernel::SquaredExpArd;
use super::linalg::CholeskyFactor;
use super::{RegressorFactory, ScalarRegressor};
use crate::error::RegressorError;
use crate::opt::{Evaluation, Optimizer, Rprop};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use tracing::{debug, trace};

/// Added to the covariance diagonal to keep the factorization stable
const JITTER: f64 = 1e-10;

/// Half-width of the box around the start point that restarts are drawn from
const RESTART_SPREAD: f64 = 1.5;

/// Builds [`GaussianProcess`] regressors from one shared [`GpConfig`]
#[derive(Debug, Clone, Default)]
pub struct GpFactory {
    config: GpConfig,
}

impl GpFactory {
    /// Create a new factory
    pub fn new(config: GpConfig) -> Self {
        Self { config }
    }

    /// Configuration handed to every regressor
    pub fn config(&self) -> &GpConfig {
        &self.config
    }
}

impl RegressorFactory for GpFactory {
    type Regressor = GaussianProcess;

    fn create(&self, input_dim: usize, dimension: usize) -> GaussianProcess {
        GaussianProcess::new(input_dim, dimension, self.config.clone())
    }
}

/// Posterior state computed from the data and the current hyperparameters
#[derive(Debug, Clone)]
struct Posterior {
    /// Cholesky factor of the training covariance
    factor: CholeskyFactor,
    /// `K^{-1} (y - m)`
    alpha: Array1<f64>,
}

/// Single-output Gaussian process with a data-mean prior
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    config: GpConfig,
    dimension: usize,
    kernel: SquaredExpArd,
    samples: Vec<Array1<f64>>,
    targets: Array1<f64>,
    sample_noise: Option<Array1<f64>>,
    prior_mean: f64,
    posterior: Option<Posterior>,
}

impl GaussianProcess {
    /// Create an unfitted process for `input_dim` inputs.
    ///
    /// `dimension` identifies the modelled output and seeds restart sampling,
    /// so refitting the same data gives the same hyperparameters.
    pub fn new(input_dim: usize, dimension: usize, config: GpConfig) -> Self {
        let kernel = SquaredExpArd::new(input_dim, config.initial_log_noise);
        Self {
            config,
            dimension,
            kernel,
            samples: Vec::new(),
            targets: Array1::zeros(0),
            sample_noise: None,
            prior_mean: 0.0,
            posterior: None,
        }
    }

    /// Kernel in use
    pub fn kernel(&self) -> &SquaredExpArd {
        &self.kernel
    }

    /// Number of training samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` before the first successful fit
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Log marginal likelihood of the data under the current hyperparameters
    pub fn log_likelihood(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let value = self.objective(&self.kernel.h_params(), false).value;
        value.is_finite().then_some(value)
    }

    fn covariance(&self, kernel: &SquaredExpArd) -> Array2<f64> {
        let n = self.samples.len();
        let noise = kernel.noise_variance();
        let mut k = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in 0..i {
                let v = kernel.eval(self.samples[i].view(), self.samples[j].view());
                k[[i, j]] = v;
                k[[j, i]] = v;
            }
            let extra = self.sample_noise.as_ref().map_or(0.0, |s| s[i]);
            k[[i, i]] = kernel.eval(self.samples[i].view(), self.samples[i].view())
                + noise
                + extra
                + JITTER;
        }
        k
    }

    fn residuals(&self) -> Array1<f64> {
        self.targets.mapv(|t| t - self.prior_mean)
    }

    fn compute(&mut self) -> Result<(), RegressorError> {
        let k = self.covariance(&self.kernel);
        let factor = CholeskyFactor::new(&k)?;
        let alpha = factor.solve(self.residuals().view());
        if alpha.iter().any(|a| !a.is_finite()) {
            return Err(RegressorError::InvalidInput(
                "non-finite weights after factorization".to_string(),
            ));
        }
        self.posterior = Some(Posterior { factor, alpha });
        Ok(())
    }

    /// Log marginal likelihood (and optionally its gradient) at log-space
    /// hyperparameters `p`. Returns a NaN value when the covariance cannot be
    /// factorized.
    fn objective(&self, p: &Array1<f64>, with_gradient: bool) -> Evaluation {
        let mut kernel = self.kernel.clone();
        kernel.set_h_params(p);

        let n = self.samples.len();
        let k = self.covariance(&kernel);
        let factor = match CholeskyFactor::new(&k) {
            Ok(f) => f,
            Err(_) => return Evaluation::no_grad(f64::NAN),
        };
        let y = self.residuals();
        let alpha = factor.solve(y.view());

        let value = -0.5 * y.dot(&alpha) - 0.5 * factor.log_det() - 0.5 * n as f64 * (2.0 * PI).ln();
        if !with_gradient {
            return Evaluation::no_grad(value);
        }

        // dL/dp_j = 0.5 * tr((alpha alpha^T - K^{-1}) dK/dp_j)
        let k_inv = factor.inverse();
        let d = kernel.input_dim();
        let mut grad = Array1::<f64>::zeros(d + 2);
        for i in 0..n {
            for j in 0..=i {
                let w = alpha[i] * alpha[j] - k_inv[[i, j]];
                let weight = if i == j { 0.5 * w } else { w };
                let dk = kernel.gradient(self.samples[i].view(), self.samples[j].view());
                for (g, dkj) in grad.iter_mut().zip(dk.iter()) {
                    *g += weight * dkj;
                }
                if i == j {
                    grad[d + 1] += weight * 2.0 * kernel.noise_variance();
                }
            }
        }

        Evaluation::with_gradient(value, grad)
    }

    fn validate_input(
        &self,
        samples: &[Array1<f64>],
        targets: &[f64],
        noise: Option<&[f64]>,
    ) -> Result<(), RegressorError> {
        if samples.is_empty() {
            return Err(RegressorError::EmptyTrainingSet);
        }
        if samples.len() != targets.len() {
            return Err(RegressorError::InvalidInput(format!(
                "{} samples but {} targets",
                samples.len(),
                targets.len()
            )));
        }
        let input_dim = self.kernel.input_dim();
        if let Some(bad) = samples.iter().position(|s| s.len() != input_dim) {
            return Err(RegressorError::InvalidInput(format!(
                "sample {} has length {}, expected {}",
                bad,
                samples[bad].len(),
                input_dim
            )));
        }
        if samples.iter().any(|s| s.iter().any(|v| !v.is_finite())) {
            return Err(RegressorError::InvalidInput("non-finite sample".to_string()));
        }
        if let Some(bad) = targets.iter().position(|t| !t.is_finite()) {
            return Err(RegressorError::InvalidInput(format!(
                "non-finite target at sample {}",
                bad
            )));
        }
        if let Some(noise) = noise {
            if noise.len() != samples.len() {
                return Err(RegressorError::InvalidInput(format!(
                    "{} noise values for {} samples",
                    noise.len(),
                    samples.len()
                )));
            }
            if noise.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(RegressorError::InvalidInput(
                    "noise must be finite and >= 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl ScalarRegressor for GaussianProcess {
    fn fit(
        &mut self,
        samples: &[Array1<f64>],
        targets: &[f64],
        noise: Option<&[f64]>,
    ) -> Result<(), RegressorError> {
        self.validate_input(samples, targets, noise)?;

        self.samples = samples.to_vec();
        self.targets = Array1::from(targets.to_vec());
        self.prior_mean = self.targets.mean().unwrap_or(0.0);
        self.sample_noise = match self.config.noise_profile {
            NoiseProfile::PerSample => noise.map(|n| Array1::from(n.to_vec())),
            NoiseProfile::Ignored => None,
        };
        self.posterior = None;
        self.compute()
    }

    fn optimize_hyperparameters(&mut self) -> Result<(), RegressorError> {
        if self.samples.is_empty() {
            return Err(RegressorError::EmptyTrainingSet);
        }
        if self.config.rprop.iterations == 0 {
            return Ok(());
        }

        let bounds = Some(self.config.log_bounds);
        let (lo, hi) = self.config.log_bounds;
        let optimizer = Rprop::new(self.config.rprop.clone());
        let objective = |p: &Array1<f64>| self.objective(p, true);

        let start = self.kernel.h_params();
        let mut rng = StdRng::seed_from_u64(
            self.config
                .seed
                .wrapping_add((self.dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        );

        let mut best = optimizer.maximize(&objective, &start, bounds);
        trace!(dimension = self.dimension, restart = 0, lml = best.value, "Rprop run finished");

        for restart in 1..=self.config.restarts {
            let init = start.mapv(|v| {
                (v + rng.random_range(-RESTART_SPREAD..RESTART_SPREAD)).clamp(lo, hi)
            });
            let candidate = optimizer.maximize(&objective, &init, bounds);
            trace!(dimension = self.dimension, restart, lml = candidate.value, "Rprop run finished");
            if crate::opt::improves(candidate.value, best.value) {
                best = candidate;
            }
        }

        if !best.value.is_finite() {
            return Err(RegressorError::OptimizationDiverged(format!(
                "no finite log marginal likelihood for dimension {}",
                self.dimension
            )));
        }

        debug!(
            dimension = self.dimension,
            lml = best.value,
            "Hyperparameter optimization finished"
        );
        self.kernel.set_h_params(&best.params);
        self.compute()
    }

    fn query(&self, x: ArrayView1<f64>) -> (f64, f64) {
        let prior_var = self.kernel.eval(x, x);
        let Some(posterior) = &self.posterior else {
            return (self.prior_mean, prior_var);
        };

        let k_star: Array1<f64> = self
            .samples
            .iter()
            .map(|s| self.kernel.eval(x, s.view()))
            .collect();
        let mean = self.prior_mean + k_star.dot(&posterior.alpha);
        let v = posterior.factor.solve_lower(k_star.view());
        let variance = (prior_var - v.dot(&v)).max(0.0);
        (mean, variance)
    }

    fn samples(&self) -> &[Array1<f64>] {
        &self.samples
    }

    fn hyperparameters(&self) -> Array1<f64> {
        self.kernel.h_params()
    }

    fn natural_hyperparameters(&self) -> Array1<f64> {
        self.kernel.natural_params()
    }

    fn noise_profile(&self) -> NoiseProfile {
        self.config.noise_profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opt::RpropConfig;
    use ndarray::array;

    fn line_data() -> (Vec<Array1<f64>>, Vec<f64>) {
        let samples = (0..6).map(|i| array![i as f64 * 0.5]).collect();
        let targets = (0..6).map(|i| i as f64).collect();
        (samples, targets)
    }

    #[test]
    fn test_fit_and_interpolate() {
        let (samples, targets) = line_data();
        let mut gp = GaussianProcess::new(1, 0, GpConfig::default());
        gp.fit(&samples, &targets, None).unwrap();
        gp.optimize_hyperparameters().unwrap();

        let (mean, var) = gp.query(array![1.25].view());
        assert!((mean - 2.5).abs() < 0.1, "mean {}", mean);
        assert!(var >= 0.0 && var < 0.1, "var {}", var);
    }

    #[test]
    fn test_unfitted_query_returns_prior() {
        let gp = GaussianProcess::new(2, 0, GpConfig::default());
        let (mean, var) = gp.query(array![0.0, 1.0].view());
        assert_eq!(mean, 0.0);
        assert!((var - 1.0).abs() < 1e-12);
        assert!(gp.is_empty());
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let (samples, targets) = line_data();
        let mut gp = GaussianProcess::new(1, 0, GpConfig::default());
        gp.fit(&samples, &targets, Some(&[0.01; 6][..])).unwrap();

        let p = array![0.3, 0.2, -1.5];
        let analytic = gp.objective(&p, true).gradient.unwrap();
        let h = 1e-6;
        for j in 0..3 {
            let mut plus = p.clone();
            plus[j] += h;
            let mut minus = p.clone();
            minus[j] -= h;
            let numeric = (gp.objective(&plus, false).value - gp.objective(&minus, false).value)
                / (2.0 * h);
            assert!(
                (numeric - analytic[j]).abs() < 1e-4,
                "param {}: numeric {} analytic {}",
                j,
                numeric,
                analytic[j]
            );
        }
    }

    #[test]
    fn test_optimization_improves_likelihood() {
        let (samples, targets) = line_data();
        let mut gp = GaussianProcess::new(1, 0, GpConfig::default());
        gp.fit(&samples, &targets, None).unwrap();
        let before = gp.log_likelihood().unwrap();
        gp.optimize_hyperparameters().unwrap();
        let after = gp.log_likelihood().unwrap();
        assert!(after >= before);
    }

    #[test]
    fn test_natural_hyperparameters() {
        let (samples, targets) = line_data();
        let mut gp = GaussianProcess::new(1, 0, GpConfig::default());
        gp.fit(&samples, &targets, None).unwrap();
        gp.optimize_hyperparameters().unwrap();

        let log = gp.hyperparameters();
        let natural = gp.natural_hyperparameters();
        assert!((natural[0] - log[0].exp()).abs() < 1e-12);
        assert!((natural[1] - (2.0 * log[1]).exp()).abs() < 1e-12);
        assert!((natural[2] - (2.0 * log[2]).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_iterations_keeps_hyperparameters() {
        let config = GpConfig {
            rprop: RpropConfig {
                iterations: 0,
                ..RpropConfig::default()
            },
            ..GpConfig::default()
        };
        let (samples, targets) = line_data();
        let mut gp = GaussianProcess::new(1, 0, config);
        let before = gp.hyperparameters();
        gp.fit(&samples, &targets, None).unwrap();
        gp.optimize_hyperparameters().unwrap();
        assert_eq!(gp.hyperparameters(), before);
    }

    #[test]
    fn test_noise_profiles() {
        let (samples, targets) = line_data();
        let noise = vec![0.5; samples.len()];

        let mut noisy = GaussianProcess::new(1, 0, GpConfig::default());
        noisy.fit(&samples, &targets, Some(noise.as_slice())).unwrap();

        let mut noiseless = GaussianProcess::new(
            1,
            0,
            GpConfig {
                noise_profile: NoiseProfile::Ignored,
                ..GpConfig::default()
            },
        );
        noiseless.fit(&samples, &targets, Some(noise.as_slice())).unwrap();

        // Extra per-sample noise widens the posterior at a training input
        let (_, var_noisy) = noisy.query(samples[2].view());
        let (_, var_noiseless) = noiseless.query(samples[2].view());
        assert!(var_noisy > var_noiseless);
        assert_eq!(noiseless.noise_profile(), NoiseProfile::Ignored);
    }

    #[test]
    fn test_invalid_input() {
        let mut gp = GaussianProcess::new(1, 0, GpConfig::default());
        assert_eq!(
            gp.fit(&[], &[], None).unwrap_err(),
            RegressorError::EmptyTrainingSet
        );
        assert!(matches!(
            gp.fit(&[array![0.0]], &[f64::NAN], None),
            Err(RegressorError::InvalidInput(_))
        ));
        assert!(matches!(
            gp.fit(&[array![0.0, 1.0]], &[1.0], None),
            Err(RegressorError::InvalidInput(_))
        ));
        assert!(matches!(
            gp.fit(&[array![0.0]], &[1.0], Some(&[-1.0][..])),
            Err(RegressorError::InvalidInput(_))
        ));
        assert_eq!(
            gp.optimize_hyperparameters().unwrap_err(),
            RegressorError::EmptyTrainingSet
        );
    }

    #[test]
    fn test_factory_seeds_per_dimension() {
        let factory = GpFactory::new(GpConfig::default());
        let (samples, targets) = line_data();

        let mut a = factory.create(1, 3);
        let mut b = factory.create(1, 3);
        a.fit(&samples, &targets, None).unwrap();
        b.fit(&samples, &targets, None).unwrap();
        a.optimize_hyperparameters().unwrap();
        b.optimize_hyperparameters().unwrap();
        assert_eq!(a.hyperparameters(), b.hyperparameters());
    }
}
