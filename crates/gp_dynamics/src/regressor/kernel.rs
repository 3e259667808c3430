//! Squared exponential kernel with automatic relevance determination

use ndarray::{Array1, ArrayView1};

/// `k(x, y) = sf^2 * exp(-0.5 * sum_d ((x_d - y_d) / l_d)^2)` plus a learned
/// white-noise term `sn^2` on the training diagonal.
///
/// Hyperparameters are kept in log space and laid out as
/// `[log l_1, .., log l_D, log sf, log sn]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SquaredExpArd {
    log_lengthscales: Array1<f64>,
    log_signal: f64,
    log_noise: f64,
}

impl SquaredExpArd {
    /// Unit length scales and signal, noise at `exp(log_noise)`
    pub fn new(input_dim: usize, log_noise: f64) -> Self {
        Self {
            log_lengthscales: Array1::zeros(input_dim),
            log_signal: 0.0,
            log_noise,
        }
    }

    /// Input dimension
    pub fn input_dim(&self) -> usize {
        self.log_lengthscales.len()
    }

    /// Number of hyperparameters (`D + 2`)
    pub fn n_params(&self) -> usize {
        self.input_dim() + 2
    }

    /// Log-space hyperparameter vector
    pub fn h_params(&self) -> Array1<f64> {
        let d = self.input_dim();
        let mut p = Array1::zeros(d + 2);
        p.slice_mut(ndarray::s![..d]).assign(&self.log_lengthscales);
        p[d] = self.log_signal;
        p[d + 1] = self.log_noise;
        p
    }

    /// Replace the hyperparameters; `p` must have length `D + 2`
    pub fn set_h_params(&mut self, p: &Array1<f64>) {
        let d = self.input_dim();
        debug_assert_eq!(p.len(), d + 2);
        self.log_lengthscales.assign(&p.slice(ndarray::s![..d]));
        self.log_signal = p[d];
        self.log_noise = p[d + 1];
    }

    /// Hyperparameters in natural space: length scales, then `sf^2`, then `sn^2`
    pub fn natural_params(&self) -> Array1<f64> {
        let mut p = self.h_params();
        let d = self.input_dim();
        p.slice_mut(ndarray::s![..d]).mapv_inplace(f64::exp);
        p[d] = (2.0 * p[d]).exp();
        p[d + 1] = (2.0 * p[d + 1]).exp();
        p
    }

    /// Signal variance `sf^2`
    pub fn signal_variance(&self) -> f64 {
        (2.0 * self.log_signal).exp()
    }

    /// Learned noise variance `sn^2`
    pub fn noise_variance(&self) -> f64 {
        (2.0 * self.log_noise).exp()
    }

    /// Noise-free covariance between `x` and `y`
    pub fn eval(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        self.signal_variance() * (-0.5 * self.scaled_sq_dist(x, y)).exp()
    }

    /// Gradient of [`eval`](Self::eval) with respect to the first `D + 1`
    /// hyperparameters (length scales and signal). The noise derivative only
    /// applies on the diagonal and is handled by the caller.
    pub fn gradient(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> Array1<f64> {
        let d = self.input_dim();
        let k = self.eval(x, y);
        let mut grad = Array1::zeros(d + 1);
        for i in 0..d {
            let l = self.log_lengthscales[i].exp();
            let diff = (x[i] - y[i]) / l;
            grad[i] = k * diff * diff;
        }
        grad[d] = 2.0 * k;
        grad
    }

    fn scaled_sq_dist(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        x.iter()
            .zip(y.iter())
            .zip(self.log_lengthscales.iter())
            .map(|((a, b), log_l)| {
                let diff = (a - b) / log_l.exp();
                diff * diff
            })
            .sum()
    }
}
