//! Parametric mean functions

use ndarray::{s, Array1, Array2, ArrayView1};

/// A parametric map from an input sample to one value per output dimension
pub trait MeanFunction: Clone + Send + Sync {
    /// Create a mean function with all hyperparameters at zero
    fn new(input_dim: usize, output_dim: usize) -> Self;

    /// Hyperparameter vector
    fn h_params(&self) -> Array1<f64>;

    /// Replace the hyperparameters; `p` has the length of [`h_params`](Self::h_params)
    fn set_h_params(&mut self, p: &Array1<f64>);

    /// Output vector at `x`
    fn evaluate(&self, x: ArrayView1<f64>) -> Array1<f64>;
}

/// `W x + b`
///
/// Hyperparameters are `W` in row-major order followed by `b`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearMean {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl LinearMean {
    /// Weight matrix (`output_dim x input_dim`)
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Bias vector
    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }
}

impl MeanFunction for LinearMean {
    fn new(input_dim: usize, output_dim: usize) -> Self {
        Self {
            weights: Array2::zeros((output_dim, input_dim)),
            bias: Array1::zeros(output_dim),
        }
    }

    fn h_params(&self) -> Array1<f64> {
        self.weights.iter().chain(self.bias.iter()).copied().collect()
    }

    fn set_h_params(&mut self, p: &Array1<f64>) {
        let n = self.weights.len();
        debug_assert_eq!(p.len(), n + self.bias.len());
        for (w, v) in self.weights.iter_mut().zip(p.iter()) {
            *w = *v;
        }
        self.bias.assign(&p.slice(s![n..]));
    }

    fn evaluate(&self, x: ArrayView1<f64>) -> Array1<f64> {
        self.weights.dot(&x) + &self.bias
    }
}

/// One constant per output dimension
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantMean {
    values: Array1<f64>,
}

impl MeanFunction for ConstantMean {
    fn new(_input_dim: usize, output_dim: usize) -> Self {
        Self {
            values: Array1::zeros(output_dim),
        }
    }

    fn h_params(&self) -> Array1<f64> {
        self.values.clone()
    }

    fn set_h_params(&mut self, p: &Array1<f64>) {
        self.values.assign(p);
    }

    fn evaluate(&self, _x: ArrayView1<f64>) -> Array1<f64> {
        self.values.clone()
    }
}
