//! # Optimizers
//!
//! Maximizers used to fit model hyperparameters.
//!
//! - **Rprop**: sign-based gradient ascent, used for Gaussian-process log
//!   marginal likelihood (analytic gradients available)
//! - **Nelder-Mead**: derivative-free simplex search, used for mean-function
//!   fitting where only the objective value is computed
//!
//! Objectives return an [`Evaluation`]; gradient-free objectives use
//! [`Evaluation::no_grad`].
//!
//! ## Example
//!
//! ```rust
//! use gp_dynamics::opt::{Evaluation, NelderMead, NelderMeadConfig, Optimizer};
//! use ndarray::array;
//!
//! let optimizer = NelderMead::new(NelderMeadConfig::default());
//! let optimum = optimizer.maximize(
//!     |p| Evaluation::no_grad(-(p[0] - 3.0).powi(2)),
//!     &array![0.0],
//!     None,
//! );
//! assert!((optimum.params[0] - 3.0).abs() < 1e-3);
//! ```

mod nelder_mead;
mod rprop;

pub use nelder_mead::{NelderMead, NelderMeadConfig};
pub use rprop::{Rprop, RpropConfig};

use ndarray::Array1;

/// Objective value at a point, with an optional gradient
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Objective value (larger is better)
    pub value: f64,
    /// Gradient of the objective, when the objective provides one
    pub gradient: Option<Array1<f64>>,
}

impl Evaluation {
    /// Evaluation carrying a gradient
    pub fn with_gradient(value: f64, gradient: Array1<f64>) -> Self {
        Self {
            value,
            gradient: Some(gradient),
        }
    }

    /// Evaluation without gradient information
    pub fn no_grad(value: f64) -> Self {
        Self {
            value,
            gradient: None,
        }
    }
}

/// Best point found by an optimizer
#[derive(Debug, Clone)]
pub struct Optimum {
    /// Parameters at the best point
    pub params: Array1<f64>,
    /// Objective value at `params`
    pub value: f64,
}

/// A maximizer over an optionally box-bounded parameter space
pub trait Optimizer {
    /// Maximize `objective` starting from `init`.
    ///
    /// When `bounds` is `Some((lo, hi))` every coordinate is clamped to
    /// `[lo, hi]`. The returned optimum never has a NaN value unless every
    /// evaluated point did.
    fn maximize<F>(&self, objective: F, init: &Array1<f64>, bounds: Option<(f64, f64)>) -> Optimum
    where
        F: Fn(&Array1<f64>) -> Evaluation;
}

/// Clamp every coordinate into `bounds`
pub(crate) fn clamp(params: &mut Array1<f64>, bounds: Option<(f64, f64)>) {
    if let Some((lo, hi)) = bounds {
        params.mapv_inplace(|v| v.clamp(lo, hi));
    }
}

/// `true` when `candidate` improves on `incumbent`, treating non-finite values as worst
pub(crate) fn improves(candidate: f64, incumbent: f64) -> bool {
    candidate.is_finite() && (!incumbent.is_finite() || candidate > incumbent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_clamp() {
        let mut p = array![-10.0, 0.5, 10.0];
        clamp(&mut p, Some((-1.0, 1.0)));
        assert_eq!(p, array![-1.0, 0.5, 1.0]);

        let mut q = array![-10.0];
        clamp(&mut q, None);
        assert_eq!(q, array![-10.0]);
    }

    #[test]
    fn test_improves() {
        assert!(improves(1.0, 0.0));
        assert!(!improves(0.0, 1.0));
        assert!(improves(-5.0, f64::NAN));
        assert!(!improves(f64::NAN, -5.0));
        assert!(!improves(f64::INFINITY, 0.0));
    }
}
