//! Resilient backpropagation (iRprop-) for gradient ascent

use super::{clamp, improves, Evaluation, Optimizer, Optimum};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Configuration for [`Rprop`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpropConfig {
    /// Maximum number of gradient steps (0 disables optimization)
    pub iterations: usize,

    /// Initial step size per coordinate
    pub delta0: f64,

    /// Smallest step size
    pub delta_min: f64,

    /// Largest step size
    pub delta_max: f64,

    /// Step growth factor when the gradient sign is stable
    pub eta_plus: f64,

    /// Step shrink factor when the gradient sign flips
    pub eta_minus: f64,

    /// Stop once the gradient norm falls below this value
    pub eps_stop: f64,
}

impl Default for RpropConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            delta0: 0.1,
            delta_min: 1e-6,
            delta_max: 50.0,
            eta_plus: 1.2,
            eta_minus: 0.5,
            eps_stop: 0.0,
        }
    }
}

impl RpropConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.delta0 <= 0.0 {
            return Err("rprop.delta0 must be > 0".to_string());
        }
        if self.delta_min <= 0.0 || self.delta_min > self.delta_max {
            return Err("rprop.delta_min must be > 0 and <= delta_max".to_string());
        }
        if self.eta_plus <= 1.0 {
            return Err("rprop.eta_plus must be > 1.0".to_string());
        }
        if self.eta_minus <= 0.0 || self.eta_minus >= 1.0 {
            return Err("rprop.eta_minus must be between 0.0 and 1.0".to_string());
        }
        if self.eps_stop < 0.0 {
            return Err("rprop.eps_stop must be >= 0".to_string());
        }
        Ok(())
    }
}

/// Sign-based gradient ascent with per-coordinate adaptive step sizes
#[derive(Debug, Clone, Default)]
pub struct Rprop {
    config: RpropConfig,
}

impl Rprop {
    /// Create a new Rprop optimizer
    pub fn new(config: RpropConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &RpropConfig {
        &self.config
    }
}

impl Optimizer for Rprop {
    fn maximize<F>(&self, objective: F, init: &Array1<f64>, bounds: Option<(f64, f64)>) -> Optimum
    where
        F: Fn(&Array1<f64>) -> Evaluation,
    {
        let cfg = &self.config;
        let dim = init.len();

        let mut params = init.clone();
        clamp(&mut params, bounds);

        let mut best = Optimum {
            params: params.clone(),
            value: f64::NAN,
        };

        let mut delta = Array1::from_elem(dim, cfg.delta0);
        let mut prev_grad = Array1::<f64>::zeros(dim);

        for iteration in 0..=cfg.iterations {
            let eval = objective(&params);

            if improves(eval.value, best.value) {
                best.params = params.clone();
                best.value = eval.value;
            }

            if iteration == cfg.iterations {
                break;
            }

            if !eval.value.is_finite() {
                // Step back to the incumbent with smaller steps
                params = best.params.clone();
                delta.mapv_inplace(|d| (d * cfg.eta_minus).max(cfg.delta_min));
                prev_grad.fill(0.0);
                continue;
            }

            let Some(mut grad) = eval.gradient else {
                trace!("Objective has no gradient, stopping Rprop");
                break;
            };

            let norm = grad.dot(&grad).sqrt();
            if !norm.is_finite() {
                break;
            }
            if norm <= cfg.eps_stop {
                trace!(iteration, norm, "Rprop converged");
                break;
            }

            for j in 0..dim {
                let sign_product = prev_grad[j] * grad[j];
                if sign_product > 0.0 {
                    delta[j] = (delta[j] * cfg.eta_plus).min(cfg.delta_max);
                } else if sign_product < 0.0 {
                    delta[j] = (delta[j] * cfg.eta_minus).max(cfg.delta_min);
                    grad[j] = 0.0;
                }
                if grad[j] > 0.0 {
                    params[j] += delta[j];
                } else if grad[j] < 0.0 {
                    params[j] -= delta[j];
                }
            }
            clamp(&mut params, bounds);
            prev_grad = grad;
        }

        best
    }
}
