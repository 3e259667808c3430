//! Derivative-free Nelder-Mead simplex search

use super::{clamp, Evaluation, Optimizer, Optimum};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::trace;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Configuration for [`NelderMead`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex iterations
    pub max_iterations: usize,

    /// Stop once the spread of objective values across the simplex is below this
    pub tolerance: f64,

    /// Edge length of the initial simplex
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            tolerance: 1e-12,
            initial_step: 0.5,
        }
    }
}

impl NelderMeadConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("nelder_mead.max_iterations must be > 0".to_string());
        }
        if self.tolerance < 0.0 {
            return Err("nelder_mead.tolerance must be >= 0".to_string());
        }
        if self.initial_step <= 0.0 {
            return Err("nelder_mead.initial_step must be > 0".to_string());
        }
        Ok(())
    }
}

/// Nelder-Mead simplex maximizer. Gradients in the objective's evaluations are ignored.
#[derive(Debug, Clone, Default)]
pub struct NelderMead {
    config: NelderMeadConfig,
}

impl NelderMead {
    /// Create a new Nelder-Mead optimizer
    pub fn new(config: NelderMeadConfig) -> Self {
        Self { config }
    }
}

/// Internally minimizes `cost = -value`, with non-finite values mapped to +inf
fn cost_of(eval: Evaluation) -> f64 {
    if eval.value.is_finite() {
        -eval.value
    } else {
        f64::INFINITY
    }
}

impl Optimizer for NelderMead {
    fn maximize<F>(&self, objective: F, init: &Array1<f64>, bounds: Option<(f64, f64)>) -> Optimum
    where
        F: Fn(&Array1<f64>) -> Evaluation,
    {
        let cfg = &self.config;
        let dim = init.len();
        let cost = |p: &Array1<f64>| cost_of(objective(p));

        let mut start = init.clone();
        clamp(&mut start, bounds);

        if dim == 0 {
            let value = objective(&start).value;
            return Optimum {
                params: start,
                value,
            };
        }

        let mut simplex: Vec<(Array1<f64>, f64)> = Vec::with_capacity(dim + 1);
        simplex.push((start.clone(), cost(&start)));
        for i in 0..dim {
            let mut vertex = start.clone();
            vertex[i] += cfg.initial_step;
            clamp(&mut vertex, bounds);
            if vertex[i] == start[i] {
                // Pinned at the upper bound, step inward instead
                vertex[i] -= cfg.initial_step;
                clamp(&mut vertex, bounds);
            }
            let c = cost(&vertex);
            simplex.push((vertex, c));
        }

        for iteration in 0..cfg.max_iterations {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            let best = simplex[0].1;
            let worst = simplex[dim].1;
            if best.is_finite() && worst.is_finite() && (worst - best).abs() <= cfg.tolerance {
                trace!(iteration, cost = best, "Nelder-Mead converged");
                break;
            }

            let mut centroid = Array1::<f64>::zeros(dim);
            for (vertex, _) in &simplex[..dim] {
                centroid += vertex;
            }
            centroid /= dim as f64;

            let worst_vertex = simplex[dim].0.clone();
            let towards = |coef: f64| {
                let mut p = &centroid + &((&centroid - &worst_vertex) * coef);
                clamp(&mut p, bounds);
                p
            };

            let reflected = towards(REFLECTION);
            let reflected_cost = cost(&reflected);

            if reflected_cost < simplex[0].1 {
                let expanded = towards(EXPANSION);
                let expanded_cost = cost(&expanded);
                simplex[dim] = if expanded_cost < reflected_cost {
                    (expanded, expanded_cost)
                } else {
                    (reflected, reflected_cost)
                };
                continue;
            }

            if reflected_cost < simplex[dim - 1].1 {
                simplex[dim] = (reflected, reflected_cost);
                continue;
            }

            let contracted = if reflected_cost < simplex[dim].1 {
                towards(REFLECTION * CONTRACTION)
            } else {
                towards(-CONTRACTION)
            };
            let contracted_cost = cost(&contracted);
            if contracted_cost < simplex[dim].1.min(reflected_cost) {
                simplex[dim] = (contracted, contracted_cost);
                continue;
            }

            let anchor = simplex[0].0.clone();
            for entry in simplex.iter_mut().skip(1) {
                let mut p = &anchor + &((&entry.0 - &anchor) * SHRINK);
                clamp(&mut p, bounds);
                entry.1 = cost(&p);
                entry.0 = p;
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (params, best_cost) = simplex.swap_remove(0);
        let value = if best_cost.is_finite() {
            -best_cost
        } else {
            f64::NAN
        };
        Optimum { params, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rosenbrock() {
        let objective = |p: &Array1<f64>| {
            let (x, y) = (p[0], p[1]);
            Evaluation::no_grad(-((1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2)))
        };
        let nm = NelderMead::new(NelderMeadConfig::default());
        let optimum = nm.maximize(objective, &array![-1.2, 1.0], None);
        assert!((optimum.params[0] - 1.0).abs() < 1e-3);
        assert!((optimum.params[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_bounded() {
        let objective = |p: &Array1<f64>| Evaluation::no_grad(-(p[0] - 5.0).powi(2));
        let nm = NelderMead::new(NelderMeadConfig::default());
        let optimum = nm.maximize(objective, &array![0.0], Some((-1.0, 2.0)));
        assert!((optimum.params[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_region_is_avoided() {
        let objective = |p: &Array1<f64>| {
            if p[0] < 0.0 {
                Evaluation::no_grad(f64::NAN)
            } else {
                Evaluation::no_grad(-(p[0] - 0.25).powi(2))
            }
        };
        let nm = NelderMead::new(NelderMeadConfig::default());
        let optimum = nm.maximize(objective, &array![1.0], None);
        assert!(optimum.value.is_finite());
        assert!((optimum.params[0] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_empty_parameter_vector() {
        let nm = NelderMead::default();
        let optimum = nm.maximize(|_| Evaluation::no_grad(7.0), &Array1::zeros(0), None);
        assert_eq!(optimum.value, 7.0);
        assert_eq!(optimum.params.len(), 0);
    }
}
