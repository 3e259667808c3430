//! Column statistics over the training inputs
//!
//! The values are diagnostics only: regressors are always fit on raw samples.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Lower percentile used for the robust limit
const LOW_PERCENTILE: f64 = 5.0;

/// Upper percentile used for the robust limit
const HIGH_PERCENTILE: f64 = 95.0;

/// Per-column statistics of a sample matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Column means
    pub means: Array1<f64>,
    /// Column population standard deviations
    pub sigmas: Array1<f64>,
    /// `max(p5, p95)` of the absolute column values
    pub limits: Array1<f64>,
}

/// Computes [`Diagnostics`]
pub struct Normalizer;

impl Normalizer {
    /// Compute diagnostics over a `samples x columns` matrix.
    ///
    /// An empty matrix yields zero-filled vectors.
    pub fn compute(samples: &Array2<f64>) -> Diagnostics {
        let ncols = samples.ncols();
        if samples.nrows() == 0 {
            return Diagnostics {
                means: Array1::zeros(ncols),
                sigmas: Array1::zeros(ncols),
                limits: Array1::zeros(ncols),
            };
        }

        let means = samples
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(ncols));
        let sigmas = samples.std_axis(Axis(0), 0.0);
        let limits = samples
            .columns()
            .into_iter()
            .map(|column| {
                let mut abs: Vec<f64> = column.iter().map(|v| v.abs()).collect();
                abs.sort_by(f64::total_cmp);
                let sorted = ArrayView1::from(&abs[..]);
                percentile(sorted, LOW_PERCENTILE).max(percentile(sorted, HIGH_PERCENTILE))
            })
            .collect();

        Diagnostics {
            means,
            sigmas,
            limits,
        }
    }
}

/// Percentile `p` (0-100) of a sorted, non-empty slice with linear
/// interpolation between the closest ranks.
fn percentile(sorted: ArrayView1<f64>, p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_and_population_std() {
        let m = array![[1.0, 10.0], [3.0, 10.0]];
        let d = Normalizer::compute(&m);
        assert_eq!(d.means, array![2.0, 10.0]);
        assert_eq!(d.sigmas, array![1.0, 0.0]);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = array![0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(sorted.view(), 0.0), 0.0);
        assert_eq!(percentile(sorted.view(), 100.0), 4.0);
        assert!((percentile(sorted.view(), 95.0) - 3.8).abs() < 1e-12);
        assert!((percentile(sorted.view(), 5.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_limits_use_absolute_values() {
        let m = array![[-10.0], [0.0], [1.0], [2.0], [3.0]];
        let d = Normalizer::compute(&m);
        // |x| sorted = [0, 1, 2, 3, 10], p95 = 3 + 0.8 * 7
        assert!((d.limits[0] - 8.6).abs() < 1e-12);
    }

    #[test]
    fn test_single_row() {
        let d = Normalizer::compute(&array![[-2.0, 5.0]]);
        assert_eq!(d.means, array![-2.0, 5.0]);
        assert_eq!(d.sigmas, array![0.0, 0.0]);
        assert_eq!(d.limits, array![2.0, 5.0]);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let m = array![[0.1, -0.7], [2.3, 0.4], [-1.9, 3.3], [0.05, -0.2]];
        let a = Normalizer::compute(&m);
        let b = Normalizer::compute(&m);
        for (x, y) in a
            .means
            .iter()
            .chain(a.sigmas.iter())
            .chain(a.limits.iter())
            .zip(b.means.iter().chain(b.sigmas.iter()).chain(b.limits.iter()))
        {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_empty_matrix() {
        let d = Normalizer::compute(&Array2::zeros((0, 3)));
        assert_eq!(d.limits.len(), 3);
        assert!(d.means.iter().all(|v| *v == 0.0));
    }
}
