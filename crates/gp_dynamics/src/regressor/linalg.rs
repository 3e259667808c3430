//! Cholesky factorization of covariance matrices, backed by `nalgebra`
//!
//! The regressors keep their data in `ndarray`; this module converts at the
//! boundary and exposes only the operations a Gaussian process needs.

use crate::error::RegressorError;
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use ndarray::{Array1, Array2, ArrayView1};

/// `L` with `L * L^T = K` for a symmetric positive definite `K`
#[derive(Debug, Clone)]
pub struct CholeskyFactor {
    inner: Cholesky<f64, Dyn>,
}

impl CholeskyFactor {
    /// Factorize `a`. Only the lower triangle is read.
    ///
    /// Fails with [`RegressorError::NotPositiveDefinite`] when a pivot is not
    /// strictly positive or the matrix holds non-finite values.
    pub fn new(a: &Array2<f64>) -> Result<Self, RegressorError> {
        let n = a.nrows();
        if a.iter().any(|v| !v.is_finite()) {
            return Err(RegressorError::NotPositiveDefinite { size: n });
        }
        let m = DMatrix::from_fn(n, a.ncols(), |i, j| a[[i, j]]);
        Cholesky::new(m)
            .map(|inner| Self { inner })
            .ok_or(RegressorError::NotPositiveDefinite { size: n })
    }

    /// Order of the factorized matrix
    pub fn size(&self) -> usize {
        self.inner.l_dirty().nrows()
    }

    /// Lower-triangular factor as an `ndarray` matrix
    pub fn lower(&self) -> Array2<f64> {
        to_array2(&self.inner.l())
    }

    /// Solve `K x = b`
    pub fn solve(&self, b: ArrayView1<f64>) -> Array1<f64> {
        to_array1(&self.inner.solve(&to_dvector(b)))
    }

    /// Solve `L x = b` by forward substitution
    pub fn solve_lower(&self, b: ArrayView1<f64>) -> Array1<f64> {
        let x = self
            .inner
            .l_dirty()
            .solve_lower_triangular_unchecked(&to_dvector(b));
        to_array1(&x)
    }

    /// `K^{-1}`
    pub fn inverse(&self) -> Array2<f64> {
        to_array2(&self.inner.inverse())
    }

    /// `log |K|` from the factor's diagonal
    pub fn log_det(&self) -> f64 {
        2.0 * self
            .inner
            .l_dirty()
            .diagonal()
            .iter()
            .map(|d| d.ln())
            .sum::<f64>()
    }
}

fn to_dvector(v: ArrayView1<f64>) -> DVector<f64> {
    DVector::from_iterator(v.len(), v.iter().copied())
}

fn to_array1(v: &DVector<f64>) -> Array1<f64> {
    v.iter().copied().collect()
}

fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}
