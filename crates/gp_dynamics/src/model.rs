//! Capability shared by the dynamics model variants

use crate::error::DynamicsResult;
use crate::types::{FullPrediction, Prediction, Transition};
use ndarray::ArrayView1;
use std::path::Path;

/// A learned model of `(state, action) -> target`.
///
/// Lifecycle is `Uninitialized -> Fitted`. A failed `learn` keeps whatever
/// fit was there before. Queries and `save` fail with
/// [`NotFitted`](crate::DynamicsError::NotFitted) until a full `learn` has
/// succeeded.
pub trait DynamicsModel {
    /// Fit on `transitions`, replacing any previous fit.
    ///
    /// With `only_limits` set, only the input diagnostics are refreshed and
    /// the fitted state is left untouched.
    fn learn(&mut self, transitions: &[Transition], only_limits: bool) -> DynamicsResult<()>;

    /// Mean prediction and one scalar uncertainty for `x = state ‖ action`
    fn predict(&self, x: ArrayView1<f64>) -> DynamicsResult<Prediction>;

    /// Mean prediction and one variance per output dimension
    fn predict_full(&self, x: ArrayView1<f64>) -> DynamicsResult<FullPrediction>;

    /// Write the training data as a text dump
    fn save(&self, path: &Path) -> DynamicsResult<()>;

    /// `true` once a full `learn` has succeeded
    fn is_fitted(&self) -> bool;
}
