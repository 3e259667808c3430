//! Common types for dynamics models

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Point prediction with one collapsed uncertainty value
pub type Prediction = (Array1<f64>, f64);

/// Point prediction with one variance per output dimension
pub type FullPrediction = (Array1<f64>, Array1<f64>);

/// One observed step of the controlled system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State before the action
    pub state: Array1<f64>,
    /// Applied action
    pub action: Array1<f64>,
    /// Regression target (usually the state delta)
    pub target: Array1<f64>,
}

impl Transition {
    /// Create a transition from plain vectors
    pub fn new(state: Vec<f64>, action: Vec<f64>, target: Vec<f64>) -> Self {
        Self {
            state: Array1::from(state),
            action: Array1::from(action),
            target: Array1::from(target),
        }
    }

    /// `state ‖ action`, the regression input for this transition
    pub fn sample(&self) -> Array1<f64> {
        let mut sample = Array1::zeros(self.state.len() + self.action.len());
        sample
            .slice_mut(ndarray::s![..self.state.len()])
            .assign(&self.state);
        sample
            .slice_mut(ndarray::s![self.state.len()..])
            .assign(&self.action);
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sample_concatenates_state_and_action() {
        let t = Transition::new(vec![1.0, 2.0], vec![3.0], vec![0.5]);
        assert_eq!(t.sample(), array![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sample_without_action() {
        let t = Transition::new(vec![1.0], vec![], vec![0.5]);
        assert_eq!(t.sample(), array![1.0]);
    }
}
