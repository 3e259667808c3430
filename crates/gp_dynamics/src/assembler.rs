//! Turns observed transitions into regression training data

use crate::error::{DynamicsError, DynamicsResult};
use crate::types::Transition;
use ndarray::{s, Array1, Array2};

/// Regression inputs and targets, aligned row by row
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    /// `state ‖ action` per transition, in transition order
    pub samples: Vec<Array1<f64>>,
    /// One row per sample, one column per output dimension
    pub targets: Array2<f64>,
}

impl TrainingSet {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when there are no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of every sample
    pub fn input_dim(&self) -> usize {
        self.samples.first().map_or(0, |s| s.len())
    }

    /// Number of target columns
    pub fn output_dim(&self) -> usize {
        self.targets.ncols()
    }

    /// Samples stacked into a `len x input_dim` matrix
    pub fn sample_matrix(&self) -> Array2<f64> {
        to_matrix(&self.samples, self.input_dim())
    }

    /// Targets of output dimension `i`, one per sample
    pub fn target_column(&self, i: usize) -> Vec<f64> {
        self.targets.column(i).to_vec()
    }

    /// `[samples | targets]` per row, the layout of the binary snapshot
    pub fn to_data_matrix(&self) -> Array2<f64> {
        let d_in = self.input_dim();
        let mut data = Array2::zeros((self.len(), d_in + self.output_dim()));
        for (i, sample) in self.samples.iter().enumerate() {
            data.slice_mut(s![i, ..d_in]).assign(sample);
            data.slice_mut(s![i, d_in..]).assign(&self.targets.row(i));
        }
        data
    }

    /// Inverse of [`to_data_matrix`](Self::to_data_matrix): the first
    /// `input_dim` columns become samples, the rest targets. When `limit` is
    /// given only the first `limit` rows are kept.
    pub fn from_data_matrix(
        data: &Array2<f64>,
        input_dim: usize,
        limit: Option<usize>,
    ) -> DynamicsResult<Self> {
        if data.ncols() <= input_dim {
            return Err(DynamicsError::DimensionMismatch {
                field: "snapshot columns",
                index: 0,
                expected: input_dim + 1,
                found: data.ncols(),
            });
        }
        let rows = limit.map_or(data.nrows(), |l| l.min(data.nrows()));
        if rows == 0 {
            return Err(DynamicsError::EmptyInput);
        }

        let samples = (0..rows)
            .map(|i| data.slice(s![i, ..input_dim]).to_owned())
            .collect();
        let targets = data.slice(s![..rows, input_dim..]).to_owned();
        Ok(Self { samples, targets })
    }
}

/// Stack equal-length vectors into rows of a matrix
pub(crate) fn to_matrix(rows: &[Array1<f64>], ncols: usize) -> Array2<f64> {
    let mut m = Array2::zeros((rows.len(), ncols));
    for (mut dst, src) in m.rows_mut().into_iter().zip(rows) {
        dst.assign(src);
    }
    m
}

/// Build a [`TrainingSet`] from transitions.
///
/// `samples[i]` is `state_i ‖ action_i` and `targets.row(i)` is `target_i`.
/// Every transition must match the first one's state, action and target
/// lengths.
pub fn assemble(transitions: &[Transition]) -> DynamicsResult<TrainingSet> {
    let first = transitions.first().ok_or(DynamicsError::EmptyInput)?;
    let (d_s, d_a, d_t) = (first.state.len(), first.action.len(), first.target.len());

    for (index, t) in transitions.iter().enumerate() {
        for (field, expected, found) in [
            ("state", d_s, t.state.len()),
            ("action", d_a, t.action.len()),
            ("target", d_t, t.target.len()),
        ] {
            if found != expected {
                return Err(DynamicsError::DimensionMismatch {
                    field,
                    index,
                    expected,
                    found,
                });
            }
        }
    }

    let samples = transitions.iter().map(Transition::sample).collect();
    let mut targets = Array2::zeros((transitions.len(), d_t));
    for (mut row, t) in targets.rows_mut().into_iter().zip(transitions) {
        row.assign(&t.target);
    }

    Ok(TrainingSet { samples, targets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn transitions() -> Vec<Transition> {
        vec![
            Transition::new(vec![0.0, 1.0], vec![0.5], vec![1.0, -1.0]),
            Transition::new(vec![2.0, 3.0], vec![-0.5], vec![2.0, -2.0]),
            Transition::new(vec![4.0, 5.0], vec![1.5], vec![3.0, -3.0]),
        ]
    }

    #[test]
    fn test_assemble_aligns_rows() {
        let ts = assemble(&transitions()).unwrap();
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.targets.nrows(), 3);
        assert_eq!(ts.input_dim(), 3);
        assert_eq!(ts.output_dim(), 2);
        for (i, t) in transitions().iter().enumerate() {
            let mut expected = t.state.to_vec();
            expected.extend(t.action.iter());
            assert_eq!(ts.samples[i].to_vec(), expected);
            assert_eq!(ts.targets.row(i), t.target);
        }
        assert_eq!(ts.target_column(1), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(assemble(&[]), Err(DynamicsError::EmptyInput)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut ts = transitions();
        ts.push(Transition::new(vec![0.0, 1.0], vec![0.5, 0.5], vec![0.0, 0.0]));
        match assemble(&ts) {
            Err(DynamicsError::DimensionMismatch {
                field,
                index,
                expected,
                found,
            }) => {
                assert_eq!(field, "action");
                assert_eq!(index, 3);
                assert_eq!(expected, 1);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected {:?}", other),
        }

        let bad_target = vec![
            Transition::new(vec![0.0], vec![0.0], vec![1.0]),
            Transition::new(vec![0.0], vec![0.0], vec![]),
        ];
        assert!(matches!(
            assemble(&bad_target),
            Err(DynamicsError::DimensionMismatch { field: "target", index: 1, .. })
        ));
    }

    #[test]
    fn test_data_matrix_layout() {
        let ts = assemble(&transitions()).unwrap();
        let data = ts.to_data_matrix();
        assert_eq!(data.dim(), (3, 5));
        assert_eq!(data.row(1), array![2.0, 3.0, -0.5, 2.0, -2.0]);

        let back = TrainingSet::from_data_matrix(&data, 3, None).unwrap();
        assert_eq!(back, ts);

        let limited = TrainingSet::from_data_matrix(&data, 3, Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited.targets.nrows(), 2);
        assert_eq!(limited.samples[1], array![2.0, 3.0, -0.5]);

        assert!(TrainingSet::from_data_matrix(&data, 5, None).is_err());
        assert!(matches!(
            TrainingSet::from_data_matrix(&data, 3, Some(0)),
            Err(DynamicsError::EmptyInput)
        ));
    }

    #[test]
    fn test_sample_matrix() {
        let ts = assemble(&transitions()).unwrap();
        let m = ts.sample_matrix();
        assert_eq!(m.dim(), (3, 3));
        assert_eq!(m.row(2), array![4.0, 5.0, 1.5]);
    }
}
