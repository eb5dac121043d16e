//! Indicator matrices consumed by the structural likelihood.

use ndarray::Array2;
use rr_common::{Decision, Error, Result};

/// One-hot state membership: row `r` has a single 1 at column `states[r]`.
///
/// A state outside `0..num_states` is an error rather than a silently empty row.
pub fn create_state_matrix(states: &[usize], num_states: usize) -> Result<Array2<f64>> {
    let mut mat = Array2::<f64>::zeros((states.len(), num_states));
    for (index, &state) in states.iter().enumerate() {
        if state >= num_states {
            return Err(Error::StateOutOfRange {
                index,
                state,
                num_states,
            });
        }
        mat[[index, state]] = 1.0;
    }
    Ok(mat)
}

/// Two-row decision matrix: row 0 is `1 - decision`, row 1 is `decision`.
pub fn create_decision_matrix(decisions: &[Decision]) -> Array2<f64> {
    let mut mat = Array2::<f64>::zeros((2, decisions.len()));
    for (col, d) in decisions.iter().enumerate() {
        let replace = d.indicator();
        mat[[0, col]] = 1.0 - replace;
        mat[[1, col]] = replace;
    }
    mat
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    #[test]
    fn state_matrix_is_one_hot() {
        let m = create_state_matrix(&[0, 2, 2, 1], 4).unwrap();
        assert_eq!(m.dim(), (4, 4));
        for (r, row) in m.axis_iter(Axis(0)).enumerate() {
            assert_eq!(row.sum(), 1.0, "row {} is not one-hot", r);
        }
        assert_eq!(m[[1, 2]], 1.0);
        assert_eq!(m[[3, 1]], 1.0);
        assert_eq!(m[[0, 3]], 0.0);
    }

    #[test]
    fn state_matrix_rejects_out_of_range_state() {
        match create_state_matrix(&[0, 5], 5) {
            Err(Error::StateOutOfRange {
                index,
                state,
                num_states,
            }) => {
                assert_eq!((index, state, num_states), (1, 5, 5));
            }
            other => panic!("expected StateOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn state_matrix_empty_panel() {
        let m = create_state_matrix(&[], 3).unwrap();
        assert_eq!(m.dim(), (0, 3));
    }

    #[test]
    fn decision_matrix_rows_are_complementary() {
        let m = create_decision_matrix(&[Decision::Maintain, Decision::Replace, Decision::Maintain]);
        assert_eq!(m, array![[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);
        for col in m.axis_iter(Axis(1)) {
            assert_eq!(col.sum(), 1.0);
        }
    }
}
