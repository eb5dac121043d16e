//! Banded Markov transition matrix with an absorbing upper boundary.
//!
//! The state can only stay or move up, by at most `p.len() - 1` bins per
//! period. The state space is truncated at `num_states - 1`: probability
//! mass that would move past the last state is collected on the last column.
//!
//! ```text
//! create_transition_matrix(5, [0.5, 0.3, 0.2])
//!
//!   [0.5 0.3 0.2 0.0 0.0]
//!   [0.0 0.5 0.3 0.2 0.0]
//!   [0.0 0.0 0.5 0.3 0.2]
//!   [0.0 0.0 0.0 0.5 0.5]   <- 0.3 + 0.2 absorbed
//!   [0.0 0.0 0.0 0.0 1.0]
//! ```

use super::stable::{is_probability_vector, PROB_SUM_TOL};
use ndarray::Array2;
use rr_common::{Error, Result};
use tracing::debug;

/// Build the `num_states × num_states` transition matrix for increment
/// probabilities `probabilities` (index = increment size).
///
/// Requires `num_states > probabilities.len()` and a valid probability
/// vector. Every row of the result sums to one and is zero left of the
/// diagonal.
pub fn create_transition_matrix(num_states: usize, probabilities: &[f64]) -> Result<Array2<f64>> {
    let support = probabilities.len();
    if support == 0 {
        return Err(Error::InvalidInput(
            "transition probabilities are empty".to_string(),
        ));
    }
    if num_states <= support {
        return Err(Error::StateSpaceTooSmall {
            num_states,
            support,
        });
    }
    if !is_probability_vector(probabilities, PROB_SUM_TOL) {
        return Err(Error::InvalidInput(format!(
            "transition probabilities must lie in [0, 1] and sum to 1, got {:?}",
            probabilities
        )));
    }

    // tail[j] = Σ probabilities[j..]
    let mut tail = vec![0.0; support + 1];
    for j in (0..support).rev() {
        tail[j] = tail[j + 1] + probabilities[j];
    }

    let last = num_states - 1;
    let mut buf = vec![0.0; num_states * num_states];
    for (i, row) in buf.chunks_exact_mut(num_states).enumerate() {
        for (j, &p) in probabilities.iter().enumerate() {
            let k = i + j;
            if k < last {
                row[k] = p;
            } else {
                // First offset reaching the boundary absorbs the rest of the row.
                row[last] += tail[j];
                break;
            }
        }
    }

    debug!(num_states, support, "built transition matrix");

    Array2::from_shape_vec((num_states, num_states), buf)
        .map_err(|e| Error::InvalidInput(format!("transition matrix shape: {}", e)))
}
