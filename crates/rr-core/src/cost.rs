//! Maintenance cost functions.

use ndarray::Array1;
use rr_common::{Error, Result};

/// Scale applied to the linear cost slope so `theta_1_1` is of order one.
pub const LINEAR_COST_SCALE: f64 = 0.001;

/// Per-state maintenance cost as a function of the cost parameters.
///
/// `params` excludes the replacement cost, which always sits at index 0 of
/// the full structural parameter vector.
pub trait CostFunction {
    /// Number of parameters consumed by [`costs`](Self::costs).
    fn num_params(&self) -> usize;

    /// Maintenance cost for each of `num_states` states.
    fn costs(&self, num_states: usize, params: &[f64]) -> Result<Array1<f64>>;
}

/// `c(s) = 0.001 · theta_1_1 · s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCost {
    pub scale: f64,
}

impl Default for LinearCost {
    fn default() -> Self {
        Self {
            scale: LINEAR_COST_SCALE,
        }
    }
}

impl CostFunction for LinearCost {
    fn num_params(&self) -> usize {
        1
    }

    fn costs(&self, num_states: usize, params: &[f64]) -> Result<Array1<f64>> {
        let [theta] = params else {
            return Err(Error::DimensionMismatch {
                expected: self.num_params(),
                actual: params.len(),
            });
        };
        let slope = self.scale * theta;
        Ok(Array1::from_shape_fn(num_states, |s| slope * s as f64))
    }
}
