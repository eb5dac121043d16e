//! Structural log-likelihood seam.

use ndarray::{Array1, Array2};
use rr_common::Result;

use crate::cost::CostFunction;

/// Everything the structural likelihood holds fixed while the cost
/// parameters vary.
#[derive(Debug, Clone, Copy)]
pub struct ModelInputs<'a> {
    pub num_states: usize,
    /// `num_states × num_states` banded transition matrix.
    pub trans_mat: &'a Array2<f64>,
    /// `num_obs × num_states` one-hot state membership.
    pub state_mat: &'a Array2<f64>,
    /// `2 × num_obs`; row 0 is maintain, row 1 is replace.
    pub decision_mat: &'a Array2<f64>,
    pub discount_factor: f64,
}

/// Negative log-likelihood of the replacement decisions under the
/// optimal-stopping rule implied by `params`.
///
/// `params[0]` is the replacement cost and `params[1..]` feed the cost
/// function. Implementations are expected to be deterministic; errors they
/// return reach the caller of [`params_hess`](crate::params_hess) untouched.
pub trait StructuralLikelihood {
    fn loglike(
        &self,
        params: &Array1<f64>,
        cost: &dyn CostFunction,
        inputs: &ModelInputs<'_>,
    ) -> Result<f64>;
}
