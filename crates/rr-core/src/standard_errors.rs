//! Standard errors for the transition probabilities and the cost parameters.
//!
//! The cost-parameter Hessian is obtained by re-running the transition
//! estimation on the panel, building the banded transition matrix and the
//! state/decision indicator matrices, and handing the structural likelihood
//! (with all of that held fixed) to a [`HessianService`] as a function of the
//! cost parameters alone.
//!
//! The Hessian of the negative log-likelihood is the observed information.
//! Its inverse is taken through a symmetric eigendecomposition, dropping
//! directions whose eigenvalue is at most [`EIGEN_EPS`], so a weakly
//! identified model yields a pseudoinverse instead of an error.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use rr_common::{Error, Panel, Result};
use rr_config::{validate_config, EstimationConfig, StateSpace};
use rr_math::{
    create_decision_matrix, create_state_matrix, create_transition_matrix, estimate_transitions,
    multinomial_standard_errors, TransitionEstimate,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cost::CostFunction;
use crate::hessian::{FiniteDiffHessian, HessianService};
use crate::likelihood::{ModelInputs, StructuralLikelihood};

/// Eigenvalues at or below this are treated as zero in the pseudoinverse.
pub const EIGEN_EPS: f64 = 1e-12;

/// Everything derived from the panel before the cost parameters enter.
struct PreparedModel {
    estimate: TransitionEstimate,
    num_states: usize,
    trans_mat: Array2<f64>,
    state_mat: Array2<f64>,
    decision_mat: Array2<f64>,
}

impl PreparedModel {
    fn build(panel: &Panel, state_space: StateSpace) -> Result<Self> {
        let max_state = panel.max_state().ok_or(Error::EmptyPanel)?;
        let estimate = estimate_transitions(panel)?;
        let num_states = state_space.num_states(max_state);
        debug!(
            observations = panel.len(),
            buses = panel.num_buses(),
            max_state,
            num_states,
            ?state_space,
            "sizing state space"
        );

        let trans_mat = create_transition_matrix(num_states, &estimate.x.to_vec())?;
        let state_mat = create_state_matrix(&panel.states(), num_states)?;
        let decision_mat = create_decision_matrix(&panel.decisions());

        Ok(Self {
            estimate,
            num_states,
            trans_mat,
            state_mat,
            decision_mat,
        })
    }

    fn inputs(&self, discount_factor: f64) -> ModelInputs<'_> {
        ModelInputs {
            num_states: self.num_states,
            trans_mat: &self.trans_mat,
            state_mat: &self.state_mat,
            decision_mat: &self.decision_mat,
            discount_factor,
        }
    }
}

fn check_arguments(
    params: &Array1<f64>,
    discount_factor: f64,
    cost: &dyn CostFunction,
) -> Result<()> {
    let expected = 1 + cost.num_params();
    if params.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: params.len(),
        });
    }
    if !discount_factor.is_finite() || discount_factor <= 0.0 || discount_factor >= 1.0 {
        return Err(Error::InvalidInput(format!(
            "discount factor must be in (0, 1), got {}",
            discount_factor
        )));
    }
    Ok(())
}

fn hessian_at(
    params: &Array1<f64>,
    inputs: &ModelInputs<'_>,
    cost: &dyn CostFunction,
    likelihood: &dyn StructuralLikelihood,
    service: &dyn HessianService,
) -> Result<Array2<f64>> {
    let objective = |x: &Array1<f64>| -> Result<f64> { likelihood.loglike(x, cost, inputs) };

    // Every objective call is a full structural solve; the service owns all of them.
    let hess = service.evaluate(&objective, params)?;
    let k = params.len();
    if hess.dim() != (k, k) {
        return Err(Error::DimensionMismatch {
            expected: k * k,
            actual: hess.len(),
        });
    }
    Ok(hess)
}

/// Hessian of the structural negative log-likelihood with respect to the
/// cost parameters `[RC, theta...]`.
///
/// Transition probabilities are re-estimated from `panel` and held fixed.
pub fn params_hess(
    params: &Array1<f64>,
    panel: &Panel,
    discount_factor: f64,
    cost: &dyn CostFunction,
    likelihood: &dyn StructuralLikelihood,
    service: &dyn HessianService,
    state_space: StateSpace,
) -> Result<Array2<f64>> {
    check_arguments(params, discount_factor, cost)?;
    let model = PreparedModel::build(panel, state_space)?;
    hessian_at(params, &model.inputs(discount_factor), cost, likelihood, service)
}

/// Covariance of the cost parameters: pseudoinverse of the observed information.
pub fn cost_covariance(hessian: &Array2<f64>) -> Result<Array2<f64>> {
    let (rows, cols) = hessian.dim();
    if rows != cols {
        return Err(Error::DimensionMismatch {
            expected: rows * rows,
            actual: rows * cols,
        });
    }
    if rows == 0 {
        return Err(Error::InvalidInput("hessian is empty".to_string()));
    }
    if hessian.iter().any(|v| !v.is_finite()) {
        return Err(Error::IllConditioned("hessian has non-finite entries".to_string()));
    }

    let n = rows;
    let info = DMatrix::<f64>::from_fn(n, n, |i, j| 0.5 * (hessian[[i, j]] + hessian[[j, i]]));
    let eigen = info.symmetric_eigen();
    let q = eigen.eigenvectors;
    let lambdas = eigen.eigenvalues;

    let kept: Vec<usize> = (0..n).filter(|&k| lambdas[k] > EIGEN_EPS).collect();
    if kept.is_empty() {
        return Err(Error::IllConditioned(format!(
            "no eigenvalue of the observed information exceeds {:e}",
            EIGEN_EPS
        )));
    }
    if kept.len() < n {
        let min = lambdas.iter().copied().fold(f64::INFINITY, f64::min);
        warn!(
            dropped = n - kept.len(),
            min_eigenvalue = min,
            "observed information is not positive definite; using pseudoinverse"
        );
    }

    let mut cov = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let value: f64 = kept.iter().map(|&k| q[(i, k)] * q[(j, k)] / lambdas[k]).sum();
            cov[[i, j]] = value;
            cov[[j, i]] = value;
        }
    }
    Ok(cov)
}

/// Square roots of the diagonal of [`cost_covariance`].
pub fn cost_standard_errors(hessian: &Array2<f64>) -> Result<Array1<f64>> {
    let cov = cost_covariance(hessian)?;
    Ok(cov.diag().mapv(|v| v.max(0.0).sqrt()))
}

/// Multinomial standard errors of the estimated increment probabilities.
pub fn transition_standard_errors(estimate: &TransitionEstimate) -> Result<Array1<f64>> {
    multinomial_standard_errors(estimate.num_transitions(), &estimate.x.to_vec())
}

/// Everything needed to report uncertainty for one fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardErrorReport {
    pub num_states: usize,
    pub transitions: TransitionEstimate,
    pub transition_se: Array1<f64>,
    /// `[RC, theta...]` the Hessian was evaluated at.
    pub params: Array1<f64>,
    pub hessian: Array2<f64>,
    pub cost_covariance: Array2<f64>,
    pub cost_se: Array1<f64>,
}

impl StandardErrorReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configured entry point bundling discount factor, state-space rule and
/// Hessian backend.
#[derive(Debug, Clone)]
pub struct StandardErrorEngine<H = FiniteDiffHessian> {
    pub discount_factor: f64,
    pub state_space: StateSpace,
    pub hessian: H,
}

impl StandardErrorEngine<FiniteDiffHessian> {
    /// Validates `config` first; failures surface as [`Error::Config`].
    pub fn from_config(config: &EstimationConfig) -> Result<Self> {
        validate_config(config)?;
        Ok(Self {
            discount_factor: config.discount_factor,
            state_space: config.state_space(),
            hessian: FiniteDiffHessian::from_config(&config.hessian),
        })
    }
}

impl<H: HessianService> StandardErrorEngine<H> {
    pub fn new(discount_factor: f64, state_space: StateSpace, hessian: H) -> Self {
        Self {
            discount_factor,
            state_space,
            hessian,
        }
    }

    /// See [`params_hess`].
    pub fn params_hess(
        &self,
        params: &Array1<f64>,
        panel: &Panel,
        cost: &dyn CostFunction,
        likelihood: &dyn StructuralLikelihood,
    ) -> Result<Array2<f64>> {
        params_hess(
            params,
            panel,
            self.discount_factor,
            cost,
            likelihood,
            &self.hessian,
            self.state_space,
        )
    }

    /// Transition and cost-parameter standard errors in one pass over the panel.
    pub fn estimate(
        &self,
        params: &Array1<f64>,
        panel: &Panel,
        cost: &dyn CostFunction,
        likelihood: &dyn StructuralLikelihood,
    ) -> Result<StandardErrorReport> {
        check_arguments(params, self.discount_factor, cost)?;
        let model = PreparedModel::build(panel, self.state_space)?;
        let hessian = hessian_at(
            params,
            &model.inputs(self.discount_factor),
            cost,
            likelihood,
            &self.hessian,
        )?;
        let cost_covariance = cost_covariance(&hessian)?;
        let cost_se = cost_covariance.diag().mapv(|v| v.max(0.0).sqrt());
        let transition_se = transition_standard_errors(&model.estimate)?;

        debug!(
            num_states = model.num_states,
            cost_se = ?cost_se.to_vec(),
            "standard errors computed"
        );

        Ok(StandardErrorReport {
            num_states: model.num_states,
            transitions: model.estimate,
            transition_se,
            params: params.clone(),
            hessian,
            cost_covariance,
            cost_se,
        })
    }
}

/// One-shot [`StandardErrorEngine::from_config`] followed by [`StandardErrorEngine::estimate`].
pub fn estimate_standard_errors(
    params: &Array1<f64>,
    panel: &Panel,
    cost: &dyn CostFunction,
    likelihood: &dyn StructuralLikelihood,
    config: &EstimationConfig,
) -> Result<StandardErrorReport> {
    StandardErrorEngine::from_config(config)?.estimate(params, panel, cost, likelihood)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
    }

    #[test]
    fn covariance_inverts_positive_definite_hessian() {
        let h = array![[4.0, 1.0], [1.0, 3.0]];
        let cov = cost_covariance(&h).unwrap();
        // inverse = 1/11 · [[3, -1], [-1, 4]]
        let expected = array![[3.0, -1.0], [-1.0, 4.0]] / 11.0;
        for (a, b) in cov.iter().zip(expected.iter()) {
            assert!(approx_eq(*a, *b, 1e-12), "{} vs {}", a, b);
        }
    }

    #[test]
    fn standard_errors_of_diagonal_hessian() {
        let h = array![[4.0, 0.0], [0.0, 100.0]];
        let se = cost_standard_errors(&h).unwrap();
        assert!(approx_eq(se[0], 0.5, 1e-12));
        assert!(approx_eq(se[1], 0.1, 1e-12));
    }

    #[test]
    fn singular_direction_is_dropped() {
        // Rank one: only the first coordinate is identified.
        let h = array![[2.0, 0.0], [0.0, 0.0]];
        let cov = cost_covariance(&h).unwrap();
        assert!(approx_eq(cov[[0, 0]], 0.5, 1e-12));
        assert!(cov[[1, 1]].abs() < 1e-12);
        assert!(cov[[0, 1]].abs() < 1e-12);
    }

    #[test]
    fn negative_definite_hessian_is_ill_conditioned() {
        let h = array![[-1.0, 0.0], [0.0, -2.0]];
        assert!(matches!(cost_covariance(&h), Err(Error::IllConditioned(_))));
    }

    #[test]
    fn non_finite_hessian_is_ill_conditioned() {
        let h = array![[1.0, f64::NAN], [f64::NAN, 1.0]];
        let err = cost_covariance(&h).unwrap_err();
        assert!(matches!(err, Error::IllConditioned(_)));
        assert_eq!(err.code(), 21);
    }

    #[test]
    fn non_square_hessian_is_rejected() {
        let h = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            cost_covariance(&h),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn transition_standard_errors_use_total_count() {
        let estimate = TransitionEstimate {
            x: array![0.8, 0.2],
            fun: 0.0,
            trans_count: vec![80, 20],
        };
        let se = transition_standard_errors(&estimate).unwrap();
        assert!(approx_eq(se[0], 0.04, 1e-12));
        assert!(approx_eq(se[1], 0.04, 1e-12));
    }

    #[test]
    fn engine_from_config_reads_every_section() {
        let mut config = EstimationConfig::default();
        config.discount_factor = 0.95;
        config.hessian.allow_forward_fallback = false;
        let engine = StandardErrorEngine::from_config(&config).unwrap();
        assert_eq!(engine.discount_factor, 0.95);
        assert_eq!(engine.state_space, StateSpace::Scaled { margin: 1.2 });
        assert!(!engine.hessian.allow_forward_fallback);
    }

    #[test]
    fn engine_from_config_rejects_invalid_settings() {
        let mut config = EstimationConfig::default();
        config.state_space.margin = 0.5;
        let err = StandardErrorEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("state_space.margin")));
        assert_eq!(err.category(), rr_common::ErrorCategory::Config);

        let mut config = EstimationConfig::default();
        config.hessian.relative_step = 0.0;
        assert!(matches!(
            StandardErrorEngine::from_config(&config),
            Err(Error::Config(_))
        ));
    }
}
