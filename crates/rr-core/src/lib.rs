//! Structural-parameter Hessian and standard errors for regenerative
//! replacement models.
//!
//! The transition side (counting, MLE, banded matrix) lives in `rr-math`;
//! this crate connects it to a caller-supplied structural likelihood and a
//! Hessian backend:
//!
//! ```ignore
//! use rr_core::{LinearCost, StandardErrorEngine};
//!
//! let engine = StandardErrorEngine::from_config(&config)?;
//! let report = engine.estimate(&params, &panel, &LinearCost::default(), &my_likelihood)?;
//! println!("{}", report.to_json()?);
//! ```

pub mod cost;
pub mod hessian;
pub mod likelihood;
pub mod logging;
pub mod standard_errors;

pub use cost::{CostFunction, LinearCost, LINEAR_COST_SCALE};
pub use hessian::{FiniteDiffHessian, HessianService, Objective};
pub use likelihood::{ModelInputs, StructuralLikelihood};
pub use standard_errors::{
    cost_covariance, cost_standard_errors, estimate_standard_errors, params_hess,
    transition_standard_errors, StandardErrorEngine, StandardErrorReport, EIGEN_EPS,
};
