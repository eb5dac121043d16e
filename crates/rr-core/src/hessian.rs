//! Hessian service seam and a finite-difference implementation.
//!
//! [`params_hess`](crate::params_hess) only needs *some* way to turn a scalar
//! objective into a matrix of second derivatives. Callers may plug in their
//! own differentiation backend through [`HessianService`]; the default
//! [`FiniteDiffHessian`] uses step-scaled second differences.

use ndarray::{Array1, Array2};
use rr_common::{Error, Result};
use rr_config::HessianConfig;
use tracing::{debug, warn};

/// Scalar objective as seen by a Hessian service.
pub type Objective<'a> = dyn Fn(&Array1<f64>) -> Result<f64> + 'a;

/// Produces the Hessian of an objective at a point.
///
/// Errors returned by the objective must be passed through unchanged.
pub trait HessianService {
    fn evaluate(&self, objective: &Objective<'_>, point: &Array1<f64>) -> Result<Array2<f64>>;
}

/// Second-difference Hessian with a forward-difference fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteDiffHessian {
    /// Step for coordinate `i` is `relative_step * max(1, |x_i|)`.
    pub relative_step: f64,
    /// Retry one-sided differences when the central stencil is not finite.
    pub allow_forward_fallback: bool,
}

impl Default for FiniteDiffHessian {
    fn default() -> Self {
        Self::from_config(&HessianConfig::default())
    }
}

impl FiniteDiffHessian {
    pub fn from_config(config: &HessianConfig) -> Self {
        Self {
            relative_step: config.relative_step,
            allow_forward_fallback: config.allow_forward_fallback,
        }
    }

    fn steps(&self, point: &Array1<f64>) -> Vec<f64> {
        point
            .iter()
            .map(|&x| self.relative_step * x.abs().max(1.0))
            .collect()
    }

    /// Central stencil: `O(h²)` truncation error.
    ///
    /// Diagonal: `(f(x+hᵢ) - 2f(x) + f(x-hᵢ)) / hᵢ²`.
    /// Off-diagonal: `(f(++) - f(+-) - f(-+) + f(--)) / 4hᵢhⱼ`.
    fn central(&self, f: &Objective<'_>, x: &Array1<f64>, f0: f64) -> Result<Array2<f64>> {
        let n = x.len();
        let h = self.steps(x);
        let mut hess = Array2::<f64>::zeros((n, n));

        for i in 0..n {
            let up = f(&shifted(x, &[(i, h[i])]))?;
            let down = f(&shifted(x, &[(i, -h[i])]))?;
            hess[[i, i]] = (up - 2.0 * f0 + down) / (h[i] * h[i]);

            for j in (i + 1)..n {
                let pp = f(&shifted(x, &[(i, h[i]), (j, h[j])]))?;
                let pm = f(&shifted(x, &[(i, h[i]), (j, -h[j])]))?;
                let mp = f(&shifted(x, &[(i, -h[i]), (j, h[j])]))?;
                let mm = f(&shifted(x, &[(i, -h[i]), (j, -h[j])]))?;
                let value = (pp - pm - mp + mm) / (4.0 * h[i] * h[j]);
                hess[[i, j]] = value;
                hess[[j, i]] = value;
            }
        }
        Ok(hess)
    }

    /// One-sided stencil that only moves up from `x`; `O(h)` truncation error.
    fn forward(&self, f: &Objective<'_>, x: &Array1<f64>, f0: f64) -> Result<Array2<f64>> {
        let n = x.len();
        let h = self.steps(x);
        let mut single = Vec::with_capacity(n);
        for i in 0..n {
            single.push(f(&shifted(x, &[(i, h[i])]))?);
        }

        let mut hess = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            let twice = f(&shifted(x, &[(i, 2.0 * h[i])]))?;
            hess[[i, i]] = (twice - 2.0 * single[i] + f0) / (h[i] * h[i]);

            for j in (i + 1)..n {
                let both = f(&shifted(x, &[(i, h[i]), (j, h[j])]))?;
                let value = (both - single[i] - single[j] + f0) / (h[i] * h[j]);
                hess[[i, j]] = value;
                hess[[j, i]] = value;
            }
        }
        Ok(hess)
    }
}

impl HessianService for FiniteDiffHessian {
    fn evaluate(&self, objective: &Objective<'_>, point: &Array1<f64>) -> Result<Array2<f64>> {
        if point.is_empty() {
            return Err(Error::InvalidInput(
                "cannot differentiate at an empty parameter vector".to_string(),
            ));
        }
        if point.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "parameter vector contains non-finite entries: {}",
                point
            )));
        }
        if !self.relative_step.is_finite() || self.relative_step <= 0.0 {
            return Err(Error::Differentiation(format!(
                "relative step must be positive, got {}",
                self.relative_step
            )));
        }

        let f0 = objective(point)?;
        if !f0.is_finite() {
            return Err(Error::NonFiniteObjective(format!(
                "objective is {} at {}",
                f0, point
            )));
        }

        let hess = self.central(objective, point, f0)?;
        if all_finite(&hess) {
            debug!(dim = point.len(), "central-difference hessian computed");
            return Ok(hess);
        }

        if !self.allow_forward_fallback {
            return Err(Error::Differentiation(
                "central-difference hessian is not finite".to_string(),
            ));
        }

        warn!(
            dim = point.len(),
            "central-difference hessian not finite, retrying with forward differences"
        );
        let hess = self.forward(objective, point, f0)?;
        if all_finite(&hess) {
            Ok(hess)
        } else {
            Err(Error::Differentiation(
                "central and forward-difference hessians are both non-finite".to_string(),
            ))
        }
    }
}

fn shifted(x: &Array1<f64>, moves: &[(usize, f64)]) -> Array1<f64> {
    let mut out = x.clone();
    for &(idx, delta) in moves {
        out[idx] += delta;
    }
    out
}

fn all_finite(m: &Array2<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::cell::Cell;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
    }

    fn assert_matrix_close(actual: &Array2<f64>, expected: &Array2<f64>, tol: f64) {
        assert_eq!(actual.dim(), expected.dim());
        for ((idx, a), b) in actual.indexed_iter().zip(expected.iter()) {
            assert!(approx_eq(*a, *b, tol), "entry {:?}: {} vs {}", idx, a, b);
        }
    }

    // f(x, y) = 3x² + 2xy + 5y² has Hessian [[6, 2], [2, 10]] everywhere.
    fn quadratic(x: &Array1<f64>) -> Result<f64> {
        Ok(3.0 * x[0] * x[0] + 2.0 * x[0] * x[1] + 5.0 * x[1] * x[1])
    }

    #[test]
    fn quadratic_hessian_is_recovered() {
        let service = FiniteDiffHessian::default();
        let hess = service.evaluate(&quadratic, &array![0.7, -1.3]).unwrap();
        assert_matrix_close(&hess, &array![[6.0, 2.0], [2.0, 10.0]], 1e-5);
    }

    #[test]
    fn large_coordinates_use_scaled_steps() {
        let service = FiniteDiffHessian::default();
        let hess = service.evaluate(&quadratic, &array![250.0, -40.0]).unwrap();
        assert_matrix_close(&hess, &array![[6.0, 2.0], [2.0, 10.0]], 1e-4);
    }

    #[test]
    fn smooth_non_quadratic_objective() {
        // f = exp(x) + x·y³, H = [[e^x, 3y²], [3y², 6xy]]
        let f = |p: &Array1<f64>| -> Result<f64> { Ok(p[0].exp() + p[0] * p[1].powi(3)) };
        let (x, y) = (0.4, 1.1);
        let service = FiniteDiffHessian::default();
        let hess = service.evaluate(&f, &array![x, y]).unwrap();
        let expected = array![
            [x.exp(), 3.0 * y * y],
            [3.0 * y * y, 6.0 * x * y]
        ];
        assert_matrix_close(&hess, &expected, 1e-5);
    }

    #[test]
    fn result_is_symmetric() {
        let f = |p: &Array1<f64>| -> Result<f64> { Ok((p[0] * p[1]).sin() + p[2] * p[0].powi(2)) };
        let hess = FiniteDiffHessian::default()
            .evaluate(&f, &array![0.3, 0.9, -0.2])
            .unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(hess[[i, j]], hess[[j, i]]);
            }
        }
    }

    #[test]
    fn objective_error_propagates_unchanged() {
        let calls = Cell::new(0usize);
        let f = |p: &Array1<f64>| -> Result<f64> {
            calls.set(calls.get() + 1);
            if calls.get() > 2 {
                return Err(Error::Likelihood("solver diverged".to_string()));
            }
            quadratic(p)
        };
        let err = FiniteDiffHessian::default()
            .evaluate(&f, &array![1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, Error::Likelihood(ref msg) if msg == "solver diverged"));
    }

    #[test]
    fn falls_back_to_forward_differences_at_domain_edge() {
        // ln(x) + ln(y) is undefined just below the point on the x axis.
        let f = |p: &Array1<f64>| -> Result<f64> {
            if p[0] < 1.0 {
                Ok(f64::NAN)
            } else {
                Ok(p[0].ln() + p[1] * p[1])
            }
        };
        let hess = FiniteDiffHessian::default()
            .evaluate(&f, &array![1.0, 0.5])
            .unwrap();
        assert!(approx_eq(hess[[0, 0]], -1.0, 1e-3), "got {}", hess[[0, 0]]);
        assert!(approx_eq(hess[[1, 1]], 2.0, 1e-3), "got {}", hess[[1, 1]]);
        assert!(hess[[0, 1]].abs() < 1e-3);
    }

    #[test]
    fn fallback_can_be_disabled() {
        let f = |p: &Array1<f64>| -> Result<f64> {
            if p[0] < 1.0 {
                Ok(f64::NAN)
            } else {
                Ok(p[0].ln())
            }
        };
        let service = FiniteDiffHessian {
            allow_forward_fallback: false,
            ..FiniteDiffHessian::default()
        };
        let err = service.evaluate(&f, &array![1.0]).unwrap_err();
        assert!(matches!(err, Error::Differentiation(_)));
    }

    #[test]
    fn non_finite_at_point_is_rejected() {
        let f = |_: &Array1<f64>| -> Result<f64> { Ok(f64::INFINITY) };
        let err = FiniteDiffHessian::default()
            .evaluate(&f, &array![0.0])
            .unwrap_err();
        assert!(matches!(err, Error::NonFiniteObjective(_)));
    }

    #[test]
    fn empty_or_non_finite_point_is_invalid() {
        let service = FiniteDiffHessian::default();
        assert!(matches!(
            service.evaluate(&quadratic, &Array1::zeros(0)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.evaluate(&quadratic, &array![f64::NAN, 1.0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn from_config_copies_settings() {
        let config = HessianConfig {
            relative_step: 1e-3,
            allow_forward_fallback: false,
        };
        let service = FiniteDiffHessian::from_config(&config);
        assert_eq!(service.relative_step, 1e-3);
        assert!(!service.allow_forward_fallback);
    }
}
