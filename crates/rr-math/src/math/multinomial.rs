//! Multinomial covariance of estimated category proportions.
//!
//! For `p̂ = n / N` estimated from `N` trials:
//!
//! - `Var[p̂_i] = p_i (1 - p_i) / N`
//! - `Cov[p̂_i, p̂_j] = -p_i p_j / N`  (i ≠ j)
//!
//! Rows of the covariance sum to zero because `Σ p̂_i = 1` is fixed.

use ndarray::{Array1, Array2};
use rr_common::{Error, Result};

/// Covariance matrix of the proportion estimator for `n` trials.
pub fn cov_multinomial(n: u64, p: &[f64]) -> Result<Array2<f64>> {
    if n == 0 {
        return Err(Error::InvalidInput(
            "multinomial covariance needs at least one trial".to_string(),
        ));
    }
    if p.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
        return Err(Error::InvalidInput(format!(
            "probabilities must lie in [0, 1], got {:?}",
            p
        )));
    }

    let dim = p.len();
    let n = n as f64;
    let cov = Array2::from_shape_fn((dim, dim), |(i, j)| {
        if i == j {
            p[i] * (1.0 - p[i]) / n
        } else {
            -p[i] * p[j] / n
        }
    });
    Ok(cov)
}

/// Asymptotic standard errors of the proportions (square roots of the diagonal).
pub fn multinomial_standard_errors(n: u64, p: &[f64]) -> Result<Array1<f64>> {
    let cov = cov_multinomial(n, p)?;
    Ok(cov.diag().mapv(f64::sqrt))
}
