//! Numerically careful primitives for likelihood evaluation.

/// Tolerance used when checking that a probability vector sums to one.
pub const PROB_SUM_TOL: f64 = 1e-9;

/// `x * ln(y)` with the convention `0 * ln(y) = 0` for any `y >= 0`.
///
/// Returns NaN for negative or NaN `y`, and for NaN `x`. A positive `x` with
/// `y == 0` yields `-inf`; callers decide whether that is an error.
pub fn xlogy(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() || y < 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }
    x * y.ln()
}

/// Sum of a slice, accumulated with Neumaier compensation.
///
/// Probability vectors built from large counts lose low-order bits with a
/// naive fold; this keeps the row-sum check tight.
pub fn compensated_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut c = 0.0;
    for &v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            c += (sum - t) + v;
        } else {
            c += (v - t) + sum;
        }
        sum = t;
    }
    sum + c
}

/// True when every entry lies in [0, 1] and the entries sum to one within `tol`.
pub fn is_probability_vector(p: &[f64], tol: f64) -> bool {
    if p.is_empty() {
        return false;
    }
    if p.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
        return false;
    }
    (compensated_sum(p) - 1.0).abs() <= tol
}
