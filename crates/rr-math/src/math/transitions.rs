//! Maximum-likelihood estimation of state-increment probabilities.
//!
//! Each period the state either stays or increases by `k` bins. With the
//! increments treated as independent draws from a categorical distribution,
//! the count histogram is a sufficient statistic and the MLE is closed form:
//!
//! - Counts: `n_k = #{observations with increment k}`
//! - Probabilities: `p_k = n_k / Σ_j n_j`
//! - Negative log-likelihood: `-Σ_k n_k ln(p_k)`
//!
//! Zero-count bins contribute nothing to the likelihood (`0 · ln 0 = 0`), so a
//! fit on data that never shows some intermediate increment stays finite. A
//! positive count on a zero probability is reported as
//! [`Error::DegenerateProbability`] instead of returning `-inf`.

use super::stable::xlogy;
use ndarray::Array1;
use rr_common::{Error, Panel, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Result of the transition-probability estimation.
///
/// Field names follow the optimizer-result convention: `x` is the estimate,
/// `fun` the objective value at the estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEstimate {
    /// Estimated increment probabilities, indexed by increment size.
    pub x: Array1<f64>,
    /// Negative log-likelihood at `x`.
    pub fun: f64,
    /// Increment histogram the estimate was computed from.
    pub trans_count: Vec<u64>,
}

impl TransitionEstimate {
    /// Number of increments the estimate is based on.
    pub fn num_transitions(&self) -> u64 {
        self.trans_count.iter().sum()
    }

    /// Largest increment with support (histogram length minus one).
    pub fn max_increment(&self) -> usize {
        self.trans_count.len().saturating_sub(1)
    }
}

/// Largest usage increment accepted by [`count_transitions`].
///
/// Increments are discretized bins per period; the histogram, and every
/// transition matrix built from it, has one slot per bin up to this value.
pub const MAX_INCREMENT: usize = 1 << 16;

/// Tabulate usage increments into a histogram indexed by increment size.
///
/// `None` entries (terminal or replacement records) are dropped. Negative
/// values and values above [`MAX_INCREMENT`] are rejected.
pub fn count_transitions(usage: &[Option<i64>]) -> Result<Vec<u64>> {
    let mut bins = Vec::with_capacity(usage.len());
    for (index, value) in usage.iter().enumerate() {
        let Some(v) = *value else {
            continue;
        };
        if v < 0 {
            return Err(Error::NegativeIncrement { index, value: v });
        }
        let bin = usize::try_from(v)
            .ok()
            .filter(|&b| b <= MAX_INCREMENT)
            .ok_or(Error::IncrementTooLarge {
                index,
                value: v,
                limit: MAX_INCREMENT,
            })?;
        bins.push(bin);
    }

    let max = bins.iter().copied().max().ok_or(Error::EmptyPanel)?;
    let mut counts = vec![0u64; max + 1];
    for bin in bins {
        counts[bin] += 1;
    }
    Ok(counts)
}

/// Negative log-likelihood of increment counts under `probabilities`.
pub fn loglike(probabilities: &[f64], counts: &[u64]) -> Result<f64> {
    if probabilities.len() != counts.len() {
        return Err(Error::DimensionMismatch {
            expected: counts.len(),
            actual: probabilities.len(),
        });
    }

    let mut ll = 0.0;
    for (index, (&p, &n)) in probabilities.iter().zip(counts.iter()).enumerate() {
        if n == 0 {
            continue;
        }
        if !p.is_finite() || p <= 0.0 {
            return Err(Error::DegenerateProbability {
                index,
                count: n,
                probability: p,
            });
        }
        ll += xlogy(n as f64, p);
    }
    Ok(-ll)
}

/// Closed-form MLE from an increment histogram.
pub fn estimate_from_counts(counts: &[u64]) -> Result<TransitionEstimate> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return Err(Error::EmptyPanel);
    }

    let total_f = total as f64;
    let probs: Vec<f64> = counts.iter().map(|&n| n as f64 / total_f).collect();
    let fun = loglike(&probs, counts)?;

    let empty_bins = counts.iter().filter(|&&n| n == 0).count();
    if empty_bins > 0 {
        warn!(
            empty_bins,
            support = counts.len(),
            "increment histogram has unobserved bins; their probabilities are zero"
        );
    }
    debug!(
        transitions = total,
        support = counts.len(),
        neg_loglike = fun,
        "estimated transition probabilities"
    );

    Ok(TransitionEstimate {
        x: Array1::from(probs),
        fun,
        trans_count: counts.to_vec(),
    })
}

/// Estimate increment probabilities from a panel's usage column.
pub fn estimate_transitions(panel: &Panel) -> Result<TransitionEstimate> {
    let counts = count_transitions(&panel.usage())?;
    estimate_from_counts(&counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rr_common::{Decision, Observation};

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    // =======================================================================
    // count_transitions tests
    // =======================================================================

    #[test]
    fn count_drops_missing_entries() {
        let usage = [Some(0), Some(2), None, Some(1), Some(2), None];
        let counts = count_transitions(&usage).unwrap();
        assert_eq!(counts, vec![1, 1, 2]);
    }

    #[test]
    fn count_length_is_max_plus_one() {
        let usage = [Some(5)];
        let counts = count_transitions(&usage).unwrap();
        assert_eq!(counts.len(), 6);
        assert_eq!(counts[5], 1);
        assert!(counts[..5].iter().all(|&c| c == 0));
    }

    #[test]
    fn count_rejects_negative_increment() {
        let usage = [Some(1), None, Some(-2)];
        match count_transitions(&usage) {
            Err(Error::NegativeIncrement { index, value }) => {
                assert_eq!(index, 2);
                assert_eq!(value, -2);
            }
            other => panic!("expected NegativeIncrement, got {:?}", other),
        }
    }

    #[test]
    fn count_rejects_oversized_increment() {
        let usage = [Some(1), Some(i64::MAX)];
        match count_transitions(&usage) {
            Err(Error::IncrementTooLarge { index, value, limit }) => {
                assert_eq!(index, 1);
                assert_eq!(value, i64::MAX);
                assert_eq!(limit, MAX_INCREMENT);
            }
            other => panic!("expected IncrementTooLarge, got {:?}", other),
        }

        let err = count_transitions(&[Some(MAX_INCREMENT as i64 + 1)]).unwrap_err();
        assert_eq!(err.code(), 16);
        assert_eq!(err.category(), rr_common::ErrorCategory::Domain);
    }

    #[test]
    fn count_accepts_increment_at_limit() {
        let counts = count_transitions(&[Some(0), Some(MAX_INCREMENT as i64)]).unwrap();
        assert_eq!(counts.len(), MAX_INCREMENT + 1);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[MAX_INCREMENT], 1);
    }

    #[test]
    fn count_all_missing_is_empty_panel() {
        let usage = [None, None];
        assert!(matches!(count_transitions(&usage), Err(Error::EmptyPanel)));
        assert!(matches!(count_transitions(&[]), Err(Error::EmptyPanel)));
    }

    // =======================================================================
    // loglike tests
    // =======================================================================

    #[test]
    fn loglike_golden_value() {
        let ll = loglike(&[0.8, 0.2], &[10, 5]).unwrap();
        let expected = -(10.0 * 0.8f64.ln() + 5.0 * 0.2f64.ln());
        assert!(approx_eq(ll, expected, 1e-12));
    }

    #[test]
    fn loglike_zero_count_bin_contributes_nothing() {
        let with_empty = loglike(&[0.75, 0.0, 0.25], &[3, 0, 1]).unwrap();
        let without = loglike(&[0.75, 0.25], &[3, 1]).unwrap();
        assert!(approx_eq(with_empty, without, 1e-12));
        assert!(with_empty.is_finite());
    }

    #[test]
    fn loglike_positive_count_on_zero_probability_fails() {
        match loglike(&[1.0, 0.0], &[3, 2]) {
            Err(Error::DegenerateProbability { index, count, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(count, 2);
            }
            other => panic!("expected DegenerateProbability, got {:?}", other),
        }
    }

    #[test]
    fn loglike_rejects_nan_probability() {
        assert!(matches!(
            loglike(&[f64::NAN, 1.0], &[1, 1]),
            Err(Error::DegenerateProbability { index: 0, .. })
        ));
    }

    #[test]
    fn loglike_length_mismatch() {
        assert!(matches!(
            loglike(&[0.5, 0.5], &[1, 2, 3]),
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    // =======================================================================
    // estimate tests
    // =======================================================================

    #[test]
    fn estimate_normalizes_counts() {
        let est = estimate_from_counts(&[10, 5]).unwrap();
        assert!(approx_eq(est.x[0], 2.0 / 3.0, 1e-12));
        assert!(approx_eq(est.x[1], 1.0 / 3.0, 1e-12));
        assert_eq!(est.trans_count, vec![10, 5]);
        assert_eq!(est.num_transitions(), 15);
        assert_eq!(est.max_increment(), 1);
    }

    #[test]
    fn estimate_fun_matches_loglike() {
        let counts = [20, 50, 30];
        let est = estimate_from_counts(&counts).unwrap();
        let ll = loglike(&[0.2, 0.5, 0.3], &counts).unwrap();
        assert!(approx_eq(est.fun, ll, 1e-9));
    }

    #[test]
    fn estimate_with_unobserved_bin_is_finite() {
        let est = estimate_from_counts(&[4, 0, 1]).unwrap();
        assert_eq!(est.x[1], 0.0);
        assert!(est.fun.is_finite());
    }

    #[test]
    fn estimate_is_idempotent() {
        let counts = [7, 11, 2, 1];
        let a = estimate_from_counts(&counts).unwrap();
        let b = estimate_from_counts(&counts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn estimate_all_zero_counts_fails() {
        assert!(matches!(
            estimate_from_counts(&[0, 0]),
            Err(Error::EmptyPanel)
        ));
    }

    #[test]
    fn estimate_from_panel() {
        let panel = Panel::new(vec![
            Observation::new(1, 0, 0, Decision::Maintain, Some(1)),
            Observation::new(1, 1, 1, Decision::Maintain, Some(1)),
            Observation::new(1, 2, 2, Decision::Maintain, Some(0)),
            Observation::new(1, 3, 2, Decision::Replace, None),
        ]);
        let est = estimate_transitions(&panel).unwrap();
        assert_eq!(est.trans_count, vec![1, 2]);
        assert!(approx_eq(est.x[1], 2.0 / 3.0, 1e-12));
    }

    #[test]
    fn estimate_serializes_with_optimizer_keys() {
        let est = estimate_from_counts(&[1, 1]).unwrap();
        let value = serde_json::to_value(&est).unwrap();
        assert!(value.get("x").is_some());
        assert!(value.get("fun").is_some());
        assert_eq!(value["trans_count"], serde_json::json!([1, 1]));
    }
}
