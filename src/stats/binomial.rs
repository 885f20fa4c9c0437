//! Exact binomial test for pairwise model comparison.
//!
//! Tests whether model A's win count is compatible with the null
//! hypothesis of evenly matched models (p = 0.5).
//!
//! # Examples
//!
//! ```
//! use cotejar::stats::binomial::binomial_test;
//!
//! let result = binomial_test(10, 0, 0, true);
//! assert!(result.p_value < 0.01);
//! assert!((result.win_rate_a - 1.0).abs() < 1e-12);
//! assert!(result.significant);
//! ```

use serde::{Deserialize, Serialize};

use crate::stats::distributions::{binomial_ppf, binomial_two_sided_pvalue};

/// Result of a two-sided exact binomial test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinomialTestResult {
    /// Two-sided exact p-value against p = 0.5
    pub p_value: f64,
    /// Observed win rate of model A (k / n)
    pub win_rate_a: f64,
    /// Lower bound of the 95% interval, as a fraction of n
    pub ci_lower: f64,
    /// Upper bound of the 95% interval, as a fraction of n
    pub ci_upper: f64,
    /// Whether p < 0.05
    pub significant: bool,
}

/// Two-sided exact binomial test on a win/loss/tie tally.
///
/// With `exclude_ties`, ties are dropped (n = wins_a + wins_b, k = wins_a).
/// Otherwise ties are split evenly: k gains ties/2 and n includes all
/// ties. The even split is preserved exactly as historical analyses used
/// it; the resulting half-integer k is evaluated through the continuous
/// extension of the binomial pmf.
///
/// n = 0 is a defined default, not an error: p = 1.0, win rate 0.5,
/// interval [0, 1], not significant.
#[must_use]
pub fn binomial_test(wins_a: u64, wins_b: u64, ties: u64, exclude_ties: bool) -> BinomialTestResult {
    let (n, k) = if exclude_ties {
        (wins_a + wins_b, wins_a as f64)
    } else {
        (wins_a + wins_b + ties, wins_a as f64 + ties as f64 / 2.0)
    };

    if n == 0 {
        return BinomialTestResult {
            p_value: 1.0,
            win_rate_a: 0.5,
            ci_lower: 0.0,
            ci_upper: 1.0,
            significant: false,
        };
    }

    let p_value = binomial_two_sided_pvalue(k, n);
    let win_rate = k / n as f64;

    // 95% interval from the binomial quantile at the observed rate,
    // reported as a fraction of n.
    let ci_lower = binomial_ppf(0.025, n, win_rate) as f64 / n as f64;
    let ci_upper = binomial_ppf(0.975, n, win_rate) as f64 / n as f64;

    BinomialTestResult {
        p_value,
        win_rate_a: win_rate,
        ci_lower,
        ci_upper,
        significant: p_value < 0.05,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_sweep_is_significant() {
        let result = binomial_test(10, 0, 0, true);
        assert!(result.p_value < 0.01);
        assert!((result.win_rate_a - 1.0).abs() < 1e-12);
        assert!(result.significant);
        assert!((result.ci_lower - 1.0).abs() < 1e-12);
        assert!((result.ci_upper - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_data_defaults() {
        let result = binomial_test(0, 0, 0, true);
        assert!((result.p_value - 1.0).abs() < 1e-12);
        assert!((result.win_rate_a - 0.5).abs() < 1e-12);
        assert!((result.ci_lower - 0.0).abs() < 1e-12);
        assert!((result.ci_upper - 1.0).abs() < 1e-12);
        assert!(!result.significant);
    }

    #[test]
    fn test_even_split_not_significant() {
        let result = binomial_test(5, 5, 0, true);
        assert!((result.p_value - 1.0).abs() < 1e-12);
        assert!((result.win_rate_a - 0.5).abs() < 1e-12);
        assert!(!result.significant);
    }

    #[test]
    fn test_tie_splitting_included() {
        // 6 wins, 2 losses, 4 ties: k = 6 + 2 = 8, n = 12
        let result = binomial_test(6, 2, 4, false);
        assert!((result.win_rate_a - 8.0 / 12.0).abs() < 1e-12);
        // Fractional k from an odd tie count stays well-defined.
        let odd = binomial_test(6, 2, 3, false);
        assert!((odd.win_rate_a - 7.5 / 11.0).abs() < 1e-12);
        assert!(odd.p_value > 0.0 && odd.p_value <= 1.0);
    }

    #[test]
    fn test_excluding_ties_ignores_them() {
        let with_ties = binomial_test(7, 3, 100, true);
        let without = binomial_test(7, 3, 0, true);
        assert_eq!(with_ties, without);
    }

    #[test]
    fn test_known_scipy_value() {
        // scipy.stats.binomtest(7, 10, 0.5).pvalue = 0.34375
        let result = binomial_test(7, 3, 0, true);
        assert!((result.p_value - 0.343_75).abs() < 1e-9);
        assert!(!result.significant);
    }

    #[test]
    fn test_ci_brackets_win_rate() {
        let result = binomial_test(30, 12, 0, true);
        assert!(result.ci_lower <= result.win_rate_a);
        assert!(result.ci_upper >= result.win_rate_a);
        assert!(result.ci_lower >= 0.0 && result.ci_upper <= 1.0);
    }

    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_pvalue_in_unit_interval(wins_a in 0u64..200, wins_b in 0u64..200, ties in 0u64..50) {
                for exclude in [true, false] {
                    let r = binomial_test(wins_a, wins_b, ties, exclude);
                    prop_assert!(r.p_value >= 0.0 && r.p_value <= 1.0);
                    prop_assert!(r.ci_lower <= r.ci_upper);
                }
            }

            #[test]
            fn prop_symmetry(wins_a in 0u64..100, wins_b in 0u64..100) {
                let ab = binomial_test(wins_a, wins_b, 0, true);
                let ba = binomial_test(wins_b, wins_a, 0, true);
                prop_assert!((ab.p_value - ba.p_value).abs() < 1e-9);
            }
        }
    }
}
