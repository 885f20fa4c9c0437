//! McNemar's test for paired model comparisons.
//!
//! Operates on a 2x2 correctness table over the same comparison set:
//! the off-diagonal discordant counts carry all the information about
//! which model is better.

use serde::{Deserialize, Serialize};

use crate::stats::distributions::{binomial_two_sided_pvalue, chi_square_survival_1df};

/// Discordant-count threshold below which the exact binomial form is used.
const EXACT_THRESHOLD: u64 = 25;

/// Result of McNemar's test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McNemarResult {
    /// Chi-square-style statistic (reported in both branches)
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Whether p < 0.05
    pub significant: bool,
    /// b/c over the discordant cells; infinite when c = 0, NaN when both
    /// discordant cells are empty
    pub odds_ratio: f64,
}

/// McNemar's test on a paired 2x2 correctness table:
///
/// ```text
/// [[both_correct, a_only_correct],
///  [b_only_correct, both_wrong]]
/// ```
///
/// With b + c = 0 there is no discordant evidence: statistic 0, p = 1.
/// Small discordant totals (b + c < 25) use the exact two-sided binomial
/// test on (b, b + c, 0.5); larger ones the continuity-corrected
/// chi-square approximation with 1 degree of freedom.
#[must_use]
pub fn mcnemar_test(table: [[u64; 2]; 2]) -> McNemarResult {
    let b = table[0][1];
    let c = table[1][0];
    let discordant = b + c;

    if discordant == 0 {
        return McNemarResult {
            statistic: 0.0,
            p_value: 1.0,
            significant: false,
            odds_ratio: f64::NAN,
        };
    }

    let b_f = b as f64;
    let c_f = c as f64;
    let n_f = discordant as f64;

    let (statistic, p_value) = if discordant < EXACT_THRESHOLD {
        let statistic = (b_f - c_f).powi(2) / n_f;
        (statistic, binomial_two_sided_pvalue(b_f, discordant))
    } else {
        // Continuity correction clamped at zero so b = c stays exactly
        // null in this branch too.
        let statistic = ((b_f - c_f).abs() - 1.0).max(0.0).powi(2) / n_f;
        (statistic, chi_square_survival_1df(statistic))
    };

    let odds_ratio = if c == 0 { f64::INFINITY } else { b_f / c_f };

    McNemarResult {
        statistic,
        p_value,
        significant: p_value < 0.05,
        odds_ratio,
    }
}
