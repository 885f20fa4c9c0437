//! Bootstrap confidence interval for a difference in means.
//!
//! Non-parametric: resamples each score set independently with
//! replacement and reads the interval off the empirical distribution of
//! mean differences. Reference: Efron (1979), "Bootstrap Methods: Another
//! Look at the Jackknife".
//!
//! # Examples
//!
//! ```
//! use cotejar::stats::bootstrap::BootstrapCi;
//!
//! let a = vec![0.9, 0.8, 1.0, 0.85, 0.95, 0.9];
//! let b = vec![0.2, 0.3, 0.1, 0.25, 0.15, 0.2];
//!
//! let result = BootstrapCi::new()
//!     .with_random_state(42)
//!     .run(&a, &b)
//!     .expect("non-empty samples");
//! assert!(result.mean_diff > 0.5);
//! assert!(result.significant);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{CotejarError, Result};

/// Result of a bootstrap mean-difference analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    /// Observed mean(a) - mean(b)
    pub mean_diff: f64,
    /// Lower percentile bound of the bootstrap distribution
    pub ci_lower: f64,
    /// Upper percentile bound of the bootstrap distribution
    pub ci_upper: f64,
    /// Two-sided sign-based p-value, capped at 1.0
    pub p_value: f64,
    /// Whether the interval excludes zero
    pub significant: bool,
}

/// Configurable bootstrap estimator for the difference of two means.
///
/// Resampling is driven by a PRNG scoped to a single [`run`](Self::run)
/// invocation; fixing the seed makes the whole result bit-reproducible.
#[derive(Debug, Clone)]
pub struct BootstrapCi {
    n_bootstrap: usize,
    confidence_level: f64,
    random_state: Option<u64>,
}

impl Default for BootstrapCi {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapCi {
    /// Default configuration: 10,000 resamples at 95% confidence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_bootstrap: 10_000,
            confidence_level: 0.95,
            random_state: None,
        }
    }

    /// Set the number of bootstrap resamples.
    #[must_use]
    pub fn with_n_bootstrap(mut self, n_bootstrap: usize) -> Self {
        self.n_bootstrap = n_bootstrap;
        self
    }

    /// Set the confidence level (e.g. 0.95 for a 95% interval).
    #[must_use]
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Set random state for reproducible resampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Bootstrap the difference mean(a) - mean(b).
    ///
    /// # Errors
    ///
    /// `InsufficientData` if either sample is empty; a mean difference
    /// over nothing is a data-integrity bug upstream, not a measurement.
    pub fn run(&self, scores_a: &[f64], scores_b: &[f64]) -> Result<BootstrapResult> {
        if scores_a.is_empty() || scores_b.is_empty() {
            return Err(CotejarError::InsufficientData {
                context: "bootstrap mean difference".to_string(),
                required: 1,
                available: scores_a.len().min(scores_b.len()),
            });
        }

        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let observed = mean(scores_a) - mean(scores_b);

        let mut diffs = Vec::with_capacity(self.n_bootstrap);
        for _ in 0..self.n_bootstrap {
            let resampled_a = resample_mean(scores_a, &mut rng);
            let resampled_b = resample_mean(scores_b, &mut rng);
            diffs.push(resampled_a - resampled_b);
        }

        let alpha = 1.0 - self.confidence_level;
        let ci_lower = percentile(&diffs, alpha / 2.0);
        let ci_upper = percentile(&diffs, 1.0 - alpha / 2.0);

        // Two-sided sign-based p: fraction of the bootstrap distribution
        // on the opposite side of zero from the observed difference.
        let n_f = diffs.len() as f64;
        let p_value = if observed > 0.0 {
            2.0 * diffs.iter().filter(|&&d| d <= 0.0).count() as f64 / n_f
        } else {
            2.0 * diffs.iter().filter(|&&d| d >= 0.0).count() as f64 / n_f
        };

        Ok(BootstrapResult {
            mean_diff: observed,
            ci_lower,
            ci_upper,
            p_value: p_value.min(1.0),
            significant: 0.0 < ci_lower || ci_upper < 0.0,
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of one resample-with-replacement of `values`.
fn resample_mean(values: &[f64], rng: &mut StdRng) -> f64 {
    let n = values.len();
    let mut total = 0.0;
    for _ in 0..n {
        total += values[rng.gen_range(0..n)];
    }
    total / n as f64
}

/// Percentile with linear interpolation between order statistics.
fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let p = p.clamp(0.0, 1.0);
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let idx = p * (n - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clearly_separated_samples() {
        let a = vec![0.9, 0.85, 0.95, 0.88, 0.92, 0.91, 0.87, 0.9];
        let b = vec![0.1, 0.15, 0.05, 0.12, 0.08, 0.09, 0.13, 0.1];
        let result = BootstrapCi::new()
            .with_random_state(42)
            .run(&a, &b)
            .expect("non-empty samples");
        assert!(result.mean_diff > 0.7);
        assert!(result.ci_lower > 0.0);
        assert!(result.significant);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_identical_samples_not_significant() {
        let a = vec![0.5, 0.6, 0.4, 0.55, 0.45, 0.5];
        let result = BootstrapCi::new()
            .with_random_state(7)
            .run(&a, &a)
            .expect("non-empty samples");
        assert!((result.mean_diff - 0.0).abs() < 1e-12);
        assert!(!result.significant);
        assert!(result.ci_lower <= 0.0 && result.ci_upper >= 0.0);
    }

    #[test]
    fn test_reproducible_under_seed() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![2.0, 3.0, 4.0, 5.0];
        let r1 = BootstrapCi::new()
            .with_random_state(123)
            .run(&a, &b)
            .expect("non-empty samples");
        let r2 = BootstrapCi::new()
            .with_random_state(123)
            .run(&a, &b)
            .expect("non-empty samples");
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_empty_sample_is_an_error() {
        let err = BootstrapCi::new()
            .run(&[], &[1.0])
            .expect_err("empty sample rejected");
        assert!(matches!(err, CotejarError::InsufficientData { .. }));
    }

    #[test]
    fn test_p_value_capped_at_one() {
        let a = vec![0.5; 6];
        let result = BootstrapCi::new()
            .with_random_state(1)
            .with_n_bootstrap(500)
            .run(&a, &a)
            .expect("non-empty samples");
        assert!(result.p_value <= 1.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = vec![0.0, 1.0];
        assert!((percentile(&values, 0.25) - 0.25).abs() < 1e-12);
        assert!((percentile(&values, 0.75) - 0.75).abs() < 1e-12);
        assert!((percentile(&values, 0.0) - 0.0).abs() < 1e-12);
        assert!((percentile(&values, 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ci_ordering() {
        let a = vec![0.2, 0.4, 0.6, 0.8];
        let b = vec![0.3, 0.5, 0.7, 0.9];
        let result = BootstrapCi::new()
            .with_random_state(11)
            .run(&a, &b)
            .expect("non-empty samples");
        assert!(result.ci_lower <= result.ci_upper);
    }

    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]
            #[test]
            fn prop_ci_contains_reasonable_mass(
                a in prop::collection::vec(0.0..1.0f64, 3..20),
                b in prop::collection::vec(0.0..1.0f64, 3..20),
                seed: u64,
            ) {
                let result = BootstrapCi::new()
                    .with_random_state(seed)
                    .with_n_bootstrap(300)
                    .run(&a, &b)
                    .expect("non-empty samples");
                prop_assert!(result.ci_lower <= result.ci_upper);
                prop_assert!(result.p_value >= 0.0 && result.p_value <= 1.0);
            }
        }
    }
}
