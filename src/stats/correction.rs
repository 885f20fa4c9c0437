//! Multiple comparison correction over named p-values.
//!
//! Running one binomial test per (dimension, model pair) inflates the
//! family-wise false positive rate; these procedures correct the p-values
//! before significance is declared.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Family-wise / false-discovery-rate correction procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    /// Multiply by the number of tests
    Bonferroni,
    /// Step-down over ascending p-values
    Holm,
    /// Benjamini-Hochberg step-up false-discovery-rate control
    FdrBh,
}

impl CorrectionMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::Holm => "holm",
            CorrectionMethod::FdrBh => "fdr_bh",
        }
    }
}

impl std::fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One test's p-value after correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedPValue {
    pub original_p: f64,
    pub corrected_p: f64,
    /// Whether corrected_p < 0.05
    pub significant: bool,
    pub method: CorrectionMethod,
}

/// Apply a correction procedure to a map of named p-values.
///
/// Guarantees per method:
/// - Bonferroni: corrected = min(1, p * m), always >= the original p.
/// - Holm: step-down over ascending p with running-max enforcement, so
///   corrected values are monotonically non-decreasing in sorted-p order.
/// - FDR-BH: step-up with running-min enforcement from the largest
///   p-value down, same monotonicity guarantee.
#[must_use]
pub fn multiple_comparison_correction(
    p_values: &BTreeMap<String, f64>,
    method: CorrectionMethod,
) -> BTreeMap<String, CorrectedPValue> {
    let names: Vec<&String> = p_values.keys().collect();
    let raw: Vec<f64> = names.iter().map(|name| p_values[*name]).collect();
    let m = raw.len();
    if m == 0 {
        return BTreeMap::new();
    }

    // Indices of tests in ascending p order; stable for tied values.
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&i, &j| raw[i].partial_cmp(&raw[j]).unwrap_or(std::cmp::Ordering::Equal));

    let mut corrected = vec![0.0_f64; m];
    match method {
        CorrectionMethod::Bonferroni => {
            for (i, &p) in raw.iter().enumerate() {
                corrected[i] = (p * m as f64).min(1.0);
            }
        }
        CorrectionMethod::Holm => {
            let mut running_max = 0.0_f64;
            for (rank, &idx) in order.iter().enumerate() {
                let adjusted = ((m - rank) as f64 * raw[idx]).min(1.0);
                running_max = running_max.max(adjusted);
                corrected[idx] = running_max;
            }
        }
        CorrectionMethod::FdrBh => {
            let mut running_min = 1.0_f64;
            for (rank, &idx) in order.iter().enumerate().rev() {
                let adjusted = (raw[idx] * m as f64 / (rank + 1) as f64).min(1.0);
                running_min = running_min.min(adjusted);
                corrected[idx] = running_min;
            }
        }
    }

    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            (
                name.clone(),
                CorrectedPValue {
                    original_p: raw[i],
                    corrected_p: corrected[i],
                    significant: corrected[i] < 0.05,
                    method,
                },
            )
        })
        .collect()
}
