//! Inter-rater reliability via Fleiss' kappa.
//!
//! Fleiss' kappa measures chance-corrected agreement between multiple
//! raters over categorical judgments. Here each subject is one comparison
//! and the categories are the three possible choices {A, B, Equal}; a
//! kappa is computed independently per evaluation dimension.
//!
//! # Examples
//!
//! ```
//! use cotejar::reliability::{fleiss_kappa, interpret_kappa, KappaInterpretation};
//!
//! // Three comparisons, three raters each, unanimous every time.
//! let matrix = vec![[3, 0, 0], [0, 3, 0], [3, 0, 0]];
//! let kappa = fleiss_kappa(&matrix).expect("eligible rows present");
//! assert!((kappa - 1.0).abs() < 1e-12);
//! assert_eq!(interpret_kappa(kappa), KappaInterpretation::AlmostPerfect);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::comparison::{Choice, Comparison, Dimension, EvaluationResult};

/// Number of vote categories per subject: {A, B, Equal}.
pub const N_CATEGORIES: usize = 3;

/// Agreement bands for interpreting a kappa value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KappaInterpretation {
    Poor,
    Slight,
    Fair,
    Moderate,
    Substantial,
    AlmostPerfect,
}

impl KappaInterpretation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KappaInterpretation::Poor => "poor agreement",
            KappaInterpretation::Slight => "slight agreement",
            KappaInterpretation::Fair => "fair agreement",
            KappaInterpretation::Moderate => "moderate agreement",
            KappaInterpretation::Substantial => "substantial agreement",
            KappaInterpretation::AlmostPerfect => "almost perfect agreement",
        }
    }
}

impl std::fmt::Display for KappaInterpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpretation bands: <0 poor, [0, 0.20) slight, [0.20, 0.40) fair,
/// [0.40, 0.60) moderate, [0.60, 0.80) substantial, >=0.80 almost perfect.
#[must_use]
pub fn interpret_kappa(kappa: f64) -> KappaInterpretation {
    if kappa < 0.0 {
        KappaInterpretation::Poor
    } else if kappa < 0.20 {
        KappaInterpretation::Slight
    } else if kappa < 0.40 {
        KappaInterpretation::Fair
    } else if kappa < 0.60 {
        KappaInterpretation::Moderate
    } else if kappa < 0.80 {
        KappaInterpretation::Substantial
    } else {
        KappaInterpretation::AlmostPerfect
    }
}

/// Fleiss' kappa over a subjects x categories vote-count matrix.
///
/// Rows with fewer than 2 raters are excluded (agreement needs at least
/// two opinions); `None` when no eligible rows remain, an explicit
/// "undefined" rather than a spurious value.
///
/// Per-subject agreement uses each row's own rater count, so matrices
/// with unequal raters per subject are handled; with equal counts this is
/// exactly the classical Fleiss formula. `P_e >= 1` (all votes in one
/// category by construction) is defined as kappa = 1.0.
#[must_use]
pub fn fleiss_kappa(matrix: &[[u64; N_CATEGORIES]]) -> Option<f64> {
    let eligible: Vec<&[u64; N_CATEGORIES]> = matrix
        .iter()
        .filter(|row| row.iter().sum::<u64>() >= 2)
        .collect();
    if eligible.is_empty() {
        return None;
    }

    let total_votes: u64 = eligible.iter().map(|row| row.iter().sum::<u64>()).sum();

    // p_j: proportion of all votes falling in category j.
    let mut p_e_bar = 0.0;
    for j in 0..N_CATEGORIES {
        let votes_j: u64 = eligible.iter().map(|row| row[j]).sum();
        let p_j = votes_j as f64 / total_votes as f64;
        p_e_bar += p_j * p_j;
    }

    // P_i: observed within-subject agreement.
    let p_bar = eligible
        .iter()
        .map(|row| {
            let n_i: u64 = row.iter().sum();
            let sum_sq: u64 = row.iter().map(|&c| c * c).sum();
            (sum_sq - n_i) as f64 / (n_i * (n_i - 1)) as f64
        })
        .sum::<f64>()
        / eligible.len() as f64;

    if p_e_bar >= 1.0 {
        // All votes in a single category: agreement by construction.
        return Some(1.0);
    }
    Some((p_bar - p_e_bar) / (1.0 - p_e_bar))
}

/// Fleiss' kappa per canonical dimension over an evaluation snapshot.
///
/// Builds one vote matrix per dimension: one row per comparison, columns
/// counting {A, B, Equal} choices across its evaluators. A record missing
/// a dimension entry votes Equal, preserving how historical analyses
/// tallied partial responses. Dimensions with no eligible comparisons are
/// absent from the result.
#[must_use]
pub fn kappa_by_dimension(
    comparisons: &[Comparison],
    results: &[EvaluationResult],
) -> BTreeMap<Dimension, f64> {
    let mut by_comparison: BTreeMap<Uuid, Vec<&EvaluationResult>> = BTreeMap::new();
    for result in results {
        by_comparison
            .entry(result.comparison_id)
            .or_default()
            .push(result);
    }
    let known: std::collections::HashSet<Uuid> = comparisons.iter().map(|c| c.id).collect();

    let mut kappas = BTreeMap::new();
    for dimension in Dimension::ALL {
        let mut matrix: Vec<[u64; N_CATEGORIES]> = Vec::new();
        for (comparison_id, group) in &by_comparison {
            if !known.contains(comparison_id) || group.len() < 2 {
                continue;
            }
            let mut votes = [0u64; N_CATEGORIES];
            for result in group {
                let choice = result
                    .dimension_scores
                    .get(dimension.as_str())
                    .copied()
                    .unwrap_or(Choice::Equal);
                match choice {
                    Choice::A => votes[0] += 1,
                    Choice::B => votes[1] += 1,
                    Choice::Equal => votes[2] += 1,
                }
            }
            matrix.push(votes);
        }
        if let Some(kappa) = fleiss_kappa(&matrix) {
            kappas.insert(dimension, kappa);
        }
    }
    kappas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonRandomizer;
    use crate::scenario::get_scenario;
    use std::collections::BTreeMap as Map;

    #[test]
    fn test_unanimous_votes_give_kappa_one() {
        let matrix = vec![[3, 0, 0], [0, 3, 0], [0, 0, 3], [3, 0, 0]];
        let kappa = fleiss_kappa(&matrix).expect("eligible rows");
        assert!((kappa - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_category_degenerate_case() {
        // Every vote lands in category A: P_e = 1, defined as kappa = 1.
        let matrix = vec![[3, 0, 0], [3, 0, 0]];
        let kappa = fleiss_kappa(&matrix).expect("eligible rows");
        assert!((kappa - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_below_two_raters_excluded() {
        let matrix = vec![[1, 0, 0], [0, 1, 0]];
        assert!(fleiss_kappa(&matrix).is_none());

        let matrix = vec![[1, 0, 0], [2, 0, 0], [0, 2, 0]];
        // Only the two 2-rater rows count and both are unanimous.
        let kappa = fleiss_kappa(&matrix).expect("eligible rows");
        assert!((kappa - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_matrix_undefined() {
        assert!(fleiss_kappa(&[]).is_none());
    }

    #[test]
    fn test_known_fleiss_example() {
        // Fleiss (1971)-style check against a hand-computed value:
        // two categories used evenly across 4 subjects, 2 raters each.
        let matrix = vec![[2, 0, 0], [0, 2, 0], [2, 0, 0], [0, 2, 0]];
        // Unanimous rows, votes split 50/50 overall:
        // P_bar = 1, P_e = 0.5 -> kappa = 1.
        let kappa = fleiss_kappa(&matrix).expect("eligible rows");
        assert!((kappa - 1.0).abs() < 1e-12);

        // Full disagreement on every subject: P_bar = 0,
        // P_e = 0.5 -> kappa = -1.
        let matrix = vec![[1, 1, 0], [1, 1, 0]];
        let kappa = fleiss_kappa(&matrix).expect("eligible rows");
        assert!((kappa + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mixed_agreement_in_range() {
        let matrix = vec![[2, 1, 0], [1, 2, 0], [0, 1, 2], [3, 0, 0]];
        let kappa = fleiss_kappa(&matrix).expect("eligible rows");
        assert!(kappa > -1.0 && kappa < 1.0);
    }

    #[test]
    fn test_interpretation_bands() {
        assert_eq!(interpret_kappa(-0.1), KappaInterpretation::Poor);
        assert_eq!(interpret_kappa(0.0), KappaInterpretation::Slight);
        assert_eq!(interpret_kappa(0.19), KappaInterpretation::Slight);
        assert_eq!(interpret_kappa(0.20), KappaInterpretation::Fair);
        assert_eq!(interpret_kappa(0.40), KappaInterpretation::Moderate);
        assert_eq!(interpret_kappa(0.60), KappaInterpretation::Substantial);
        assert_eq!(interpret_kappa(0.80), KappaInterpretation::AlmostPerfect);
        assert_eq!(interpret_kappa(1.0), KappaInterpretation::AlmostPerfect);
    }

    #[test]
    fn test_kappa_by_dimension_unanimous_evaluators() {
        let scenario = get_scenario("basic_forward").expect("catalog scenario");
        let mut randomizer = ComparisonRandomizer::new().with_random_state(4);
        let experiment_id = Uuid::new_v4();

        let comparisons: Vec<Comparison> = (0..3)
            .map(|_| {
                randomizer
                    .create_comparison(experiment_id, "m1", "m2", &scenario)
                    .expect("valid comparison")
            })
            .collect();

        let mut results = Vec::new();
        for comparison in &comparisons {
            for evaluator in ["e1", "e2", "e3"] {
                let mut scores = Map::new();
                scores.insert("overall_quality".to_string(), Choice::A);
                results.push(EvaluationResult::new(comparison.id, evaluator, scores, 50.0));
            }
        }

        let kappas = kappa_by_dimension(&comparisons, &results);
        let kappa = kappas[&Dimension::OverallQuality];
        assert!((kappa - 1.0).abs() < 1e-12);
        // Missing entries default to Equal votes, which are also
        // unanimous here.
        assert!((kappas[&Dimension::Controllability] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kappa_by_dimension_requires_two_raters() {
        let scenario = get_scenario("basic_forward").expect("catalog scenario");
        let mut randomizer = ComparisonRandomizer::new().with_random_state(4);
        let comparison = randomizer
            .create_comparison(Uuid::new_v4(), "m1", "m2", &scenario)
            .expect("valid comparison");

        let mut scores = Map::new();
        scores.insert("overall_quality".to_string(), Choice::A);
        let results = vec![EvaluationResult::new(comparison.id, "e1", scores, 50.0)];

        let kappas = kappa_by_dimension(std::slice::from_ref(&comparison), &results);
        assert!(kappas.is_empty());
    }
}
