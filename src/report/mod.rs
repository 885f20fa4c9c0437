//! Report compiler: one structured summary artifact per analysis pass.
//!
//! Pure aggregator over the other components' outputs: win-rate tables,
//! pairwise significance tests, reliability scores, and evaluator quality
//! profiles. Suspicious evaluators are flagged for manual review, never
//! auto-excluded: exclusion is a downstream decision, not made here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::{Aggregation, ModelScoreRecord};
use crate::comparison::{Choice, Comparison, EvaluationResult};
use crate::error::Result;
use crate::reliability::{interpret_kappa, kappa_by_dimension};
use crate::stats::binomial::{binomial_test, BinomialTestResult};

/// Average completion time below which an evaluator is flagged.
const FAST_COMPLETION_SECONDS: f64 = 30.0;

/// Response entropy below which an evaluator is flagged.
const LOW_ENTROPY_BITS: f64 = 0.5;

/// One (model, dimension) cell of the performance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub win_rate: f64,
    pub std_error: f64,
    pub n: usize,
}

/// Kappa value plus its interpretation band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KappaSummary {
    pub kappa: f64,
    pub interpretation: String,
}

/// Per-evaluator quality profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorProfile {
    pub evaluator_id: String,
    pub num_evaluations: usize,
    pub avg_completion_time: f64,
    /// Shannon entropy (bits) of the evaluator's choice distribution
    pub response_entropy: f64,
    pub unique_responses: usize,
    /// Review flags; an empty list means nothing looked suspicious
    pub flags: Vec<String>,
}

impl EvaluatorProfile {
    /// Whether any review flag was raised.
    #[must_use]
    pub fn flagged(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// The merged summary artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub total_evaluations: usize,
    pub unique_evaluators: usize,
    pub orphaned_records: usize,
    pub unknown_dimensions: usize,
    /// model -> dimension name -> score cell
    pub model_performance: BTreeMap<String, BTreeMap<String, DimensionScore>>,
    /// "<dimension>_<modelA>_vs_<modelB>" -> binomial test result
    pub significance: BTreeMap<String, BinomialTestResult>,
    /// dimension name -> kappa; dimensions without enough multi-rater
    /// comparisons are simply absent
    pub reliability: BTreeMap<String, KappaSummary>,
    pub evaluator_profiles: Vec<EvaluatorProfile>,
}

impl EvaluationReport {
    /// Serialize the report as a pretty-printed JSON artifact.
    ///
    /// # Errors
    ///
    /// `Serialization` if JSON encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compiles evaluation snapshots into [`EvaluationReport`]s.
#[derive(Debug, Clone)]
pub struct ReportCompiler {
    exclude_ties: bool,
}

impl Default for ReportCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportCompiler {
    /// Default configuration: ties excluded from pairwise significance
    /// tests.
    #[must_use]
    pub fn new() -> Self {
        Self { exclude_ties: true }
    }

    /// Include ties in the binomial tests (split evenly between sides).
    #[must_use]
    pub fn with_ties_included(mut self) -> Self {
        self.exclude_ties = false;
        self
    }

    /// Compile the full report for one snapshot.
    #[must_use]
    pub fn compile(
        &self,
        comparisons: &[Comparison],
        results: &[EvaluationResult],
    ) -> EvaluationReport {
        let aggregation = Aggregation::from_records(comparisons, results);

        let mut model_performance: BTreeMap<String, BTreeMap<String, DimensionScore>> =
            BTreeMap::new();
        for record in aggregation.score_records() {
            model_performance
                .entry(record.model_name.clone())
                .or_default()
                .insert(
                    record.dimension.as_str().to_string(),
                    DimensionScore {
                        win_rate: record.win_rate,
                        std_error: record.std_error,
                        n: record.n,
                    },
                );
        }

        let mut significance = BTreeMap::new();
        for pair in aggregation.pairwise_counts() {
            let key = format!(
                "{}_{}_vs_{}",
                pair.dimension, pair.model_a, pair.model_b
            );
            significance.insert(
                key,
                binomial_test(pair.wins_a, pair.wins_b, pair.ties, self.exclude_ties),
            );
        }

        let reliability = kappa_by_dimension(comparisons, results)
            .into_iter()
            .map(|(dimension, kappa)| {
                (
                    dimension.as_str().to_string(),
                    KappaSummary {
                        kappa,
                        interpretation: interpret_kappa(kappa).to_string(),
                    },
                )
            })
            .collect();

        let evaluator_profiles = evaluator_profiles(results);
        let unique_evaluators = evaluator_profiles.len();

        EvaluationReport {
            generated_at: Utc::now(),
            total_evaluations: results.len(),
            unique_evaluators,
            orphaned_records: aggregation.orphaned_records,
            unknown_dimensions: aggregation.unknown_dimensions,
            model_performance,
            significance,
            reliability,
            evaluator_profiles,
        }
    }
}

/// Per-evaluator quality profiles over all evaluation records.
///
/// Quality statistics intentionally cover every record, orphaned or not:
/// a rushed evaluator is rushed regardless of snapshot integrity.
#[must_use]
pub fn evaluator_profiles(results: &[EvaluationResult]) -> Vec<EvaluatorProfile> {
    #[derive(Default)]
    struct Tally {
        num_evaluations: usize,
        total_time: f64,
        choice_counts: BTreeMap<Choice, usize>,
    }

    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for result in results {
        let tally = tallies.entry(result.evaluator_id.clone()).or_default();
        tally.num_evaluations += 1;
        tally.total_time += result.completion_time_seconds;
        for &choice in result.dimension_scores.values() {
            *tally.choice_counts.entry(choice).or_insert(0) += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(evaluator_id, tally)| {
            let avg_completion_time = tally.total_time / tally.num_evaluations as f64;
            let response_entropy = shannon_entropy(&tally.choice_counts);
            let unique_responses = tally.choice_counts.len();

            let mut flags = Vec::new();
            if avg_completion_time < FAST_COMPLETION_SECONDS {
                flags.push("fast_completion".to_string());
            }
            if response_entropy < LOW_ENTROPY_BITS {
                flags.push("low_response_entropy".to_string());
            }

            EvaluatorProfile {
                evaluator_id,
                num_evaluations: tally.num_evaluations,
                avg_completion_time,
                response_entropy,
                unique_responses,
                flags,
            }
        })
        .collect()
}

/// Shannon entropy (bits) over a choice-count distribution; 0 when fewer
/// than two distinct choices were ever made.
fn shannon_entropy(counts: &BTreeMap<Choice, usize>) -> f64 {
    if counts.len() <= 1 {
        return 0.0;
    }
    let total: usize = counts.values().sum();
    -counts
        .values()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Render score records as a CSV table (the produced tabular artifact).
#[must_use]
pub fn score_records_csv(records: &[ModelScoreRecord]) -> String {
    let mut csv = String::from("model,dimension,win_rate,n,std_error\n");
    for record in records {
        csv.push_str(&format!(
            "{},{},{:.6},{},{:.6}\n",
            record.model_name, record.dimension, record.win_rate, record.n, record.std_error
        ));
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::{Comparison, ComparisonRandomizer, Dimension};
    use crate::scenario::get_scenario;
    use std::collections::BTreeMap as Map;
    use uuid::Uuid;

    fn snapshot() -> (Vec<Comparison>, Vec<EvaluationResult>) {
        let scenario = get_scenario("basic_forward").expect("catalog scenario");
        let mut randomizer = ComparisonRandomizer::new().with_random_state(8);
        let experiment_id = Uuid::new_v4();

        let comparisons: Vec<Comparison> = (0..4)
            .map(|_| {
                randomizer
                    .create_comparison(experiment_id, "m1", "m2", &scenario)
                    .expect("valid comparison")
            })
            .collect();

        let mut results = Vec::new();
        for comparison in &comparisons {
            for evaluator in ["e1", "e2", "e3"] {
                let choice = if comparison.randomized_labels.a == "m1" {
                    Choice::A
                } else {
                    Choice::B
                };
                let mut scores = Map::new();
                scores.insert("overall_quality".to_string(), choice);
                results.push(EvaluationResult::new(comparison.id, evaluator, scores, 55.0));
            }
        }
        (comparisons, results)
    }

    #[test]
    fn test_compile_merges_all_sections() {
        let (comparisons, results) = snapshot();
        let report = ReportCompiler::new().compile(&comparisons, &results);

        assert_eq!(report.total_evaluations, 12);
        assert_eq!(report.unique_evaluators, 3);
        assert_eq!(report.orphaned_records, 0);
        assert_eq!(report.unknown_dimensions, 0);

        let m1 = &report.model_performance["m1"]["overall_quality"];
        assert!((m1.win_rate - 1.0).abs() < 1e-12);
        assert_eq!(m1.n, 12);

        let sig = &report.significance["overall_quality_m1_vs_m2"];
        assert!(sig.significant);
        assert!((sig.win_rate_a - 1.0).abs() < 1e-12);

        let kappa = &report.reliability["overall_quality"];
        assert!((kappa.kappa - 1.0).abs() < 1e-12);
        assert_eq!(kappa.interpretation, "almost perfect agreement");
    }

    #[test]
    fn test_fast_evaluator_flagged_not_excluded() {
        let (comparisons, mut results) = snapshot();
        for result in results.iter_mut().filter(|r| r.evaluator_id == "e1") {
            result.completion_time_seconds = 5.0;
        }
        let report = ReportCompiler::new().compile(&comparisons, &results);

        let e1 = report
            .evaluator_profiles
            .iter()
            .find(|p| p.evaluator_id == "e1")
            .expect("e1 profiled");
        assert!(e1.flags.contains(&"fast_completion".to_string()));
        assert!(e1.flagged());

        // Still counted in aggregation: all 12 records contribute.
        assert_eq!(report.model_performance["m1"]["overall_quality"].n, 12);
    }

    #[test]
    fn test_constant_responder_has_low_entropy() {
        let (_, results) = snapshot();
        // Every evaluator here always picked the same true winner, but
        // label randomization varies the raw choice, so entropy can be
        // nonzero. Force a truly constant responder instead.
        let constant: Vec<EvaluationResult> = results
            .iter()
            .filter(|r| r.evaluator_id == "e1")
            .map(|r| {
                let mut clone = r.clone();
                clone
                    .dimension_scores
                    .insert("overall_quality".to_string(), Choice::A);
                clone
            })
            .collect();
        let profiles = evaluator_profiles(&constant);
        assert_eq!(profiles.len(), 1);
        assert!((profiles[0].response_entropy - 0.0).abs() < 1e-12);
        assert_eq!(profiles[0].unique_responses, 1);
        assert!(profiles[0]
            .flags
            .contains(&"low_response_entropy".to_string()));
    }

    #[test]
    fn test_entropy_of_balanced_choices_is_high() {
        let mut counts = BTreeMap::new();
        counts.insert(Choice::A, 10);
        counts.insert(Choice::B, 10);
        assert!((shannon_entropy(&counts) - 1.0).abs() < 1e-12);

        counts.insert(Choice::Equal, 10);
        assert!((shannon_entropy(&counts) - 3.0_f64.log2()).abs() < 1e-12);
    }

    #[test]
    fn test_report_json_round_trip() {
        let (comparisons, results) = snapshot();
        let report = ReportCompiler::new().compile(&comparisons, &results);
        let json = report.to_json().expect("report serializes");
        assert!(json.contains("overall_quality_m1_vs_m2"));
        let back: EvaluationReport = serde_json::from_str(&json).expect("report deserializes");
        assert_eq!(back.model_performance, report.model_performance);
    }

    #[test]
    fn test_csv_rendering() {
        let records = vec![ModelScoreRecord {
            model_name: "m1".to_string(),
            dimension: Dimension::VisualQuality,
            win_rate: 0.75,
            n: 8,
            std_error: 0.153_093,
        }];
        let csv = score_records_csv(&records);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("model,dimension,win_rate,n,std_error"));
        let row = lines.next().expect("data row");
        assert!(row.starts_with("m1,visual_quality,0.750000,8,"));
    }

    #[test]
    fn test_orphans_surface_in_report() {
        let (comparisons, mut results) = snapshot();
        results.push(EvaluationResult::new(Uuid::new_v4(), "e9", Map::new(), 40.0));
        let report = ReportCompiler::new().compile(&comparisons, &results);
        assert_eq!(report.orphaned_records, 1);
        assert_eq!(report.total_evaluations, 13);
    }
}
