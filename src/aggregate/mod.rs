//! Aggregation engine: from raw evaluation records to per-model outcomes.
//!
//! Converts a snapshot of [`Comparison`]s and [`EvaluationResult`]s into
//! per-(model, dimension) outcome lists, using each comparison's
//! de-randomization mapping to recover true model identity. Every
//! evaluation contributes exactly one scalar outcome per dimension per
//! model: 1 for a win, 0 for a loss, 0.5 for a tie.
//!
//! Aggregation is a pure function of its input snapshot: rerunning it over
//! the same records yields bit-identical output. Integrity anomalies
//! (orphaned records, unknown dimension names) are recovered locally,
//! logged, and surfaced as counts, never silently dropped.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;
use uuid::Uuid;

use crate::comparison::{Choice, Comparison, Dimension, EvaluationResult};
use crate::stats::bradley_terry::{ComparisonOutcome, Winner};

/// Derived per-(model, dimension) score summary.
///
/// Never persisted: recomputed on every aggregation pass from the source
/// evaluation records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScoreRecord {
    pub model_name: String,
    pub dimension: Dimension,
    /// Mean outcome in [0, 1]
    pub win_rate: f64,
    /// Number of contributing outcomes
    pub n: usize,
    /// Population standard deviation / sqrt(n)
    pub std_error: f64,
}

/// Win/loss/tie tally for one model pair on one dimension.
///
/// `model_a`/`model_b` are in lexicographic order, independent of how the
/// underlying comparisons were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairwiseCounts {
    pub model_a: String,
    pub model_b: String,
    pub dimension: Dimension,
    pub wins_a: u64,
    pub wins_b: u64,
    pub ties: u64,
}

type OutcomeMap = BTreeMap<String, BTreeMap<Dimension, Vec<f64>>>;

/// The tabulated result of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// model -> dimension -> outcome list in {0, 0.5, 1}
    outcomes: OutcomeMap,
    /// biome -> model -> dimension -> outcome list
    biome_outcomes: BTreeMap<String, OutcomeMap>,
    /// dimension -> (model_a, model_b) -> (wins_a, wins_b, ties)
    pair_counts: BTreeMap<Dimension, BTreeMap<(String, String), (u64, u64, u64)>>,
    /// dimension -> per-evaluation outcome records for ranking fits
    ranking_outcomes: BTreeMap<Dimension, Vec<ComparisonOutcome>>,
    /// Evaluation results referencing a comparison not in the snapshot
    pub orphaned_records: usize,
    /// Dimension-score entries whose name is outside the canonical set
    pub unknown_dimensions: usize,
    /// Number of records that contributed at least one outcome
    pub tabulated_records: usize,
}

impl Aggregation {
    /// Tabulate a snapshot of comparisons and evaluation results.
    #[must_use]
    pub fn from_records(comparisons: &[Comparison], results: &[EvaluationResult]) -> Self {
        let by_id: HashMap<Uuid, &Comparison> =
            comparisons.iter().map(|c| (c.id, c)).collect();

        let mut aggregation = Aggregation::default();

        for result in results {
            let Some(&comparison) = by_id.get(&result.comparison_id) else {
                warn!(
                    comparison_id = %result.comparison_id,
                    evaluation_id = %result.id,
                    "evaluation references unknown comparison; excluded from aggregation"
                );
                aggregation.orphaned_records += 1;
                continue;
            };

            let mut contributed = false;
            for (name, &choice) in &result.dimension_scores {
                let Some(dimension) = Dimension::from_name(name) else {
                    warn!(
                        dimension = %name,
                        evaluation_id = %result.id,
                        "unknown dimension name; entry ignored"
                    );
                    aggregation.unknown_dimensions += 1;
                    continue;
                };
                aggregation.tabulate(comparison, dimension, choice);
                contributed = true;
            }
            if contributed {
                aggregation.tabulated_records += 1;
            }
        }

        aggregation
    }

    fn tabulate(&mut self, comparison: &Comparison, dimension: Dimension, choice: Choice) {
        let labels = &comparison.randomized_labels;
        // De-randomize: the outcome attaches to true model names.
        let (score_a_side, score_b_side) = match choice {
            Choice::A => (1.0, 0.0),
            Choice::B => (0.0, 1.0),
            Choice::Equal => (0.5, 0.5),
        };
        push_outcome(&mut self.outcomes, &labels.a, dimension, score_a_side);
        push_outcome(&mut self.outcomes, &labels.b, dimension, score_b_side);

        let biome = comparison.scenario_metadata.biome.clone();
        let per_biome = self.biome_outcomes.entry(biome).or_default();
        push_outcome(per_biome, &labels.a, dimension, score_a_side);
        push_outcome(per_biome, &labels.b, dimension, score_b_side);

        // Pairwise tally keyed by the lexicographically ordered pair.
        let winner = labels.model_for(choice);
        let (first, second) = if comparison.model_a_name <= comparison.model_b_name {
            (
                comparison.model_a_name.clone(),
                comparison.model_b_name.clone(),
            )
        } else {
            (
                comparison.model_b_name.clone(),
                comparison.model_a_name.clone(),
            )
        };
        let entry = self
            .pair_counts
            .entry(dimension)
            .or_default()
            .entry((first.clone(), second.clone()))
            .or_insert((0, 0, 0));
        match winner {
            Some(model) if model == first => entry.0 += 1,
            Some(_) => entry.1 += 1,
            None => entry.2 += 1,
        }

        // Per-evaluation record for Bradley-Terry, oriented by the true
        // requested order.
        let ranking_winner = match winner {
            Some(model) if model == comparison.model_a_name => Winner::A,
            Some(_) => Winner::B,
            None => Winner::Tie,
        };
        self.ranking_outcomes
            .entry(dimension)
            .or_default()
            .push(ComparisonOutcome::new(
                &comparison.model_a_name,
                &comparison.model_b_name,
                ranking_winner,
            ));
    }

    /// All model names seen in the snapshot, in stable order.
    #[must_use]
    pub fn models(&self) -> Vec<&str> {
        self.outcomes.keys().map(String::as_str).collect()
    }

    /// Raw outcome list for a (model, dimension) cell.
    #[must_use]
    pub fn outcomes(&self, model: &str, dimension: Dimension) -> &[f64] {
        self.outcomes
            .get(model)
            .and_then(|dims| dims.get(&dimension))
            .map_or(&[], Vec::as_slice)
    }

    /// Win rate for a cell; `NaN` when the cell has no observations.
    ///
    /// A zero win rate from zero observations would be a data-integrity
    /// bug, not a measurement, so empty cells are never reported as 0.
    #[must_use]
    pub fn win_rate(&self, model: &str, dimension: Dimension) -> f64 {
        let outcomes = self.outcomes(model, dimension);
        if outcomes.is_empty() {
            return f64::NAN;
        }
        mean(outcomes)
    }

    /// Score records for every non-empty (model, dimension) cell.
    #[must_use]
    pub fn score_records(&self) -> Vec<ModelScoreRecord> {
        score_records_of(&self.outcomes)
    }

    /// Score records broken down by scenario biome.
    #[must_use]
    pub fn score_records_by_biome(&self) -> BTreeMap<String, Vec<ModelScoreRecord>> {
        self.biome_outcomes
            .iter()
            .map(|(biome, outcomes)| (biome.clone(), score_records_of(outcomes)))
            .collect()
    }

    /// Win/loss/tie tallies for every model pair on every dimension.
    #[must_use]
    pub fn pairwise_counts(&self) -> Vec<PairwiseCounts> {
        let mut all = Vec::new();
        for (&dimension, pairs) in &self.pair_counts {
            for ((model_a, model_b), &(wins_a, wins_b, ties)) in pairs {
                all.push(PairwiseCounts {
                    model_a: model_a.clone(),
                    model_b: model_b.clone(),
                    dimension,
                    wins_a,
                    wins_b,
                    ties,
                });
            }
        }
        all
    }

    /// Per-evaluation outcome records for a dimension, ready for a
    /// Bradley-Terry fit.
    #[must_use]
    pub fn ranking_outcomes(&self, dimension: Dimension) -> &[ComparisonOutcome] {
        self.ranking_outcomes
            .get(&dimension)
            .map_or(&[], Vec::as_slice)
    }
}

fn push_outcome(map: &mut OutcomeMap, model: &str, dimension: Dimension, score: f64) {
    map.entry(model.to_string())
        .or_default()
        .entry(dimension)
        .or_default()
        .push(score);
}

fn score_records_of(outcomes: &OutcomeMap) -> Vec<ModelScoreRecord> {
    let mut records = Vec::new();
    for (model, dims) in outcomes {
        for (&dimension, scores) in dims {
            if scores.is_empty() {
                continue;
            }
            let n = scores.len();
            let win_rate = mean(scores);
            let std_error = population_std(scores, win_rate) / (n as f64).sqrt();
            records.push(ModelScoreRecord {
                model_name: model.clone(),
                dimension,
                win_rate,
                n,
                std_error,
            });
        }
    }
    records
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64], mean: f64) -> f64 {
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
