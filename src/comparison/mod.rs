//! Comparison data model and randomized A/B label assignment.
//!
//! A [`Comparison`] pairs two models on one scenario. Which model is shown
//! to evaluators as "A" is decided by a fair coin at creation time and
//! recorded in [`RandomizedLabels`]; evaluators only ever see the labels,
//! and the aggregation engine uses the recorded mapping to recover true
//! model identity. The mapping is immutable once created; rerandomizing
//! after evaluations begin would corrupt aggregation.
//!
//! # Examples
//!
//! ```
//! use cotejar::comparison::ComparisonRandomizer;
//! use cotejar::scenario::get_scenario;
//! use uuid::Uuid;
//!
//! let scenario = get_scenario("basic_forward").expect("catalog scenario");
//! let mut randomizer = ComparisonRandomizer::new().with_random_state(42);
//! let comparison = randomizer
//!     .create_comparison(Uuid::new_v4(), "owl-1", "genie-2", &scenario)
//!     .expect("distinct models");
//!
//! let labels = &comparison.randomized_labels;
//! assert!(labels.is_bijection_over("owl-1", "genie-2"));
//! ```

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{CotejarError, Result};
use crate::scenario::{ActionFrame, TestScenario};

/// An evaluator's verdict on one dimension of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Choice {
    /// The video shown under label "A" was better
    A,
    /// The video shown under label "B" was better
    B,
    /// No preference
    Equal,
}

/// The canonical evaluation dimensions.
///
/// `dimension_scores` keys are raw strings at the wire boundary; the
/// aggregation engine parses them against this set and warns on anything
/// outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    OverallQuality,
    Controllability,
    VisualQuality,
    TemporalConsistency,
}

impl Dimension {
    /// Every canonical dimension, in stable order.
    pub const ALL: [Dimension; 4] = [
        Dimension::OverallQuality,
        Dimension::Controllability,
        Dimension::VisualQuality,
        Dimension::TemporalConsistency,
    ];

    /// Canonical snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::OverallQuality => "overall_quality",
            Dimension::Controllability => "controllability",
            Dimension::VisualQuality => "visual_quality",
            Dimension::TemporalConsistency => "temporal_consistency",
        }
    }

    /// Parse a wire-format dimension name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "overall_quality" => Some(Dimension::OverallQuality),
            "controllability" => Some(Dimension::Controllability),
            "visual_quality" => Some(Dimension::VisualQuality),
            "temporal_consistency" => Some(Dimension::TemporalConsistency),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The de-randomization mapping from display labels to true model names.
///
/// Constructed only by [`ComparisonRandomizer`]; by construction it is a
/// bijection between {"A", "B"} and the comparison's two model names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomizedLabels {
    /// True model shown under label "A"
    #[serde(rename = "A")]
    pub a: String,
    /// True model shown under label "B"
    #[serde(rename = "B")]
    pub b: String,
}

impl RandomizedLabels {
    /// The true model name an evaluator's choice refers to, if the choice
    /// names a side.
    #[must_use]
    pub fn model_for(&self, choice: Choice) -> Option<&str> {
        match choice {
            Choice::A => Some(&self.a),
            Choice::B => Some(&self.b),
            Choice::Equal => None,
        }
    }

    /// Whether this mapping is a bijection over the two given names.
    #[must_use]
    pub fn is_bijection_over(&self, model_a: &str, model_b: &str) -> bool {
        (self.a == model_a && self.b == model_b) || (self.a == model_b && self.b == model_a)
    }
}

/// Lifecycle state of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Draft,
    Active,
    Completed,
}

/// A named group of comparisons evaluated together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: Uuid,
    /// URL-safe identifier derived from the name
    pub slug: String,
    pub name: String,
    pub description: String,
    pub status: ExperimentStatus,
    pub created_at: DateTime<Utc>,
}

impl Experiment {
    /// Create a draft experiment. The slug is derived from the name;
    /// stores are responsible for de-duplicating it on insert.
    #[must_use]
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slugify(name),
            name: name.to_string(),
            description: description.to_string(),
            status: ExperimentStatus::Draft,
            created_at: Utc::now(),
        }
    }
}

/// Derive a URL-safe slug from an experiment name.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Scenario context carried on a comparison for downstream breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioMetadata {
    pub name: String,
    pub biome: String,
    pub evaluation_focus: Vec<String>,
}

/// One randomized A/B pairing of two models on one scenario.
///
/// Immutable once created; downstream components reference comparisons but
/// never mutate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub id: Uuid,
    pub experiment_id: Uuid,
    pub scenario_id: String,
    /// True identity of the first requested model
    pub model_a_name: String,
    /// True identity of the second requested model
    pub model_b_name: String,
    pub randomized_labels: RandomizedLabels,
    pub action_sequence: Vec<ActionFrame>,
    pub scenario_metadata: ScenarioMetadata,
    pub created_at: DateTime<Utc>,
}

/// Completion state of an evaluation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Completed,
    Draft,
    Rejected,
}

/// One human evaluation of one comparison.
///
/// Append-only log semantics: records are never updated or deleted by the
/// analysis core. Several records per comparison (one per evaluator) are
/// expected and required for reliability analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: Uuid,
    pub comparison_id: Uuid,
    pub evaluator_id: String,
    /// Wire-format dimension name -> choice; non-canonical names are
    /// ignored (with a warning) at aggregation time
    pub dimension_scores: BTreeMap<String, Choice>,
    pub completion_time_seconds: f64,
    pub created_at: DateTime<Utc>,
    pub status: EvaluationStatus,
}

impl EvaluationResult {
    /// Record a completed evaluation. Negative completion times are
    /// clamped to zero.
    #[must_use]
    pub fn new(
        comparison_id: Uuid,
        evaluator_id: &str,
        dimension_scores: BTreeMap<String, Choice>,
        completion_time_seconds: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            comparison_id,
            evaluator_id: evaluator_id.to_string(),
            dimension_scores,
            completion_time_seconds: completion_time_seconds.max(0.0),
            created_at: Utc::now(),
            status: EvaluationStatus::Completed,
        }
    }
}

/// Creates comparisons with unbiased randomized label assignment.
///
/// The coin flip uses an RNG injected at construction: entropy-seeded by
/// default, or fixed via [`with_random_state`](Self::with_random_state) for
/// deterministic tests. The seed is never derived from anything visible to
/// evaluators, so the label assignment cannot be reverse-engineered from
/// the comparison itself.
#[derive(Debug)]
pub struct ComparisonRandomizer {
    rng: StdRng,
}

impl Default for ComparisonRandomizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonRandomizer {
    /// Entropy-seeded randomizer for production use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fix the random state for reproducible label assignment in tests.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.rng = StdRng::seed_from_u64(random_state);
        self
    }

    /// Create a single comparison between two distinct models on a scenario.
    ///
    /// A fair coin decides which model is shown under label "A".
    ///
    /// # Errors
    ///
    /// `InvalidComparison` if `model_a == model_b`; a model cannot be
    /// compared against itself.
    pub fn create_comparison(
        &mut self,
        experiment_id: Uuid,
        model_a: &str,
        model_b: &str,
        scenario: &TestScenario,
    ) -> Result<Comparison> {
        if model_a == model_b {
            return Err(CotejarError::InvalidComparison {
                model_a: model_a.to_string(),
                model_b: model_b.to_string(),
            });
        }

        let randomized_labels = if self.rng.gen_bool(0.5) {
            RandomizedLabels {
                a: model_b.to_string(),
                b: model_a.to_string(),
            }
        } else {
            RandomizedLabels {
                a: model_a.to_string(),
                b: model_b.to_string(),
            }
        };

        Ok(Comparison {
            id: Uuid::new_v4(),
            experiment_id,
            scenario_id: scenario.id.clone(),
            model_a_name: model_a.to_string(),
            model_b_name: model_b.to_string(),
            randomized_labels,
            action_sequence: scenario.actions.clone(),
            scenario_metadata: ScenarioMetadata {
                name: scenario.name.clone(),
                biome: scenario.biome.clone(),
                evaluation_focus: scenario.evaluation_focus.clone(),
            },
            created_at: Utc::now(),
        })
    }

    /// Create a batch of comparisons over scenarios x model pairs x
    /// repetitions.
    ///
    /// With `model_pairs = None`, all unordered pairs of `models` are
    /// enumerated.
    ///
    /// # Errors
    ///
    /// `InvalidComparison` if any requested pair has identical names.
    pub fn create_batch(
        &mut self,
        experiment_id: Uuid,
        models: &[String],
        scenarios: &[TestScenario],
        pairs_per_scenario: usize,
        model_pairs: Option<&[(String, String)]>,
    ) -> Result<Vec<Comparison>> {
        let pairs: Vec<(String, String)> = match model_pairs {
            Some(pairs) => pairs.to_vec(),
            None => {
                let mut all = Vec::new();
                for i in 0..models.len() {
                    for j in i + 1..models.len() {
                        all.push((models[i].clone(), models[j].clone()));
                    }
                }
                all
            }
        };

        let mut comparisons =
            Vec::with_capacity(scenarios.len() * pairs.len() * pairs_per_scenario);
        for scenario in scenarios {
            for _ in 0..pairs_per_scenario {
                for (model_a, model_b) in &pairs {
                    comparisons.push(self.create_comparison(
                        experiment_id,
                        model_a,
                        model_b,
                        scenario,
                    )?);
                }
            }
        }
        Ok(comparisons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::get_scenario;

    fn scenario() -> TestScenario {
        get_scenario("basic_forward").expect("catalog scenario")
    }

    #[test]
    fn test_rejects_identical_models() {
        let mut randomizer = ComparisonRandomizer::new().with_random_state(0);
        let err = randomizer
            .create_comparison(Uuid::new_v4(), "same", "same", &scenario())
            .expect_err("identical models must be rejected");
        assert!(matches!(err, CotejarError::InvalidComparison { .. }));
    }

    #[test]
    fn test_labels_are_bijective() {
        let mut randomizer = ComparisonRandomizer::new().with_random_state(3);
        for _ in 0..50 {
            let c = randomizer
                .create_comparison(Uuid::new_v4(), "m1", "m2", &scenario())
                .expect("valid comparison");
            assert!(c.randomized_labels.is_bijection_over("m1", "m2"));
            assert_ne!(c.randomized_labels.a, c.randomized_labels.b);
        }
    }

    #[test]
    fn test_flip_fraction_near_half() {
        let mut randomizer = ComparisonRandomizer::new().with_random_state(42);
        let n = 2000;
        let mut a_first = 0usize;
        for _ in 0..n {
            let c = randomizer
                .create_comparison(Uuid::new_v4(), "m1", "m2", &scenario())
                .expect("valid comparison");
            if c.randomized_labels.a == "m1" {
                a_first += 1;
            }
        }
        let fraction = a_first as f64 / n as f64;
        // 4-sigma band around 0.5 for n=2000
        assert!(
            (fraction - 0.5).abs() < 0.045,
            "label balance off: {fraction}"
        );
    }

    #[test]
    fn test_randomizer_deterministic_under_seed() {
        let mut r1 = ComparisonRandomizer::new().with_random_state(9);
        let mut r2 = ComparisonRandomizer::new().with_random_state(9);
        for _ in 0..20 {
            let c1 = r1
                .create_comparison(Uuid::new_v4(), "m1", "m2", &scenario())
                .expect("valid comparison");
            let c2 = r2
                .create_comparison(Uuid::new_v4(), "m1", "m2", &scenario())
                .expect("valid comparison");
            assert_eq!(c1.randomized_labels, c2.randomized_labels);
        }
    }

    #[test]
    fn test_batch_all_pairs() {
        let mut randomizer = ComparisonRandomizer::new().with_random_state(1);
        let models = vec!["m1".to_string(), "m2".to_string(), "m3".to_string()];
        let scenarios = vec![scenario()];
        let batch = randomizer
            .create_batch(Uuid::new_v4(), &models, &scenarios, 2, None)
            .expect("valid batch");
        // 3 models -> 3 unordered pairs, x1 scenario x2 repetitions
        assert_eq!(batch.len(), 6);
    }

    #[test]
    fn test_model_for_choice() {
        let labels = RandomizedLabels {
            a: "m2".to_string(),
            b: "m1".to_string(),
        };
        assert_eq!(labels.model_for(Choice::A), Some("m2"));
        assert_eq!(labels.model_for(Choice::B), Some("m1"));
        assert_eq!(labels.model_for(Choice::Equal), None);
    }

    #[test]
    fn test_dimension_name_round_trip() {
        for dim in Dimension::ALL {
            assert_eq!(Dimension::from_name(dim.as_str()), Some(dim));
        }
        assert_eq!(Dimension::from_name("texture_quality"), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Owl Eval v2"), "owl-eval-v2");
        assert_eq!(slugify("under_scored name"), "under-scored-name");
        assert_eq!(slugify("weird!chars?"), "weirdchars");
    }

    #[test]
    fn test_evaluation_result_clamps_negative_time() {
        let result = EvaluationResult::new(Uuid::new_v4(), "eval-1", BTreeMap::new(), -5.0);
        assert_eq!(result.completion_time_seconds, 0.0);
        assert_eq!(result.status, EvaluationStatus::Completed);
    }

    #[test]
    fn test_comparison_serde_round_trip() {
        let mut randomizer = ComparisonRandomizer::new().with_random_state(5);
        let c = randomizer
            .create_comparison(Uuid::new_v4(), "m1", "m2", &scenario())
            .expect("valid comparison");
        let json = serde_json::to_string(&c).expect("comparison serializes");
        let back: Comparison = serde_json::from_str(&json).expect("comparison deserializes");
        assert_eq!(back.randomized_labels, c.randomized_labels);
        assert_eq!(back.scenario_id, c.scenario_id);
    }

    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_labels_always_bijective(seed: u64) {
                let mut randomizer = ComparisonRandomizer::new().with_random_state(seed);
                let c = randomizer
                    .create_comparison(Uuid::new_v4(), "m1", "m2", &scenario())
                    .expect("valid comparison");
                prop_assert!(c.randomized_labels.is_bijection_over("m1", "m2"));
            }
        }
    }
}
