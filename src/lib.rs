//! Cotejar: pairwise comparison aggregation and ranking for generative
//! world model evaluation.
//!
//! Cotejar coordinates human-evaluated A/B comparisons (randomized label
//! assignment, win/tie tabulation, Bradley-Terry strength estimation,
//! inter-rater reliability, and significance testing) and turns sparse,
//! noisy pairwise judgments into calibrated model rankings.
//!
//! # Quick Start
//!
//! ```
//! use cotejar::prelude::*;
//! use std::collections::BTreeMap;
//! use uuid::Uuid;
//!
//! // Pair two models on a catalog scenario; a fair coin decides which
//! // model evaluators see as "A".
//! let scenario = get_scenario("basic_forward").expect("catalog scenario");
//! let mut randomizer = ComparisonRandomizer::new().with_random_state(42);
//! let comparison = randomizer
//!     .create_comparison(Uuid::new_v4(), "owl-1", "genie-2", &scenario)
//!     .expect("distinct models");
//!
//! // An evaluator prefers the video shown under label "A".
//! let mut scores = BTreeMap::new();
//! scores.insert("overall_quality".to_string(), Choice::A);
//! let result = EvaluationResult::new(comparison.id, "evaluator-1", scores, 48.0);
//!
//! // Aggregation de-randomizes the labels back to true identities.
//! let aggregation = Aggregation::from_records(&[comparison], &[result]);
//! let records = aggregation.score_records();
//! assert_eq!(records.len(), 2);
//! ```
//!
//! # Modules
//!
//! - [`scenario`]: fixed test scenarios and action-sequence generation
//! - [`comparison`]: the comparison data model and label randomizer
//! - [`store`]: the abstract evaluation record store
//! - [`aggregate`]: de-randomizing win/tie tabulation
//! - [`stats`]: binomial/McNemar/bootstrap tests, Bradley-Terry ranking,
//!   multiple-comparison correction
//! - [`reliability`]: Fleiss' kappa inter-rater agreement
//! - [`report`]: the merged summary artifact

pub mod aggregate;
pub mod comparison;
pub mod error;
pub mod prelude;
pub mod reliability;
pub mod report;
pub mod scenario;
pub mod stats;
pub mod store;

pub use error::{CotejarError, Result};
