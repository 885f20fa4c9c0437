//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use cotejar::prelude::*;
//! ```

pub use crate::aggregate::{Aggregation, ModelScoreRecord, PairwiseCounts};
pub use crate::comparison::{
    Choice, Comparison, ComparisonRandomizer, Dimension, EvaluationResult, Experiment,
    RandomizedLabels,
};
pub use crate::error::{CotejarError, Result};
pub use crate::reliability::{fleiss_kappa, interpret_kappa, kappa_by_dimension};
pub use crate::report::{EvaluationReport, ReportCompiler};
pub use crate::scenario::{builtin_scenarios, get_scenario, TestScenario};
pub use crate::stats::{
    binomial_test, mcnemar_test, multiple_comparison_correction, BootstrapCi, BradleyTerryFit,
    BradleyTerryRanking, ComparisonOutcome, CorrectionMethod, Winner,
};
pub use crate::store::{EvaluationStore, MemoryStore};
