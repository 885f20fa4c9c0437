//! Abstract evaluation record store.
//!
//! Persistence is an external collaborator; the analysis core only needs
//! the read/write surface below. [`MemoryStore`] is the in-crate reference
//! implementation used by tests and examples. Both comparisons and
//! evaluation records have append-only log semantics: there is no update
//! or delete path.

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::comparison::{Comparison, EvaluationResult, Experiment};
use crate::error::Result;

/// Read/write surface the analysis core expects from persistence.
///
/// Writes are append-only and assumed to be externally serialized; reads
/// return immutable snapshots.
pub trait EvaluationStore {
    /// All comparisons belonging to an experiment.
    fn list_comparisons(&self, experiment_id: Uuid) -> Result<Vec<Comparison>>;

    /// All evaluation results recorded for a comparison.
    fn list_evaluations(&self, comparison_id: Uuid) -> Result<Vec<EvaluationResult>>;

    /// Append a comparison.
    fn insert_comparison(&mut self, comparison: Comparison) -> Result<()>;

    /// Append an evaluation result.
    fn insert_evaluation(&mut self, evaluation: EvaluationResult) -> Result<()>;
}

/// In-memory reference store.
///
/// Keeps insertion order within each experiment/comparison so that
/// repeated reads return identical snapshots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    experiments: Vec<Experiment>,
    comparisons: Vec<Comparison>,
    evaluations: Vec<EvaluationResult>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an experiment, de-duplicating its slug with `-1`, `-2`, …
    /// suffixes. Returns the slug actually stored.
    pub fn insert_experiment(&mut self, mut experiment: Experiment) -> String {
        let base = experiment.slug.clone();
        let mut slug = base.clone();
        let mut counter = 1;
        while self.experiments.iter().any(|e| e.slug == slug) {
            slug = format!("{base}-{counter}");
            counter += 1;
        }
        experiment.slug = slug.clone();
        self.experiments.push(experiment);
        slug
    }

    /// Look up an experiment by slug.
    #[must_use]
    pub fn experiment_by_slug(&self, slug: &str) -> Option<&Experiment> {
        self.experiments.iter().find(|e| e.slug == slug)
    }

    /// All evaluation results in the store, in insertion order.
    #[must_use]
    pub fn all_evaluations(&self) -> &[EvaluationResult] {
        &self.evaluations
    }

    /// Evaluation results grouped by comparison, keyed in stable order.
    #[must_use]
    pub fn evaluations_by_comparison(&self) -> BTreeMap<Uuid, Vec<EvaluationResult>> {
        let mut grouped: BTreeMap<Uuid, Vec<EvaluationResult>> = BTreeMap::new();
        for evaluation in &self.evaluations {
            grouped
                .entry(evaluation.comparison_id)
                .or_default()
                .push(evaluation.clone());
        }
        grouped
    }
}

impl EvaluationStore for MemoryStore {
    fn list_comparisons(&self, experiment_id: Uuid) -> Result<Vec<Comparison>> {
        Ok(self
            .comparisons
            .iter()
            .filter(|c| c.experiment_id == experiment_id)
            .cloned()
            .collect())
    }

    fn list_evaluations(&self, comparison_id: Uuid) -> Result<Vec<EvaluationResult>> {
        Ok(self
            .evaluations
            .iter()
            .filter(|e| e.comparison_id == comparison_id)
            .cloned()
            .collect())
    }

    fn insert_comparison(&mut self, comparison: Comparison) -> Result<()> {
        self.comparisons.push(comparison);
        Ok(())
    }

    fn insert_evaluation(&mut self, evaluation: EvaluationResult) -> Result<()> {
        self.evaluations.push(evaluation);
        Ok(())
    }
}
