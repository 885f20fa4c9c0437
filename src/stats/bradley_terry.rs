//! Bradley-Terry strength estimation for multi-model ranking.
//!
//! Fits latent per-model strengths theta such that
//! P(i beats j) = sigmoid(theta_i - theta_j), by weighted logistic maximum
//! likelihood over pairwise outcome records. Ties carry no information
//! under the model and are excluded from the fit.
//!
//! The fit is an explicit two-branch state machine: [`BradleyTerryFit`]
//! is either `Converged` (MLE strengths with standard errors from the
//! inverse observed information) or `Fallback` (empirical win rates with
//! infinite standard errors, signalling non-parametric, use with
//! caution). Callers can distinguish the branches programmatically.
//!
//! # Examples
//!
//! ```
//! use cotejar::stats::bradley_terry::{
//!     BradleyTerryRanking, ComparisonOutcome, Winner,
//! };
//!
//! let mut outcomes = Vec::new();
//! for _ in 0..7 {
//!     outcomes.push(ComparisonOutcome::new("owl-1", "genie-2", Winner::A));
//! }
//! for _ in 0..3 {
//!     outcomes.push(ComparisonOutcome::new("owl-1", "genie-2", Winner::B));
//! }
//!
//! let fit = BradleyTerryRanking::new().fit(&outcomes);
//! assert!(fit.is_converged());
//! let owl = fit.strength_of("owl-1").expect("owl-1 was compared");
//! assert!(owl.strength > 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{CotejarError, Result};
use crate::stats::distributions::sigmoid;

/// Which side of a pairwise comparison won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    /// `model_a` won
    A,
    /// `model_b` won
    B,
    /// No winner; excluded from the likelihood
    Tie,
}

/// One tagged pairwise outcome record.
///
/// An explicit record type validated at construction: the winner is an
/// enum, not a loosely typed string, and the weight is checked rather
/// than inferred at use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub model_a: String,
    pub model_b: String,
    pub winner: Winner,
    /// Likelihood weight; defaults to 1.0
    pub weight: f64,
}

impl ComparisonOutcome {
    /// Outcome with the default weight of 1.0.
    #[must_use]
    pub fn new(model_a: &str, model_b: &str, winner: Winner) -> Self {
        Self {
            model_a: model_a.to_string(),
            model_b: model_b.to_string(),
            winner,
            weight: 1.0,
        }
    }

    /// Set the likelihood weight. Non-finite or non-positive weights are
    /// rejected at construction and replaced with the default 1.0.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            1.0
        };
        self
    }
}

/// Fitted strength summary for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStrength {
    pub model_name: String,
    /// Latent strength, re-centered to zero mean across models
    pub strength: f64,
    /// Standard error; infinite in the fallback branch
    pub std_error: f64,
    /// Implied probability of beating the average model
    pub win_probability: f64,
}

/// Outcome of a Bradley-Terry fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BradleyTerryFit {
    /// Maximum-likelihood fit converged
    Converged { strengths: Vec<ModelStrength> },
    /// MLE unavailable (non-convergence, singular information, or no
    /// non-tie comparisons): empirical win rates with se = infinity
    Fallback { strengths: Vec<ModelStrength> },
}

impl BradleyTerryFit {
    /// Strengths regardless of branch, in sorted model-name order.
    #[must_use]
    pub fn strengths(&self) -> &[ModelStrength] {
        match self {
            BradleyTerryFit::Converged { strengths } | BradleyTerryFit::Fallback { strengths } => {
                strengths
            }
        }
    }

    /// Whether the maximum-likelihood fit converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, BradleyTerryFit::Converged { .. })
    }

    /// Strength entry for a model, if it appeared in any outcome.
    #[must_use]
    pub fn strength_of(&self, model_name: &str) -> Option<&ModelStrength> {
        self.strengths().iter().find(|s| s.model_name == model_name)
    }
}

/// Bradley-Terry maximum-likelihood fitter.
///
/// Newton-Raphson on the weighted logistic log-likelihood, with the first
/// model (in sorted name order) as the zero-strength reference resolving
/// the translation invariance of the model.
#[derive(Debug, Clone)]
pub struct BradleyTerryRanking {
    max_iter: usize,
    tol: f64,
}

impl Default for BradleyTerryRanking {
    fn default() -> Self {
        Self::new()
    }
}

impl BradleyTerryRanking {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-8,
        }
    }

    /// Sets the maximum number of Newton iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance on the parameter step.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Fit strengths over a set of outcome records.
    ///
    /// Never fails: non-convergence degrades to the documented
    /// [`Fallback`](BradleyTerryFit::Fallback) branch rather than
    /// propagating an error.
    #[must_use]
    pub fn fit(&self, outcomes: &[ComparisonOutcome]) -> BradleyTerryFit {
        let models: Vec<String> = outcomes
            .iter()
            .flat_map(|o| [o.model_a.clone(), o.model_b.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if models.is_empty() {
            return BradleyTerryFit::Fallback {
                strengths: Vec::new(),
            };
        }

        match self.fit_mle(&models, outcomes) {
            Ok(strengths) => BradleyTerryFit::Converged { strengths },
            Err(_) => BradleyTerryFit::Fallback {
                strengths: empirical_fallback(&models, outcomes),
            },
        }
    }

    /// Newton-Raphson MLE; `Err` on non-convergence or a singular
    /// information matrix (both recovered by the caller as fallback).
    fn fit_mle(
        &self,
        models: &[String],
        outcomes: &[ComparisonOutcome],
    ) -> Result<Vec<ModelStrength>> {
        let n_models = models.len();
        let n_params = n_models - 1;
        if n_params == 0 {
            return Err(CotejarError::InsufficientData {
                context: "Bradley-Terry fit".to_string(),
                required: 2,
                available: n_models,
            });
        }

        let model_index = |name: &str| -> usize {
            models
                .iter()
                .position(|m| m == name)
                .expect("model collected from outcomes")
        };

        // Non-tie rows as (idx_a, idx_b, y, w); the design row has +1 in
        // model_a's column and -1 in model_b's, with the reference model
        // (index 0) carrying no column.
        let rows: Vec<(usize, usize, f64, f64)> = outcomes
            .iter()
            .filter(|o| o.winner != Winner::Tie)
            .map(|o| {
                let y = if o.winner == Winner::A { 1.0 } else { 0.0 };
                (model_index(&o.model_a), model_index(&o.model_b), y, o.weight)
            })
            .collect();

        if rows.is_empty() {
            return Err(CotejarError::InsufficientData {
                context: "Bradley-Terry fit".to_string(),
                required: 1,
                available: 0,
            });
        }

        let mut beta = vec![0.0_f64; n_params];
        let mut delta_max = f64::INFINITY;

        for _ in 0..self.max_iter {
            let mut gradient = vec![0.0_f64; n_params];
            let mut information = vec![vec![0.0_f64; n_params]; n_params];

            for &(idx_a, idx_b, y, w) in &rows {
                let eta = strength_at(&beta, idx_a) - strength_at(&beta, idx_b);
                let mu = sigmoid(eta).clamp(1e-12, 1.0 - 1e-12);
                let residual = w * (y - mu);
                let curvature = w * mu * (1.0 - mu);

                // Sparse +-1 design: at most two nonzero entries per row.
                let cols: [(usize, f64); 2] = [
                    (idx_a, 1.0),
                    (idx_b, -1.0),
                ];
                for &(idx, sign) in &cols {
                    if idx == 0 {
                        continue;
                    }
                    gradient[idx - 1] += residual * sign;
                    for &(idx2, sign2) in &cols {
                        if idx2 == 0 {
                            continue;
                        }
                        information[idx - 1][idx2 - 1] += curvature * sign * sign2;
                    }
                }
            }

            let delta = solve(&information, &gradient).ok_or_else(|| {
                CotejarError::ConvergenceFailure {
                    iterations: self.max_iter,
                    final_delta: delta_max,
                }
            })?;

            delta_max = delta.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
            for (b, d) in beta.iter_mut().zip(&delta) {
                *b += d;
            }

            if delta_max < self.tol {
                return Ok(self.summarize(models, &beta, &rows));
            }
        }

        Err(CotejarError::ConvergenceFailure {
            iterations: self.max_iter,
            final_delta: delta_max,
        })
    }

    /// Assemble centered strengths, standard errors, and win
    /// probabilities from a converged parameter vector.
    fn summarize(
        &self,
        models: &[String],
        beta: &[f64],
        rows: &[(usize, usize, f64, f64)],
    ) -> Vec<ModelStrength> {
        let n_models = models.len();
        let n_params = beta.len();

        // Observed information at the optimum, for standard errors.
        let mut information = vec![vec![0.0_f64; n_params]; n_params];
        for &(idx_a, idx_b, _, w) in rows {
            let eta = strength_at(beta, idx_a) - strength_at(beta, idx_b);
            let mu = sigmoid(eta).clamp(1e-12, 1.0 - 1e-12);
            let curvature = w * mu * (1.0 - mu);
            let cols: [(usize, f64); 2] = [(idx_a, 1.0), (idx_b, -1.0)];
            for &(idx, sign) in &cols {
                if idx == 0 {
                    continue;
                }
                for &(idx2, sign2) in &cols {
                    if idx2 == 0 {
                        continue;
                    }
                    information[idx - 1][idx2 - 1] += curvature * sign * sign2;
                }
            }
        }

        let covariance_diag: Vec<f64> = match invert(&information) {
            Some(inverse) => (0..n_params).map(|i| inverse[i][i].max(0.0)).collect(),
            // Information went singular exactly at the optimum; errors
            // are unavailable but the point estimate stands.
            None => vec![f64::INFINITY; n_params],
        };

        // Reference model has strength 0 and, by convention, zero error.
        let mut strengths = vec![0.0_f64; n_models];
        let mut std_errors = vec![0.0_f64; n_models];
        for i in 0..n_params {
            strengths[i + 1] = beta[i];
            std_errors[i + 1] = covariance_diag[i].sqrt();
        }

        // Remove the arbitrary reference choice: zero-mean strengths.
        let mean = strengths.iter().sum::<f64>() / n_models as f64;
        models
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let centered = strengths[i] - mean;
                ModelStrength {
                    model_name: name.clone(),
                    strength: centered,
                    std_error: std_errors[i],
                    win_probability: sigmoid(centered),
                }
            })
            .collect()
    }
}

fn strength_at(beta: &[f64], model_idx: usize) -> f64 {
    if model_idx == 0 {
        0.0
    } else {
        beta[model_idx - 1]
    }
}

/// Empirical win-rate fallback: raw rates with se = infinity, and the
/// log-odds of each rate relative to the average rate as an
/// approximate-strength number for output-shape consistency.
fn empirical_fallback(models: &[String], outcomes: &[ComparisonOutcome]) -> Vec<ModelStrength> {
    let has_decisive = outcomes.iter().any(|o| o.winner != Winner::Tie);
    if !has_decisive {
        // Nothing to rank on: flat strengths, maximal uncertainty.
        return models
            .iter()
            .map(|name| ModelStrength {
                model_name: name.clone(),
                strength: 0.0,
                std_error: f64::INFINITY,
                win_probability: 0.5,
            })
            .collect();
    }

    let rates: Vec<f64> = models
        .iter()
        .map(|model| {
            let wins = outcomes
                .iter()
                .filter(|o| {
                    (o.model_a == *model && o.winner == Winner::A)
                        || (o.model_b == *model && o.winner == Winner::B)
                })
                .count();
            let total = outcomes
                .iter()
                .filter(|o| o.model_a == *model || o.model_b == *model)
                .count();
            wins as f64 / total.max(1) as f64
        })
        .collect();

    let avg_rate = rates.iter().sum::<f64>() / rates.len() as f64;
    let avg_log_odds = logit(avg_rate);

    models
        .iter()
        .zip(&rates)
        .map(|(name, &rate)| ModelStrength {
            model_name: name.clone(),
            strength: logit(rate) - avg_log_odds,
            std_error: f64::INFINITY,
            win_probability: rate,
        })
        .collect()
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
/// Returns `None` when the system is singular to working precision.
fn solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut aug: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                aug[i][col]
                    .abs()
                    .partial_cmp(&aug[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("non-empty pivot range");
        if aug[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        aug.swap(col, pivot_row);

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row][col] / aug[col][col];
            for k in col..=n {
                aug[row][k] -= factor * aug[col][k];
            }
        }
    }

    Some((0..n).map(|i| aug[i][n] / aug[i][i]).collect())
}

/// Dense inverse via Gauss-Jordan; `None` when singular.
fn invert(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut inverse = Vec::with_capacity(n);
    for j in 0..n {
        let mut e = vec![0.0_f64; n];
        e[j] = 1.0;
        let column = solve(a, &e)?;
        inverse.push(column);
    }
    // solve() returned columns; transpose into rows.
    let mut result = vec![vec![0.0_f64; n]; n];
    for (j, column) in inverse.iter().enumerate() {
        for (i, &v) in column.iter().enumerate() {
            result[i][j] = v;
        }
    }
    Some(result)
}
