//! Statistical inference suite for pairwise model comparison.
//!
//! Everything here operates on immutable snapshots and is deterministic
//! given its inputs (plus, for the bootstrap, an explicit seed):
//!
//! - [`binomial`]: exact binomial test with tie splitting
//! - [`mcnemar`]: McNemar's paired test
//! - [`bootstrap`]: seeded bootstrap CI for mean differences
//! - [`bradley_terry`]: Bradley-Terry strength ranking with an explicit
//!   converged/fallback state machine
//! - [`correction`]: Bonferroni / Holm / FDR-BH multiple-comparison
//!   correction
//! - [`distributions`]: the shared special-function primitives

pub mod binomial;
pub mod bootstrap;
pub mod bradley_terry;
pub mod correction;
pub mod distributions;
pub mod mcnemar;

pub use binomial::{binomial_test, BinomialTestResult};
pub use bootstrap::{BootstrapCi, BootstrapResult};
pub use bradley_terry::{
    BradleyTerryFit, BradleyTerryRanking, ComparisonOutcome, ModelStrength, Winner,
};
pub use correction::{multiple_comparison_correction, CorrectedPValue, CorrectionMethod};
pub use mcnemar::{mcnemar_test, McNemarResult};
