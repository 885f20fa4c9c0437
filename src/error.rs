//! Error types for cotejar operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for cotejar operations.
///
/// Covers comparison construction failures, inference convergence issues,
/// and boundary (de)serialization problems. Integrity anomalies in
/// evaluation data (orphaned records, unknown dimensions) are *not* errors:
/// the aggregation engine recovers locally and surfaces counts instead.
///
/// # Examples
///
/// ```
/// use cotejar::error::CotejarError;
///
/// let err = CotejarError::InvalidComparison {
///     model_a: "owl-1".to_string(),
///     model_b: "owl-1".to_string(),
/// };
/// assert!(err.to_string().contains("distinct models"));
/// ```
#[derive(Debug)]
pub enum CotejarError {
    /// Comparison construction rejected (e.g. identical model names).
    InvalidComparison {
        /// First model name as requested
        model_a: String,
        /// Second model name as requested
        model_b: String,
    },

    /// Iterative fit failed to converge within the iteration limit.
    ConvergenceFailure {
        /// Number of iterations attempted
        iterations: usize,
        /// Largest parameter change at the final iteration
        final_delta: f64,
    },

    /// Not enough observations to carry out the requested computation.
    InsufficientData {
        /// What was being computed
        context: String,
        /// Observations required
        required: usize,
        /// Observations available
        available: usize,
    },

    /// Serialization/deserialization error at a JSON boundary.
    Serialization(String),

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for CotejarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CotejarError::InvalidComparison { model_a, model_b } => {
                write!(
                    f,
                    "Invalid comparison: requires two distinct models, got {model_a:?} vs {model_b:?}"
                )
            }
            CotejarError::ConvergenceFailure {
                iterations,
                final_delta,
            } => {
                write!(
                    f,
                    "Convergence failure after {iterations} iterations, delta = {final_delta}"
                )
            }
            CotejarError::InsufficientData {
                context,
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data for {context}: need {required}, have {available}"
                )
            }
            CotejarError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            CotejarError::Io(e) => write!(f, "I/O error: {e}"),
            CotejarError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CotejarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CotejarError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CotejarError {
    fn from(err: std::io::Error) -> Self {
        CotejarError::Io(err)
    }
}

impl From<serde_json::Error> for CotejarError {
    fn from(err: serde_json::Error) -> Self {
        CotejarError::Serialization(err.to_string())
    }
}

impl From<&str> for CotejarError {
    fn from(msg: &str) -> Self {
        CotejarError::Other(msg.to_string())
    }
}

impl From<String> for CotejarError {
    fn from(msg: String) -> Self {
        CotejarError::Other(msg)
    }
}

#[allow(clippy::cmp_owned)]
impl PartialEq<&str> for CotejarError {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, CotejarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_comparison_display() {
        let err = CotejarError::InvalidComparison {
            model_a: "m1".to_string(),
            model_b: "m1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("distinct models"));
        assert!(msg.contains("m1"));
    }

    #[test]
    fn test_convergence_failure_display() {
        let err = CotejarError::ConvergenceFailure {
            iterations: 100,
            final_delta: 0.42,
        };
        assert!(err.to_string().contains("Convergence failure"));
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = CotejarError::InsufficientData {
            context: "Fleiss kappa".to_string(),
            required: 2,
            available: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("Fleiss kappa"));
        assert!(msg.contains("need 2"));
    }

    #[test]
    fn test_from_str() {
        let err: CotejarError = "test error".into();
        assert!(matches!(err, CotejarError::Other(_)));
        assert_eq!(err.to_string(), "test error");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CotejarError = io_err.into();
        assert!(matches!(err, CotejarError::Io(_)));
        use std::error::Error;
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_eq_str() {
        let err = CotejarError::Other("test error".to_string());
        assert!(err == "test error");
    }
}
