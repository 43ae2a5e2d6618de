//! Errors for the estimation layer (noise configuration, estimator
//! construction, and expectation-value evaluation).
//!
//! This module defines [`EstimatorError`], the error type returned by
//! [`Estimator`](crate::estimation::traits::Estimator) implementations and by
//! the noise/backend configuration helpers. It implements `Display`/`Error`
//! and converts into [`OptError`](crate::optimization::errors::OptError) when
//! an evaluation fails inside an optimization run.
//!
//! ## Conventions
//! - Configuration problems (qubit counts, error scales, probabilities,
//!   unknown names) are reported **before** any evaluation happens.
//! - Backend failures are carried as human-readable text; the estimation
//!   layer never retries.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for estimation operations that may produce [`EstimatorError`].
pub type EstResult<T> = Result<T, EstimatorError>;

/// Unified error type for the estimation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorError {
    // ---- Backend configuration ----
    /// Only 4- and 6-qubit coupling maps are defined.
    UnsupportedQubitCount { n_qubits: usize, reason: &'static str },

    /// Depolarizing error scale must be finite and non-negative.
    InvalidErrorScale { scale: f64, reason: &'static str },

    /// A scaled depolarizing probability left the unit interval.
    InvalidProbability { name: &'static str, value: f64 },

    /// Unknown estimator kind name.
    UnknownEstimatorKind { name: String, reason: &'static str },

    /// Unknown shot policy name.
    UnknownShotPolicy { name: String, reason: &'static str },

    // ---- Evaluation ----
    /// Parameter vector length does not match the bound circuit.
    ParamLengthMismatch { expected: usize, found: usize },

    /// Reported precision must be finite and non-negative.
    InvalidPrecision { value: f64 },

    /// The backend failed or returned a malformed result.
    Backend { text: String },
}

impl std::error::Error for EstimatorError {}

impl std::fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Backend configuration ----
            EstimatorError::UnsupportedQubitCount { n_qubits, reason } => {
                write!(f, "Unsupported number of qubits {n_qubits}: {reason}")
            }
            EstimatorError::InvalidErrorScale { scale, reason } => {
                write!(f, "Invalid depolarizing error scale {scale}: {reason}")
            }
            EstimatorError::InvalidProbability { name, value } => {
                write!(f, "Invalid {name} depolarizing probability {value}, must lie in [0, 1]")
            }
            EstimatorError::UnknownEstimatorKind { name, reason } => {
                write!(f, "Unknown estimator kind '{name}': {reason}")
            }
            EstimatorError::UnknownShotPolicy { name, reason } => {
                write!(f, "Unknown shot policy '{name}': {reason}")
            }

            // ---- Evaluation ----
            EstimatorError::ParamLengthMismatch { expected, found } => {
                write!(f, "Parameter length mismatch: expected {expected}, found {found}")
            }
            EstimatorError::InvalidPrecision { value } => {
                write!(f, "Invalid estimator precision {value}, must be finite and >= 0")
            }
            EstimatorError::Backend { text } => {
                write!(f, "Estimator backend error: {text}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<EstimatorError> for PyErr {
    fn from(err: EstimatorError) -> PyErr {
        PyValueError::new_err(format!("EstimatorError: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `Display` formatting for configuration and evaluation variants.
    //
    // They intentionally DO NOT cover:
    // - Conversion into `OptError`, which is tested in the optimization
    //   error module.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure qubit-count errors embed the offending count and reason.
    //
    // Given
    // -----
    // - `UnsupportedQubitCount { n_qubits: 5, .. }`.
    //
    // Expect
    // ------
    // - The message mentions `5` and the reason text.
    fn unsupported_qubit_count_display_includes_payload() {
        // Arrange
        let err =
            EstimatorError::UnsupportedQubitCount { n_qubits: 5, reason: "must be 4 or 6" };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains('5'));
        assert!(msg.contains("must be 4 or 6"));
    }

    #[test]
    // Purpose
    // -------
    // Verify backend failures keep the backend's text verbatim.
    //
    // Given
    // -----
    // - `Backend { text: "job timed out" }`.
    //
    // Expect
    // ------
    // - The message ends with the backend text.
    fn backend_display_keeps_text() {
        // Arrange
        let err = EstimatorError::Backend { text: "job timed out".to_string() };

        // Act
        let msg = err.to_string();

        // Assert
        assert_eq!(msg, "Estimator backend error: job timed out");
    }
}
