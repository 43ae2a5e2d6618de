use argmin::core::{ArgminError, Error};
#[cfg(feature = "python-bindings")]
use pyo3::{
    PyErr,
    exceptions::{PyRuntimeError, PyValueError},
};

use crate::estimation::errors::EstimatorError;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- SpsaOptions ----
    /// Regularization must be finite and non-negative.
    InvalidRegularization {
        value: f64,
        reason: &'static str,
    },

    /// Gain-schedule coefficients must be finite; `a` and `c` strictly positive.
    InvalidGain {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Allowed increase under blocking must be finite and non-negative.
    InvalidAllowedIncrease {
        value: f64,
        reason: &'static str,
    },

    /// Calibration needs at least one step.
    InvalidCalibrationSteps {
        steps: usize,
        reason: &'static str,
    },

    /// Optimizer name not supported.
    UnknownOptimizer {
        name: String,
        reason: &'static str,
    },

    // ---- Initial point ----
    /// Initial parameter vector does not match the ansatz parameter count.
    ParamLengthMismatch {
        expected: usize,
        found: usize,
    },

    /// Initial parameters must be finite.
    InvalidInitialParam {
        index: usize,
        value: f64,
    },

    // ---- Evaluation ----
    /// The estimator failed during evaluation `eval_index` (0-based).
    EstimatorFailed {
        eval_index: usize,
        source: EstimatorError,
    },

    /// The estimator returned a non-finite energy.
    NonFiniteEnergy {
        eval_index: usize,
        value: f64,
    },

    /// Estimator rejected its configuration before any evaluation.
    EstimatorConfig {
        source: EstimatorError,
    },

    /// The headline evaluation after the run failed.
    FinalEnergyFailed {
        source: EstimatorError,
    },

    /// The headline evaluation returned a non-finite energy.
    NonFiniteFinalEnergy {
        value: f64,
    },

    /// Iteration state lost its parameter vector.
    MissingParams,

    // ---- Persisted log ----
    /// Writing the per-run log failed.
    LogWrite {
        text: String,
    },

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl OptError {
    /// `true` for errors raised before any evaluation took place.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OptError::InvalidRegularization { .. }
                | OptError::InvalidGain { .. }
                | OptError::InvalidAllowedIncrease { .. }
                | OptError::InvalidCalibrationSteps { .. }
                | OptError::UnknownOptimizer { .. }
                | OptError::ParamLengthMismatch { .. }
                | OptError::InvalidInitialParam { .. }
                | OptError::EstimatorConfig { .. }
        )
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- SpsaOptions ----
            OptError::InvalidRegularization { value, reason } => {
                write!(f, "Invalid regularization {value}: {reason}")
            }
            OptError::InvalidGain { name, value, reason } => {
                write!(f, "Invalid SPSA gain '{name}' = {value}: {reason}")
            }
            OptError::InvalidAllowedIncrease { value, reason } => {
                write!(f, "Invalid allowed increase {value}: {reason}")
            }
            OptError::InvalidCalibrationSteps { steps, reason } => {
                write!(f, "Invalid calibration steps {steps}: {reason}")
            }
            OptError::UnknownOptimizer { name, reason } => {
                write!(f, "Unknown optimizer '{name}': {reason}")
            }

            // ---- Initial point ----
            OptError::ParamLengthMismatch { expected, found } => {
                write!(f, "Parameter length mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidInitialParam { index, value } => {
                write!(f, "Invalid initial parameter at index {index}: {value}, must be finite")
            }

            // ---- Evaluation ----
            OptError::EstimatorFailed { eval_index, source } => {
                write!(f, "Estimator failed at evaluation {eval_index}: {source}")
            }
            OptError::NonFiniteEnergy { eval_index, value } => {
                write!(f, "Non-finite energy {value} at evaluation {eval_index}")
            }
            OptError::EstimatorConfig { source } => {
                write!(f, "Estimator configuration rejected: {source}")
            }
            OptError::FinalEnergyFailed { source } => {
                write!(f, "Final energy evaluation failed: {source}")
            }
            OptError::NonFiniteFinalEnergy { value } => {
                write!(f, "Non-finite final energy {value}")
            }
            OptError::MissingParams => {
                write!(f, "Missing parameter vector in optimizer state")
            }

            // ---- Persisted log ----
            OptError::LogWrite { text } => {
                write!(f, "Failed to write evaluation log: {text}")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Errors raised by the objective adapter travel through argmin as
        // `anyhow` values; recover them before trying argmin's own kinds.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<EstimatorError> for OptError {
    fn from(err: EstimatorError) -> Self {
        OptError::EstimatorConfig { source: err }
    }
}

impl From<std::io::Error> for OptError {
    fn from(err: std::io::Error) -> Self {
        OptError::LogWrite { text: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        if err.is_configuration() {
            PyValueError::new_err(format!("OptError: {err}"))
        } else {
            PyRuntimeError::new_err(format!("OptError: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Round-tripping `OptError` through `argmin::core::Error`.
    // - Mapping of argmin's own error kinds and foreign errors.
    // - Classification of configuration errors.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // An `OptError` raised inside the adapter comes back unchanged after
    // travelling through argmin.
    //
    // Given
    // -----
    // - `NonFiniteEnergy` converted into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `OptError::from` returns the original variant.
    fn opt_error_survives_argmin_round_trip() {
        // Arrange
        let original = OptError::NonFiniteEnergy { eval_index: 3, value: f64::INFINITY };
        let wrapped: Error = original.clone().into();

        // Act
        let recovered = OptError::from(wrapped);

        // Assert
        assert_eq!(recovered, original);
    }

    #[test]
    // Purpose
    // -------
    // Argmin error kinds map onto their wrapper variants.
    //
    // Given
    // -----
    // - `ArgminError::NotInitialized`.
    //
    // Expect
    // ------
    // - `OptError::NotInitialized` with the same text.
    fn argmin_error_kinds_are_mapped() {
        // Arrange
        let wrapped: Error = ArgminError::NotInitialized { text: "no param".to_string() }.into();

        // Act
        let err = OptError::from(wrapped);

        // Assert
        assert_eq!(err, OptError::NotInitialized { text: "no param".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Foreign errors fall back to `BackendError`.
    //
    // Given
    // -----
    // - An `anyhow`-style message error.
    //
    // Expect
    // ------
    // - `BackendError` containing the message.
    fn foreign_errors_become_backend_errors() {
        // Arrange
        let wrapped = Error::msg("socket closed");

        // Act
        let err = OptError::from(wrapped);

        // Assert
        assert_eq!(err, OptError::BackendError { text: "socket closed".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Configuration errors are distinguishable from evaluation failures.
    //
    // Given
    // -----
    // - `UnknownOptimizer` and `EstimatorFailed`.
    //
    // Expect
    // ------
    // - Only the former is classified as configuration.
    fn configuration_errors_are_classified() {
        // Arrange
        let config = OptError::UnknownOptimizer { name: "cobyla".to_string(), reason: "" };
        let eval = OptError::EstimatorFailed {
            eval_index: 0,
            source: EstimatorError::Backend { text: "x".to_string() },
        };

        // Assert
        assert!(config.is_configuration());
        assert!(!eval.is_configuration());
    }
}
