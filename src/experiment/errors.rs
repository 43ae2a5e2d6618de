use crate::{estimation::errors::EstimatorError, optimization::errors::OptError};

/// Result alias for sweep configuration, execution and reporting.
pub type ExperimentResult<T> = Result<T, ExperimentError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentError {
    // ---- SweepConfig ----
    /// `2 * active_orbitals` must be a supported qubit count.
    UnsupportedActiveSpace {
        active_orbitals: usize,
        n_qubits: usize,
        reason: &'static str,
    },

    /// Electrons must fit in the active spin orbitals.
    InvalidElectronCount {
        n_electrons: usize,
        max: usize,
    },

    /// A sweep axis has no values.
    EmptyGrid {
        name: &'static str,
    },

    /// Bond lengths must be finite and strictly positive.
    InvalidBondLength {
        value: f64,
        reason: &'static str,
    },

    /// Iteration counts must be strictly positive.
    InvalidIterationCount {
        value: u64,
    },

    /// Error scales must be finite and non-negative.
    InvalidErrorScale {
        value: f64,
        reason: &'static str,
    },

    /// Two grid points map onto the same `(n_shots, n_iters, dep_error)` key.
    DuplicateKey {
        n_shots: u64,
        n_iters: u64,
        dep_error: f64,
    },

    /// Tail variance needs at least two energies.
    InvalidTailWindow {
        value: usize,
    },

    /// Ansatz name not supported.
    UnknownAnsatz {
        name: String,
        reason: &'static str,
    },

    /// Molecule name not supported.
    UnknownMolecule {
        name: String,
        reason: &'static str,
    },

    // ---- Execution ----
    /// Optimization of one sweep point failed.
    Optimization {
        source: OptError,
    },

    /// Estimator construction for one sweep point failed.
    Estimator {
        source: EstimatorError,
    },

    /// Results table or log directory I/O failed.
    Io {
        text: String,
    },
}

impl ExperimentError {
    /// `true` for errors detected before any evaluation.
    pub fn is_configuration(&self) -> bool {
        match self {
            ExperimentError::Optimization { source } => source.is_configuration(),
            ExperimentError::Estimator { .. } | ExperimentError::Io { .. } => false,
            _ => true,
        }
    }
}

impl std::error::Error for ExperimentError {}

impl std::fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- SweepConfig ----
            ExperimentError::UnsupportedActiveSpace { active_orbitals, n_qubits, reason } => {
                write!(
                    f,
                    "Unsupported active space: {active_orbitals} orbitals ({n_qubits} qubits): {reason}"
                )
            }
            ExperimentError::InvalidElectronCount { n_electrons, max } => {
                write!(f, "Invalid electron count {n_electrons}: at most {max} fit the active space")
            }
            ExperimentError::EmptyGrid { name } => {
                write!(f, "Sweep axis '{name}' is empty")
            }
            ExperimentError::InvalidBondLength { value, reason } => {
                write!(f, "Invalid bond length {value}: {reason}")
            }
            ExperimentError::InvalidIterationCount { value } => {
                write!(f, "Invalid iteration count {value}: must be positive")
            }
            ExperimentError::InvalidErrorScale { value, reason } => {
                write!(f, "Invalid depolarizing error scale {value}: {reason}")
            }
            ExperimentError::DuplicateKey { n_shots, n_iters, dep_error } => {
                write!(
                    f,
                    "Duplicate experiment key (n_shots={n_shots}, n_iters={n_iters}, dep_error={dep_error})"
                )
            }
            ExperimentError::InvalidTailWindow { value } => {
                write!(f, "Invalid tail window {value}: must be at least 2")
            }
            ExperimentError::UnknownAnsatz { name, reason } => {
                write!(f, "Unknown ansatz '{name}': {reason}")
            }
            ExperimentError::UnknownMolecule { name, reason } => {
                write!(f, "Unknown molecule '{name}': {reason}")
            }

            // ---- Execution ----
            ExperimentError::Optimization { source } => {
                write!(f, "Optimization failed: {source}")
            }
            ExperimentError::Estimator { source } => {
                write!(f, "Estimator construction failed: {source}")
            }
            ExperimentError::Io { text } => {
                write!(f, "I/O error: {text}")
            }
        }
    }
}

impl From<OptError> for ExperimentError {
    fn from(err: OptError) -> Self {
        ExperimentError::Optimization { source: err }
    }
}

impl From<EstimatorError> for ExperimentError {
    fn from(err: EstimatorError) -> Self {
        ExperimentError::Estimator { source: err }
    }
}

impl From<std::io::Error> for ExperimentError {
    fn from(err: std::io::Error) -> Self {
        ExperimentError::Io { text: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Classification of configuration vs. execution errors.
    // - Display text for a representative variant.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Optimizer configuration errors stay configuration errors after
    // wrapping; evaluation failures do not.
    //
    // Given
    // -----
    // - Wrapped `UnknownOptimizer`, wrapped `NonFiniteEnergy`, `EmptyGrid`.
    //
    // Expect
    // ------
    // - true, false, true.
    fn configuration_classification_follows_source() {
        // Arrange
        let config: ExperimentError =
            OptError::UnknownOptimizer { name: "cobyla".to_string(), reason: "" }.into();
        let eval: ExperimentError = OptError::NonFiniteEnergy { eval_index: 4, value: f64::NAN }.into();

        // Assert
        assert!(config.is_configuration());
        assert!(!eval.is_configuration());
        assert!(ExperimentError::EmptyGrid { name: "bond_lengths" }.is_configuration());
    }

    #[test]
    // Purpose
    // -------
    // Duplicate keys name every key component.
    //
    // Given
    // -----
    // - `DuplicateKey { 0, 100, 1.0 }`.
    //
    // Expect
    // ------
    // - Message mentions all three values.
    fn duplicate_key_display() {
        let msg = ExperimentError::DuplicateKey { n_shots: 0, n_iters: 100, dep_error: 1.0 }.to_string();
        assert_eq!(msg, "Duplicate experiment key (n_shots=0, n_iters=100, dep_error=1)");
    }
}
