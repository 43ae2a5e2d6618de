//! Validation helpers for SPSA runs.
//!
//! Everything here runs before the first estimator call, so a rejected
//! configuration never leaves a partial trajectory behind:
//!
//! - [`validate_initial_point`]: length against the ansatz parameter count,
//!   finiteness of every entry.
//! - [`validate_run`]: option checks plus the initial point.
use crate::optimization::{
    errors::{OptError, OptResult},
    spsa::{traits::SpsaOptions, types::ParamVector},
};

/// Validate an initial parameter vector.
///
/// # Errors
/// - [`OptError::ParamLengthMismatch`] if `x0.len() != n_params`.
/// - [`OptError::InvalidInitialParam`] with the index and value of the first
///   non-finite entry.
pub fn validate_initial_point(x0: &ParamVector, n_params: usize) -> OptResult<()> {
    if x0.len() != n_params {
        return Err(OptError::ParamLengthMismatch { expected: n_params, found: x0.len() });
    }
    for (index, &value) in x0.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidInitialParam { index, value });
        }
    }
    Ok(())
}

/// Validate options and initial point together.
pub fn validate_run(x0: &ParamVector, n_params: usize, opts: &SpsaOptions) -> OptResult<()> {
    opts.validate()?;
    validate_initial_point(x0, n_params)
}
