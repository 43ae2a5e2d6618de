//! spsa::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types used by the SPSA loop so the rest of the
//! optimization code stays agnostic to `ndarray` and Argmin generics.
//!
//! Conventions
//! -----------
//! - [`ParamVector`] is the ordered vector of variational parameters; its
//!   length equals the ansatz's parameter count.
//! - [`Energy`] is an expectation value in Hartree. SPSA minimizes it
//!   directly, so no sign flip happens anywhere in this crate.
//! - [`SpsaState`] is the Argmin iteration state. SPSA keeps no gradient,
//!   Jacobian, Hessian or residuals in it.
use argmin::core::IterState;
use ndarray::Array1;

/// Variational parameter vector `θ`.
pub type ParamVector = Array1<f64>;

/// Perturbation direction `Δ` with entries in `{-1, +1}`.
pub type Direction = Array1<f64>;

/// Scalar objective value ⟨H⟩(θ).
pub type Energy = f64;

/// Argmin iteration state used by the SPSA solver.
pub type SpsaState = IterState<ParamVector, (), (), (), (), Energy>;

/// Default calibration steps (each costs two evaluations).
pub const DEFAULT_CALIBRATION_STEPS: usize = 25;

/// Default regularization added to the gradient denominator.
pub const DEFAULT_REGULARIZATION: f64 = 1e-8;
