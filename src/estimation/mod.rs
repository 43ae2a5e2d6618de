//! estimation — the noisy expectation-value oracle and its noise settings.
//!
//! Purpose
//! -------
//! Define the narrow interface the optimization loop consumes from the
//! quantum backend: a stateful, seeded [`Estimator`] that maps a parameter
//! vector to a noisy energy, plus the noise/connectivity configuration used
//! to build one.
//!
//! Key behaviors
//! -------------
//! - [`traits`]: the [`Estimator`] trait, [`Estimate`] values, the
//!   [`EstimatorKind`] selector, and the closure-backed [`FnEstimator`].
//! - [`noise`]: depolarizing probabilities scaled per experiment, ring
//!   coupling maps, and shot-noise policies/wrappers.
//! - [`errors`]: the [`EstimatorError`] surface, converted into
//!   `OptError` by the optimization layer.
//!
//! Invariants & assumptions
//! ------------------------
//! - Estimators are passed explicitly to the objective adapter; nothing in
//!   this crate reads a globally configured backend.
//! - Every configuration error is detectable before the first evaluation.
//!
//! Downstream usage
//! ----------------
//! - Experiment code implements `EstimatorFactory` on top of these types
//!   to build one estimator per sweep point.
//! - Tests and small models wrap closures in [`FnEstimator`].

pub mod errors;
pub mod noise;
pub mod traits;

pub use self::errors::{EstResult, EstimatorError};
pub use self::noise::{DepolarizingNoise, ShotNoise, ShotPolicy, coupling_map};
pub use self::traits::{Estimate, Estimator, EstimatorKind, FnEstimator};
