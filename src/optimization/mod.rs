//! optimization — SPSA feedback loop and its unified error surface.
//!
//! Purpose
//! -------
//! Turn a noisy energy estimator into a minimization problem and drive it
//! with SPSA, tracking every evaluation for later inspection. Callers supply
//! an estimator, an initial point and options, and obtain the committed
//! parameters, the evaluation history and run statistics.
//!
//! Key behaviors
//! -------------
//! - `spsa`: objective adapter, history tracker, gain schedules, the argmin
//!   solver and the `minimize` entry point.
//! - `errors`: a single enum ([`errors::OptError`]) with a common result
//!   alias ([`errors::OptResult`]) for configuration problems, evaluation
//!   failures, log I/O and backend solver errors.
//!
//! Conventions
//! -----------
//! - Public entry points that can fail return `OptResult<T>`; raw argmin
//!   errors never reach callers.
//! - This module writes only the per-run evaluation log it is handed;
//!   progress reporting belongs to the `obs_slog` observer and higher layers.
//!
//! Downstream usage
//! ----------------
//! - The experiment layer calls `spsa::minimize` once per sweep point and
//!   `spsa::final_energy` for the headline value.
//! - Front-ends import the curated surface via `optimization::prelude::*`.

pub mod errors;
pub mod spsa;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use noisy_vqe::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::spsa::prelude::*;
}
