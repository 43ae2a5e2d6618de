//! spsa — blocking SPSA over a noisy, stateful energy estimator.
//!
//! Purpose
//! -------
//! Run the VQE feedback loop: an argmin-driven SPSA solver repeatedly asks
//! an [`adapter::ObjectiveAdapter`] for energies, the adapter calls the
//! estimator once per request, and every evaluation lands in a
//! [`HistoryTracker`] and in a persisted per-run text log.
//!
//! Key behaviors
//! -------------
//! - [`minimize`] validates the inputs, binds estimator, history and log,
//!   and runs the solver via [`run::run_spsa`]; it returns an
//!   [`SpsaOutcome`].
//! - [`solver::Spsa`] implements the iteration (two symmetric evaluations,
//!   optional blocking evaluation, callback with an [`SpsaStep`]).
//! - [`schedule`] provides fixed or calibrated gain sequences.
//! - [`final_energy`] performs the separate headline evaluation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Evaluation indices in the history and in the log are `0, 1, 2, …`
//!   and equal the number of estimator calls so far.
//! - Without blocking a run performs `2 * max_iter` evaluations after
//!   calibration; with blocking `3 * max_iter`.
//! - `max_iter` is the only stopping rule; `max_iter = 0` evaluates nothing.
//! - Estimator errors abort the run; the history keeps what was recorded.
//!
//! Conventions
//! -----------
//! - Parameters are [`ParamVector`] (`Array1<f64>`), energies [`Energy`]
//!   in Hartree, minimized directly.
//! - Errors are [`OptError`](crate::optimization::errors::OptError) values;
//!   nothing here panics on bad input.
//!
//! Testing notes
//! -------------
//! - `adapter` and `history`: one record and one log row per call.
//! - `solver`: evaluation counts, reproducibility, monotone blocking.
//! - `api`: wiring, configuration errors and partial histories.

pub mod adapter;
pub mod api;
pub mod history;
pub mod run;
pub mod schedule;
pub mod solver;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{final_energy, minimize};
pub use self::history::{EvaluationRecord, HistoryTracker, SpsaStep};
pub use self::schedule::{Calibration, GainSchedule, Gains};
pub use self::traits::{Blocking, OptimizerName, SpsaOptions, SpsaOutcome};
pub use self::types::{Energy, ParamVector};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use noisy_vqe::optimization::spsa::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::{final_energy, minimize};
    pub use super::history::{HistoryTracker, SpsaStep};
    pub use super::schedule::GainSchedule;
    pub use super::traits::{Blocking, SpsaOptions, SpsaOutcome};
    pub use super::types::{Energy, ParamVector};
}
