//! experiment — parameter sweeps over noisy VQE runs and their summaries.
//!
//! Purpose
//! -------
//! Orchestrate many independent SPSA runs over a grid of shot counts,
//! iteration counts, depolarizing error scales and bond lengths, and
//! collect what downstream plotting needs: energy trajectories, headline
//! energies, tail variances and circuit depths.
//!
//! Key behaviors
//! -------------
//! - [`config`]: [`SweepConfig`] with up-front validation, [`ExperimentKey`],
//!   [`Molecule`] and [`Ansatz`] selectors.
//! - [`runner`]: [`run_sweep`] and the [`EstimatorFactory`] seam through
//!   which callers plug in their quantum backend.
//! - [`report`]: the fixed-width results table, tail variance, convergence
//!   subsampling and PES extraction.
//!
//! Invariants & assumptions
//! ------------------------
//! - Experiment keys are unique within a sweep; results live in a
//!   `BTreeMap` ordered by key.
//! - Every run writes its own log file, so separate runs never share an
//!   output path.
//! - Runs execute sequentially on the calling thread.
//!
//! Testing notes
//! -------------
//! - Unit tests use closure factories around `FnEstimator` and temporary
//!   directories; end-to-end sweeps live in `tests/`.

pub mod config;
pub mod errors;
pub mod report;
pub mod runner;

pub use self::config::{Ansatz, ExperimentKey, Molecule, SweepConfig};
pub use self::errors::{ExperimentError, ExperimentResult};
pub use self::report::{
    ResultsWriter, RunRecord, SweepEntry, SweepResults, convergence_series, pes_curve,
    tail_variance,
};
pub use self::runner::{EstimatorFactory, RunPoint, run_sweep};
