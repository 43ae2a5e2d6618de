//! spsa::history — append-only record of evaluations and optimizer steps.
//!
//! Purpose
//! -------
//! Keep every parameter vector the optimizer asked about, with the energy
//! the estimator returned, and the per-step detail reported through the
//! solver callback, for inspection and plotting after (or during) a run.
//!
//! Key behaviors
//! -------------
//! - [`HistoryTracker::record`] appends one [`EvaluationRecord`] per
//!   estimator call; it is the only mutator of the evaluation log.
//! - [`HistoryTracker::record_step`] appends one [`SpsaStep`] per logical
//!   iteration, whether the proposal was accepted or not.
//! - Read access exposes the ordered energies, parameter snapshots, and the
//!   committed-value trajectory.
//!
//! Invariants & assumptions
//! ------------------------
//! - Evaluation indices are `0, 1, 2, …` with no gaps, equal to the number
//!   of records before the call; parameters and energies therefore always
//!   have the same length.
//! - Evaluations and steps live in separate logs, so a single estimator
//!   call is never counted twice.
//! - Records are immutable once appended.
//!
//! Testing notes
//! -------------
//! - Unit tests check index assignment, step bookkeeping and the committed
//!   trajectory; end-to-end counts are covered by the solver tests.
use crate::optimization::spsa::types::{Energy, ParamVector};

/// One objective evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    /// Number of evaluations that happened before this one.
    pub index: usize,
    pub params: ParamVector,
    pub energy: Energy,
}

/// Per-iteration detail reported by the SPSA solver.
///
/// - `iteration`: 0-based logical iteration.
/// - `n_evals`: cumulative objective evaluations, calibration included.
/// - `params` / `value`: the committed parameters and value when
///   `accepted`, otherwise the rejected proposal and its value.
/// - `step_size`: Euclidean norm of the proposed update.
#[derive(Debug, Clone, PartialEq)]
pub struct SpsaStep {
    pub iteration: u64,
    pub n_evals: usize,
    pub params: ParamVector,
    pub value: Energy,
    pub step_size: f64,
    pub accepted: bool,
}

/// Append-only evaluation and step log for one optimization run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTracker {
    evaluations: Vec<EvaluationRecord>,
    steps: Vec<SpsaStep>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an evaluation and return its index within this tracker.
    pub fn record(&mut self, params: &ParamVector, energy: Energy) -> usize {
        let index = self.evaluations.len();
        self.evaluations.push(EvaluationRecord { index, params: params.clone(), energy });
        index
    }

    /// Append a step reported by the solver callback.
    pub fn record_step(&mut self, step: &SpsaStep) {
        self.steps.push(step.clone());
    }

    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }

    pub fn evaluations(&self) -> &[EvaluationRecord] {
        &self.evaluations
    }

    pub fn steps(&self) -> &[SpsaStep] {
        &self.steps
    }

    /// Energies in evaluation order.
    pub fn energies(&self) -> Vec<Energy> {
        self.evaluations.iter().map(|r| r.energy).collect()
    }

    /// Parameter snapshots in evaluation order.
    pub fn params(&self) -> impl Iterator<Item = &ParamVector> {
        self.evaluations.iter().map(|r| &r.params)
    }

    /// Value held by the optimizer at the end of each iteration.
    ///
    /// Rejected steps repeat the previous committed value; before the first
    /// acceptance a rejected step contributes nothing.
    pub fn committed_values(&self) -> Vec<Energy> {
        let mut out = Vec::with_capacity(self.steps.len());
        let mut current: Option<Energy> = None;
        for step in &self.steps {
            if step.accepted {
                current = Some(step.value);
            }
            if let Some(v) = current {
                out.push(v);
            }
        }
        out
    }

    pub fn n_accepted(&self) -> usize {
        self.steps.iter().filter(|s| s.accepted).count()
    }

    pub fn n_rejected(&self) -> usize {
        self.steps.len() - self.n_accepted()
    }

    /// Drop everything, e.g. before reusing the tracker for a new run.
    pub fn clear(&mut self) {
        self.evaluations.clear();
        self.steps.clear();
    }
}
