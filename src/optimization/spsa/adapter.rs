//! Adapter that exposes an [`Estimator`] as an `argmin` cost function.
//!
//! Each call to `cost` invokes the estimator exactly once, appends an
//! [`EvaluationRecord`](crate::optimization::spsa::history::EvaluationRecord)
//! to the shared [`HistoryTracker`], and writes one line to the persisted
//! per-run log. The log and the tracker therefore hold the same evaluations
//! in the same order. Estimator failures are not retried; they surface as
//! `OptError` and abort the run.
//!
//! Log row indices and `eval_index` count this adapter's evaluations from
//! 0, even when the tracker already holds records of earlier runs.
use std::{
    cell::{Cell, RefCell},
    io::Write,
};

use crate::{
    estimation::traits::Estimator,
    optimization::{
        errors::{OptError, OptResult},
        spsa::{
            history::HistoryTracker,
            types::{Energy, ParamVector},
        },
    },
};
use argmin::core::{CostFunction, Error};

/// Column header of the per-run evaluation log.
pub fn log_header() -> String {
    format!("{:>10} {:>20}", "Iter", "Energy (Hartree)")
}

/// One line of the per-run evaluation log.
pub fn log_row(index: usize, energy: Energy) -> String {
    format!("{index:>10} {energy:>20.6}")
}

/// Bridges an [`Estimator`] to `argmin`'s `CostFunction`.
///
/// - `estimator`: exclusively borrowed for the run; interior mutability is
///   needed because `CostFunction::cost` takes `&self`.
/// - `history`: shared with the caller, who keeps it after the run, even a
///   failed one.
/// - `sink`: persisted log, one header line then one row per evaluation.
pub struct ObjectiveAdapter<'a, E: Estimator, W: Write> {
    estimator: RefCell<&'a mut E>,
    history: &'a RefCell<HistoryTracker>,
    sink: RefCell<W>,
    n_params: usize,
    n_calls: Cell<usize>,
}

impl<'a, E: Estimator, W: Write> ObjectiveAdapter<'a, E, W> {
    /// Bind an estimator, a history tracker and a log sink.
    ///
    /// Writes the log header immediately.
    ///
    /// # Errors
    /// [`OptError::LogWrite`] if the header cannot be written.
    pub fn new(
        estimator: &'a mut E, history: &'a RefCell<HistoryTracker>, mut sink: W,
    ) -> OptResult<Self> {
        writeln!(sink, "{}", log_header())?;
        sink.flush()?;
        let n_params = estimator.num_parameters();
        Ok(Self {
            estimator: RefCell::new(estimator),
            history,
            sink: RefCell::new(sink),
            n_params,
            n_calls: Cell::new(0),
        })
    }

    /// Evaluate ⟨H⟩(θ) once and log it.
    ///
    /// # Errors
    /// - [`OptError::ParamLengthMismatch`] if `params` has the wrong length
    ///   (no estimator call is made).
    /// - [`OptError::EstimatorFailed`] if the estimator fails.
    /// - [`OptError::NonFiniteEnergy`] if the returned value is NaN/±∞.
    /// - [`OptError::LogWrite`] if the log row cannot be written.
    pub fn evaluate(&self, params: &ParamVector) -> OptResult<Energy> {
        if params.len() != self.n_params {
            return Err(OptError::ParamLengthMismatch {
                expected: self.n_params,
                found: params.len(),
            });
        }
        let eval_index = self.n_calls.get();
        let estimate = self
            .estimator
            .borrow_mut()
            .estimate(params)
            .map_err(|source| OptError::EstimatorFailed { eval_index, source })?;
        let energy = estimate.value;
        if !energy.is_finite() {
            return Err(OptError::NonFiniteEnergy { eval_index, value: energy });
        }

        self.history.borrow_mut().record(params, energy);
        self.n_calls.set(eval_index + 1);
        let mut sink = self.sink.borrow_mut();
        writeln!(sink, "{}", log_row(eval_index, energy))?;
        sink.flush()?;
        Ok(energy)
    }

    pub fn num_parameters(&self) -> usize {
        self.n_params
    }
}

impl<'a, E: Estimator, W: Write> CostFunction for ObjectiveAdapter<'a, E, W> {
    type Param = ParamVector;
    type Output = Energy;

    /// Evaluate the energy at `params`.
    ///
    /// # Errors
    /// Any `OptError` from [`ObjectiveAdapter::evaluate`], carried through
    /// argmin and recovered by `From<argmin::core::Error> for OptError`.
    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.evaluate(params)?)
    }
}
