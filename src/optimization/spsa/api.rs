//! High-level entry points for minimizing an energy estimator with SPSA.
//!
//! [`minimize`] validates the inputs, binds the estimator to an
//! [`ObjectiveAdapter`] that logs every evaluation, and delegates the run to
//! [`run_spsa`]. [`final_energy`] performs the single headline evaluation
//! that callers report separately from the trajectory.
use std::{cell::RefCell, io::Write, mem};

use crate::{
    estimation::traits::Estimator,
    optimization::{
        errors::{OptError, OptResult},
        spsa::{
            adapter::ObjectiveAdapter,
            history::{HistoryTracker, SpsaStep},
            run::run_spsa,
            solver::Spsa,
            traits::{SpsaOptions, SpsaOutcome},
            types::{Energy, ParamVector},
            validation::validate_run,
        },
    },
};

/// Minimize ⟨H⟩(θ) from `x0` with SPSA.
///
/// # Behavior
/// - Validates `opts` and `x0` (length equal to
///   `estimator.num_parameters()`, finite entries) before any evaluation.
/// - Writes the log header to `sink`, then one row per estimator call.
/// - Appends every evaluation and every step to `history`.
/// - Invokes `callback`, if given, once per logical iteration.
///
/// # Errors
/// - Configuration errors ([`OptError::is_configuration`]) leave `history`
///   and `sink` untouched.
/// - Evaluation failures abort the run; `history` keeps every evaluation
///   recorded before the failure.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use noisy_vqe::estimation::FnEstimator;
/// use noisy_vqe::optimization::spsa::{HistoryTracker, SpsaOptions, minimize};
///
/// let mut est = FnEstimator::new(2, |x: &ndarray::Array1<f64>| Ok(x.dot(x)));
/// let mut history = HistoryTracker::new();
/// let out = minimize(
///     &mut est, array![0.5, -0.5], &SpsaOptions::default(), &mut history,
///     std::io::sink(), None,
/// )?;
/// println!("{} evaluations, final value {:?}", out.n_evals, out.value);
/// # Ok::<(), noisy_vqe::optimization::errors::OptError>(())
/// ```
pub fn minimize<E, W>(
    estimator: &mut E, x0: ParamVector, opts: &SpsaOptions, history: &mut HistoryTracker,
    sink: W, callback: Option<&mut dyn FnMut(&SpsaStep)>,
) -> OptResult<SpsaOutcome>
where
    E: Estimator,
    W: Write,
{
    validate_run(&x0, estimator.num_parameters(), opts)?;
    let shared = RefCell::new(mem::take(history));
    let outcome = minimize_shared(estimator, x0, opts, &shared, sink, callback);
    *history = shared.into_inner();
    outcome
}

/// Evaluate the estimator once at `params`, outside any trajectory.
///
/// # Errors
/// - [`OptError::ParamLengthMismatch`] for a wrong-length vector.
/// - [`OptError::FinalEnergyFailed`] if the estimator fails.
/// - [`OptError::NonFiniteFinalEnergy`] for NaN/±∞.
pub fn final_energy<E: Estimator>(estimator: &mut E, params: &ParamVector) -> OptResult<Energy> {
    let expected = estimator.num_parameters();
    if params.len() != expected {
        return Err(OptError::ParamLengthMismatch { expected, found: params.len() });
    }
    let value = estimator
        .estimate(params)
        .map_err(|source| OptError::FinalEnergyFailed { source })?
        .value;
    if !value.is_finite() {
        return Err(OptError::NonFiniteFinalEnergy { value });
    }
    Ok(value)
}

// ---- Helper Methods ----

fn minimize_shared<E, W>(
    estimator: &mut E, x0: ParamVector, opts: &SpsaOptions, shared: &RefCell<HistoryTracker>,
    sink: W, mut callback: Option<&mut dyn FnMut(&SpsaStep)>,
) -> OptResult<SpsaOutcome>
where
    E: Estimator,
    W: Write,
{
    let problem = ObjectiveAdapter::new(estimator, shared, sink)?;
    let solver = Spsa::new(opts).with_callback(Box::new(move |step: &SpsaStep| {
        shared.borrow_mut().record_step(step);
        if let Some(cb) = callback.as_deref_mut() {
            cb(step);
        }
    }));
    run_spsa(x0, opts, problem, solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        estimation::{errors::EstimatorError, traits::FnEstimator},
        optimization::spsa::{schedule::GainSchedule, traits::Blocking},
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The public `minimize` wiring: history, log, callback and outcome
    //   agree with each other.
    // - Configuration errors raised before any evaluation.
    // - Evaluation failures keeping the partial history.
    // - `final_energy`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Outcome counters, history, log rows and callback invocations agree.
    //
    // Given
    // -----
    // - A 2-parameter bowl, fixed gains, strict blocking, 10 iterations,
    //   a counting callback and a `Vec<u8>` log.
    //
    // Expect
    // ------
    // - 31 evaluations everywhere (the initial point plus three per
    //   iteration), 10 callback calls, 32 log lines.
    fn minimize_keeps_all_records_consistent() {
        // Arrange
        let mut est = FnEstimator::new(2, |x: &ParamVector| Ok(x.dot(x)));
        let opts =
            SpsaOptions::new(10, 1e-8, Some(Blocking::strict()), GainSchedule::fixed(0.1, 0.1), 3)
                .unwrap();
        let mut history = HistoryTracker::new();
        let mut log: Vec<u8> = Vec::new();
        let mut calls = 0usize;
        let mut count = |_: &SpsaStep| calls += 1;

        // Act
        let out =
            minimize(&mut est, array![0.6, -0.9], &opts, &mut history, &mut log, Some(&mut count))
                .unwrap();

        // Assert
        assert_eq!(calls, 10);
        assert_eq!(out.iterations, 10);
        assert_eq!(out.n_evals, 31);
        assert_eq!(history.len(), 31);
        assert_eq!(history.steps().len(), 10);
        assert_eq!(out.n_accepted + out.n_rejected, 10);
        assert_eq!(String::from_utf8(log).unwrap().lines().count(), 32);
        let f0 = history.evaluations()[0].energy;
        assert_eq!(out.value, Some(history.committed_values().last().copied().unwrap_or(f0)));
    }

    #[test]
    // Purpose
    // -------
    // Bad inputs are rejected before the estimator or the log is touched.
    //
    // Given
    // -----
    // - A 2-parameter estimator with a 3-vector start.
    //
    // Expect
    // ------
    // - A configuration error, an empty log and an empty history.
    fn configuration_errors_precede_evaluation() {
        // Arrange
        let mut est = FnEstimator::new(2, |_: &ParamVector| Ok(0.0));
        let mut history = HistoryTracker::new();
        let mut log: Vec<u8> = Vec::new();

        // Act
        let err = minimize(
            &mut est,
            array![0.0, 0.0, 0.0],
            &SpsaOptions::default(),
            &mut history,
            &mut log,
            None,
        )
        .unwrap_err();

        // Assert
        assert!(err.is_configuration());
        assert!(log.is_empty());
        assert!(history.is_empty());
    }

    #[test]
    // Purpose
    // -------
    // An estimator failure aborts the run and the caller keeps the partial
    // history.
    //
    // Given
    // -----
    // - An estimator failing on its 8th call, fixed gains, blocking.
    //
    // Expect
    // ------
    // - `EstimatorFailed { eval_index: 7 }`, 7 records (initial point and
    //   two complete steps).
    fn estimator_failure_keeps_partial_history() {
        // Arrange
        let mut calls = 0usize;
        let mut est = FnEstimator::new(1, move |x: &ParamVector| {
            calls += 1;
            if calls == 8 {
                Err(EstimatorError::Backend { text: "job lost".to_string() })
            } else {
                Ok(x[0] * x[0])
            }
        });
        let opts =
            SpsaOptions::new(10, 1e-8, Some(Blocking::strict()), GainSchedule::fixed(0.1, 0.1), 0)
                .unwrap();
        let mut history = HistoryTracker::new();

        // Act
        let err = minimize(&mut est, array![1.0], &opts, &mut history, std::io::sink(), None)
            .unwrap_err();

        // Assert
        assert!(matches!(err, OptError::EstimatorFailed { eval_index: 7, .. }));
        assert_eq!(history.len(), 7);
        assert_eq!(history.steps().len(), 2);
    }

    #[test]
    // Purpose
    // -------
    // A tracker reused across runs accumulates records, while each run's log
    // still numbers its evaluations from 0.
    //
    // Given
    // -----
    // - Two fixed-gain blocking runs of 4 iterations sharing one tracker,
    //   each writing its own log.
    //
    // Expect
    // ------
    // - Both logs list indices 0..13; the tracker holds 26 records and 8
    //   steps.
    fn reused_history_restarts_log_indices() {
        // Arrange
        let mut est = FnEstimator::new(2, |x: &ParamVector| Ok(x.dot(x)));
        let opts =
            SpsaOptions::new(4, 1e-8, Some(Blocking::strict()), GainSchedule::fixed(0.1, 0.1), 5)
                .unwrap();
        let mut history = HistoryTracker::new();
        let mut first: Vec<u8> = Vec::new();
        let mut second: Vec<u8> = Vec::new();

        // Act
        minimize(&mut est, array![0.4, 0.2], &opts, &mut history, &mut first, None).unwrap();
        minimize(&mut est, array![-0.3, 0.7], &opts, &mut history, &mut second, None).unwrap();

        // Assert
        for log in [first, second] {
            let indices: Vec<usize> = String::from_utf8(log)
                .unwrap()
                .lines()
                .skip(1)
                .map(|l| l.split_whitespace().next().unwrap().parse().unwrap())
                .collect();
            assert_eq!(indices, (0..13).collect::<Vec<_>>());
        }
        assert_eq!(history.len(), 26);
        assert_eq!(history.steps().len(), 8);
    }

    #[test]
    // Purpose
    // -------
    // The headline evaluation calls the estimator once and checks its output.
    //
    // Given
    // -----
    // - A bowl estimator and a NaN estimator.
    //
    // Expect
    // ------
    // - `0.25` for `[0.5]`; `NonFiniteFinalEnergy` for NaN.
    fn final_energy_evaluates_once() {
        // Arrange
        let mut bowl = FnEstimator::new(1, |x: &ParamVector| Ok(x[0] * x[0]));
        let mut nan = FnEstimator::new(1, |_: &ParamVector| Ok(f64::NAN));

        // Act + Assert
        assert_eq!(final_energy(&mut bowl, &array![0.5]), Ok(0.25));
        assert!(matches!(
            final_energy(&mut nan, &array![0.5]),
            Err(OptError::NonFiniteFinalEnergy { .. })
        ));
    }
}
