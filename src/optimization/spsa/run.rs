//! Execution helper that runs the SPSA solver on an objective and returns a
//! crate-friendly [`SpsaOutcome`].
use crate::optimization::{
    errors::{OptError, OptResult},
    spsa::{
        solver::Spsa,
        traits::{SpsaOptions, SpsaOutcome},
        types::{Energy, ParamVector},
    },
};
use argmin::core::{CostFunction, Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run SPSA on `problem` starting from `x0`.
///
/// Wires up the executor with the initial point and `opts.max_iter`, runs it,
/// and reads the committed parameters and counters back from the final
/// state and solver.
///
/// # Feature flags
/// With `obs_slog` and `opts.verbose == true`, a terminal slog observer is
/// attached with `ObserverMode::Always` and a one-time line describing the
/// initial point is written to stderr. The line does not evaluate the
/// objective, so evaluation counts are identical with and without it.
///
/// # Errors
/// Any error raised inside the objective or the solver, converted back into
/// [`OptError`] through
/// `From<argmin::core::Error>`.
pub fn run_spsa<'a, O>(
    x0: ParamVector, opts: &SpsaOptions, problem: O, solver: Spsa<'a>,
) -> OptResult<SpsaOutcome>
where
    O: CostFunction<Param = ParamVector, Output = Energy>,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&x0);
    }
    let max_iter = opts.max_iter;
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(x0).max_iters(max_iter));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let result = optimizer.run()?;
    let solver = result.solver();
    let mut state = result.state().clone();
    let iterations = state.get_iter();
    let termination = state.get_termination_status().clone();
    let params = state.take_param().ok_or(OptError::MissingParams)?;
    Ok(SpsaOutcome::new(
        params,
        solver.current_value(),
        &termination,
        iterations,
        solver.n_evals(),
        solver.n_accepted(),
        solver.n_rejected(),
    ))
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state(x0: &ParamVector) {
    eprintln!("init: n_params = {}, ||theta0|| = {:.6}", x0.len(), x0.l2_norm());
}
