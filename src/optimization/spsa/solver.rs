//! spsa::solver — the SPSA iteration as an `argmin` solver.
//!
//! Purpose
//! -------
//! Drive a noisy objective with Simultaneous Perturbation Stochastic
//! Approximation: two symmetric evaluations give a gradient estimate along a
//! random ±1 direction, a decaying learning rate turns it into a proposal, and
//! an optional blocking test decides whether the proposal is committed.
//!
//! Key behaviors
//! -------------
//! - `init` resolves the gain schedule. A calibrated schedule spends
//!   `2 * steps` evaluations at the initial point, only when at least one
//!   iteration will run. With blocking enabled it then evaluates the
//!   initial point once more to seed the committed value.
//! - `next_iter` performs exactly two evaluations, plus one when blocking is
//!   enabled, then reports an [`SpsaStep`] to the callback.
//! - Termination is left to `argmin`'s `max_iters` check; there is no
//!   convergence test.
//!
//! Invariants & assumptions
//! ------------------------
//! - Directions come from a `StdRng` seeded at construction, so a fixed seed
//!   and a deterministic objective reproduce the whole trajectory.
//! - Under blocking the committed value is always an evaluation at the
//!   committed parameters, starting with `f(x0)`; it never rises above it
//!   for a deterministic objective.
//! - A rejected proposal leaves parameters and committed value unchanged but
//!   still counts as an iteration.
//! - Every evaluation goes through `Problem::cost`; errors are never caught.
//!
//! Conventions
//! -----------
//! - Gradient component `i` is `(f₊ − f₋) / (2 c_k Δ_i + regularization)`.
//! - `step_size` is the Euclidean norm of `a_k · ĝ`.
use crate::optimization::{
    errors::OptError,
    spsa::{
        history::SpsaStep,
        schedule::{GainSchedule, Gains},
        traits::{Blocking, SpsaOptions},
        types::{Direction, Energy, ParamVector, SpsaState},
    },
};
use argmin::core::{ArgminError, CostFunction, Error, KV, Problem, Solver, State};
use argmin_math::ArgminL2Norm;
use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Per-iteration observer invoked by [`Spsa`].
pub type StepCallback<'a> = Box<dyn FnMut(&SpsaStep) + 'a>;

/// SPSA solver state that lives across iterations.
pub struct Spsa<'a> {
    rng: StdRng,
    schedule: GainSchedule,
    gains: Option<Gains>,
    blocking: Option<Blocking>,
    regularization: f64,
    current_fx: Option<Energy>,
    n_evals: usize,
    n_accepted: usize,
    n_rejected: usize,
    callback: Option<StepCallback<'a>>,
}

impl<'a> Spsa<'a> {
    /// Build a solver from already validated options.
    pub fn new(opts: &SpsaOptions) -> Self {
        Self {
            rng: StdRng::seed_from_u64(opts.seed),
            schedule: opts.gains,
            gains: None,
            blocking: opts.blocking,
            regularization: opts.regularization,
            current_fx: None,
            n_evals: 0,
            n_accepted: 0,
            n_rejected: 0,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: StepCallback<'a>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Gains in use, once `init` has run.
    pub fn gains(&self) -> Option<Gains> {
        self.gains
    }

    pub fn n_evals(&self) -> usize {
        self.n_evals
    }

    pub fn n_accepted(&self) -> usize {
        self.n_accepted
    }

    pub fn n_rejected(&self) -> usize {
        self.n_rejected
    }

    /// Last committed objective value.
    pub fn current_value(&self) -> Option<Energy> {
        self.current_fx
    }

    fn direction(&mut self, n: usize) -> Direction {
        Array1::from_shape_fn(n, |_| if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 })
    }

    /// Evaluate `f(x + shift)` and `f(x - shift)` in that order.
    fn symmetric_pair<O>(
        &mut self, problem: &mut Problem<O>, x: &ParamVector, shift: &Direction,
    ) -> Result<(Energy, Energy), Error>
    where
        O: CostFunction<Param = ParamVector, Output = Energy>,
    {
        let f_plus = problem.cost(&(x + shift))?;
        self.n_evals += 1;
        let f_minus = problem.cost(&(x - shift))?;
        self.n_evals += 1;
        Ok((f_plus, f_minus))
    }
}

impl<'a, O> Solver<O, SpsaState> for Spsa<'a>
where
    O: CostFunction<Param = ParamVector, Output = Energy>,
{
    const NAME: &'static str = "SPSA";

    fn init(
        &mut self, problem: &mut Problem<O>, state: SpsaState,
    ) -> Result<(SpsaState, Option<KV>), Error> {
        if state.get_max_iters() == 0 {
            if let GainSchedule::Fixed(gains) = self.schedule {
                self.gains = Some(gains);
            }
            return Ok((state, None));
        }
        let x0 = state.get_param().ok_or(OptError::MissingParams)?.clone();
        let gains = match self.schedule {
            GainSchedule::Fixed(gains) => gains,
            GainSchedule::Calibrated(cal) => {
                let mut total = 0.0;
                for _ in 0..cal.steps {
                    let shift = self.direction(x0.len()) * cal.c;
                    let (f_plus, f_minus) = self.symmetric_pair(problem, &x0, &shift)?;
                    total += (f_plus - f_minus).abs() / (2.0 * cal.c);
                }
                cal.resolve(total / cal.steps as f64)
            }
        };
        self.gains = Some(gains);

        if self.blocking.is_some() {
            let f0 = problem.cost(&x0)?;
            self.n_evals += 1;
            self.current_fx = Some(f0);
            return Ok((state.cost(f0), None));
        }
        Ok((state, None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, mut state: SpsaState,
    ) -> Result<(SpsaState, Option<KV>), Error> {
        let gains = self.gains.ok_or_else(|| ArgminError::NotInitialized {
            text: "SPSA gains were not resolved before the first iteration.".to_string(),
        })?;
        let k = state.get_iter();
        let x = state.take_param().ok_or(OptError::MissingParams)?;

        let c_k = gains.perturbation(k);
        let a_k = gains.learning_rate(k);
        let delta = self.direction(x.len());
        let (f_plus, f_minus) = self.symmetric_pair(problem, &x, &(&delta * c_k))?;

        let denom = &delta * (2.0 * c_k) + self.regularization;
        let grad = denom.mapv(|d| (f_plus - f_minus) / d);
        let update = grad * a_k;
        let step_size = update.l2_norm();
        let proposal = &x - &update;

        let pair_mean = 0.5 * (f_plus + f_minus);

        let (committed_x, committed_fx, step) = match self.blocking {
            Some(blocking) => {
                let current = self.current_fx.ok_or_else(|| ArgminError::NotInitialized {
                    text: "Blocking needs the objective at the initial point.".to_string(),
                })?;
                let f_proposal = problem.cost(&proposal)?;
                self.n_evals += 1;
                if blocking.accepts(current, f_proposal) {
                    let step = self.step(k, &proposal, f_proposal, step_size, true);
                    (proposal, f_proposal, step)
                } else {
                    let step = self.step(k, &proposal, f_proposal, step_size, false);
                    (x, current, step)
                }
            }
            None => {
                let step = self.step(k, &proposal, pair_mean, step_size, true);
                (proposal, pair_mean, step)
            }
        };

        if step.accepted {
            self.n_accepted += 1;
        } else {
            self.n_rejected += 1;
        }
        self.current_fx = Some(committed_fx);
        if let Some(callback) = self.callback.as_mut() {
            callback(&step);
        }

        Ok((state.param(committed_x).cost(committed_fx), None))
    }
}

impl<'a> Spsa<'a> {
    fn step(
        &self, iteration: u64, params: &ParamVector, value: Energy, step_size: f64, accepted: bool,
    ) -> SpsaStep {
        SpsaStep {
            iteration,
            n_evals: self.n_evals,
            params: params.clone(),
            value,
            step_size,
            accepted,
        }
    }
}
