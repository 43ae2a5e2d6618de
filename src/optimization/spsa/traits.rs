//! Public configuration and result surface of the SPSA optimizer.
//!
//! - [`OptimizerName`]: optimizer selection by name (only SPSA exists).
//! - [`Blocking`]: acceptance test applied to each proposed update.
//! - [`SpsaOptions`]: everything fixed for one run, validated on construction.
//! - [`SpsaOutcome`]: final committed parameters and run statistics.
use std::str::FromStr;

use crate::optimization::{
    errors::{OptError, OptResult},
    spsa::{
        schedule::GainSchedule,
        types::{DEFAULT_REGULARIZATION, Energy, ParamVector},
    },
};
use argmin::core::TerminationStatus;

/// Optimizer selected by name.
///
/// Parsing is case-insensitive and accepts only `"spsa"`; anything else is
/// a configuration error raised before any evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizerName {
    #[default]
    Spsa,
}

impl FromStr for OptimizerName {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spsa" => Ok(OptimizerName::Spsa),
            _ => Err(OptError::UnknownOptimizer {
                name: s.to_string(),
                reason: "The only supported optimizer is case insensitive 'spsa'.",
            }),
        }
    }
}

/// Blocking acceptance rule.
///
/// A proposal `θ'` is evaluated once more and committed only if
/// `f(θ') <= f_current + allowed_increase`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blocking {
    pub allowed_increase: f64,
}

impl Blocking {
    /// # Errors
    /// [`OptError::InvalidAllowedIncrease`] if the value is negative or
    /// non-finite.
    pub fn new(allowed_increase: f64) -> OptResult<Self> {
        if !allowed_increase.is_finite() {
            return Err(OptError::InvalidAllowedIncrease {
                value: allowed_increase,
                reason: "Allowed increase must be finite.",
            });
        }
        if allowed_increase < 0.0 {
            return Err(OptError::InvalidAllowedIncrease {
                value: allowed_increase,
                reason: "Allowed increase must be non-negative.",
            });
        }
        Ok(Self { allowed_increase })
    }

    /// Reject anything that does not improve on or tie the current value.
    pub fn strict() -> Self {
        Self { allowed_increase: 0.0 }
    }

    pub fn accepts(&self, current: Energy, proposed: Energy) -> bool {
        proposed <= current + self.allowed_increase
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `max_iter`: logical iterations; the only stopping rule. `0` is allowed
///   and returns the initial point without evaluating anything.
/// - `regularization`: added to the gradient denominator.
/// - `blocking`: `Some` enables the acceptance test (one evaluation at the
///   initial point, then one extra evaluation per iteration).
/// - `gains`: fixed or calibrated gain sequences.
/// - `seed`: seeds the perturbation-direction generator.
/// - `verbose`: attaches a terminal observer (behind the `obs_slog`
///   feature).
///
/// Default: `max_iter = 100`, `regularization = 1e-8`, strict blocking,
/// calibrated gains, `seed = 0`, `verbose = false`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpsaOptions {
    pub max_iter: u64,
    pub regularization: f64,
    pub blocking: Option<Blocking>,
    pub gains: GainSchedule,
    pub seed: u64,
    pub verbose: bool,
}

impl SpsaOptions {
    /// Create validated optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidRegularization`] if `regularization` is negative
    ///   or non-finite.
    /// - Any gain-schedule error from [`GainSchedule::validate`].
    pub fn new(
        max_iter: u64, regularization: f64, blocking: Option<Blocking>, gains: GainSchedule,
        seed: u64,
    ) -> OptResult<Self> {
        let opts = Self { max_iter, regularization, blocking, gains, seed, verbose: false };
        opts.validate()?;
        Ok(opts)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Re-check every field; used again by `minimize` because fields are public.
    pub fn validate(&self) -> OptResult<()> {
        if !self.regularization.is_finite() {
            return Err(OptError::InvalidRegularization {
                value: self.regularization,
                reason: "Regularization must be finite.",
            });
        }
        if self.regularization < 0.0 {
            return Err(OptError::InvalidRegularization {
                value: self.regularization,
                reason: "Regularization must be non-negative.",
            });
        }
        if let Some(b) = self.blocking {
            Blocking::new(b.allowed_increase)?;
        }
        self.gains.validate()
    }

    /// Objective evaluations a complete run performs.
    pub fn expected_evals(&self) -> usize {
        if self.max_iter == 0 {
            return 0;
        }
        let iterations = self.max_iter as usize;
        let trajectory = match self.blocking {
            Some(_) => 1 + 3 * iterations,
            None => 2 * iterations,
        };
        self.gains.calibration_evals() + trajectory
    }
}

impl Default for SpsaOptions {
    fn default() -> Self {
        Self {
            max_iter: 100,
            regularization: DEFAULT_REGULARIZATION,
            blocking: Some(Blocking::strict()),
            gains: GainSchedule::default(),
            seed: 0,
            verbose: false,
        }
    }
}

/// Canonical result returned by `minimize`.
///
/// - `params`: final committed parameter vector.
/// - `value`: last committed objective value (`None` when no iteration ran).
/// - `status`: human-readable termination status.
/// - `iterations`: logical iterations performed.
/// - `n_evals`: objective evaluations, calibration included.
/// - `n_accepted` / `n_rejected`: blocking outcomes (all accepted without
///   blocking).
#[derive(Debug, Clone, PartialEq)]
pub struct SpsaOutcome {
    pub params: ParamVector,
    pub value: Option<Energy>,
    pub status: String,
    pub iterations: u64,
    pub n_evals: usize,
    pub n_accepted: usize,
    pub n_rejected: usize,
}

impl SpsaOutcome {
    pub(crate) fn new(
        params: ParamVector, value: Option<Energy>, termination: &TerminationStatus,
        iterations: u64, n_evals: usize, n_accepted: usize, n_rejected: usize,
    ) -> Self {
        let status = match termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            TerminationStatus::Terminated(reason) => format!("{reason:?}"),
        };
        Self { params, value, status, iterations, n_evals, n_accepted, n_rejected }
    }
}
