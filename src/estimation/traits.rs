//! Estimator interface consumed by the objective adapter.
//!
//! - [`Estimator`]: noisy expectation-value oracle bound to a fixed circuit
//!   and observable.
//! - [`Estimate`]: scalar value plus optional statistical precision.
//! - [`EstimatorKind`]: exact statevector vs noisy backend selection.
//! - [`FnEstimator`]: closure-backed estimator for tests and small models.
//!
//! Convention: noise (depolarizing and shot noise) is already folded into
//! the returned value. Callers never add noise on top of an [`Estimate`].
use std::str::FromStr;

use crate::{
    estimation::errors::{EstResult, EstimatorError},
    optimization::spsa::types::{Energy, ParamVector},
};

/// Result of a single expectation-value evaluation.
///
/// - `value`: noisy expectation value ⟨H⟩ in Hartree.
/// - `precision`: standard deviation of the shot noise added to `value`,
///   when the backend reports one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: Energy,
    pub precision: Option<f64>,
}

impl Estimate {
    /// Estimate without a reported precision.
    pub fn exact(value: Energy) -> Self {
        Self { value, precision: None }
    }

    /// Estimate with a reported precision.
    ///
    /// # Errors
    /// [`EstimatorError::InvalidPrecision`] if `precision` is negative or
    /// non-finite.
    pub fn with_precision(value: Energy, precision: f64) -> EstResult<Self> {
        if !precision.is_finite() || precision < 0.0 {
            return Err(EstimatorError::InvalidPrecision { value: precision });
        }
        Ok(Self { value, precision: Some(precision) })
    }
}

/// Noisy expectation-value oracle.
///
/// Implementations are bound to one parameterized circuit and one
/// observable at construction. `estimate` takes `&mut self` because noise
/// sampling advances a seeded generator; two estimators built with the same
/// seed must return the same sequence of values for the same inputs.
///
/// Required:
/// - `estimate(&ParamVector) -> EstResult<Estimate>`: evaluate ⟨H⟩(θ).
///   Failures are returned, never retried.
/// - `num_parameters() -> usize`: number of variational parameters of the
///   bound ansatz.
///
/// Optional:
/// - `circuit_depth() -> Option<usize>`: depth of the transpiled circuit,
///   reported in result tables.
pub trait Estimator {
    fn estimate(&mut self, params: &ParamVector) -> EstResult<Estimate>;
    fn num_parameters(&self) -> usize;

    fn circuit_depth(&self) -> Option<usize> {
        None
    }
}

impl<E: Estimator + ?Sized> Estimator for &mut E {
    fn estimate(&mut self, params: &ParamVector) -> EstResult<Estimate> {
        (**self).estimate(params)
    }

    fn num_parameters(&self) -> usize {
        (**self).num_parameters()
    }

    fn circuit_depth(&self) -> Option<usize> {
        (**self).circuit_depth()
    }
}

/// Backend flavor used when building estimators.
///
/// Parsing is case-insensitive: `"noiseless"` or `"noisy"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstimatorKind {
    Noiseless,
    Noisy,
}

impl EstimatorKind {
    /// Lower-case name, used in per-run log paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorKind::Noiseless => "noiseless",
            EstimatorKind::Noisy => "noisy",
        }
    }
}

impl FromStr for EstimatorKind {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "noiseless" => Ok(EstimatorKind::Noiseless),
            "noisy" => Ok(EstimatorKind::Noisy),
            _ => Err(EstimatorError::UnknownEstimatorKind {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'noiseless' or 'noisy'.",
            }),
        }
    }
}

/// Estimator backed by a closure `θ ↦ ⟨H⟩(θ)`.
///
/// The closure's length contract is enforced here: calls with a vector of
/// the wrong length fail with [`EstimatorError::ParamLengthMismatch`]
/// without invoking the closure.
pub struct FnEstimator<F>
where
    F: FnMut(&ParamVector) -> EstResult<Energy>,
{
    f: F,
    n_params: usize,
    depth: Option<usize>,
}

impl<F> FnEstimator<F>
where
    F: FnMut(&ParamVector) -> EstResult<Energy>,
{
    pub fn new(n_params: usize, f: F) -> Self {
        Self { f, n_params, depth: None }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }
}

impl<F> Estimator for FnEstimator<F>
where
    F: FnMut(&ParamVector) -> EstResult<Energy>,
{
    fn estimate(&mut self, params: &ParamVector) -> EstResult<Estimate> {
        if params.len() != self.n_params {
            return Err(EstimatorError::ParamLengthMismatch {
                expected: self.n_params,
                found: params.len(),
            });
        }
        (self.f)(params).map(Estimate::exact)
    }

    fn num_parameters(&self) -> usize {
        self.n_params
    }

    fn circuit_depth(&self) -> Option<usize> {
        self.depth
    }
}
