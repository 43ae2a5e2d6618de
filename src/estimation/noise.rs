//! estimation::noise — depolarizing noise, device connectivity, and shot noise.
//!
//! Purpose
//! -------
//! Describe the noise a backend applies when evaluating expectation values,
//! as explicit values handed to estimator constructors instead of globally
//! configured simulator state.
//!
//! Key behaviors
//! -------------
//! - [`DepolarizingNoise`] scales baseline single- and two-qubit
//!   depolarizing probabilities by an error-scale factor.
//! - [`coupling_map`] returns the ring connectivity used for 4- and 6-qubit
//!   devices and rejects any other size.
//! - [`ShotPolicy`] decides how a nominal shot count maps to an estimator
//!   precision; [`ShotNoise`] applies that precision as seeded Gaussian
//!   noise on top of any [`Estimator`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Scaled probabilities always lie in `[0, 1]`; a scale that would push
//!   them outside is a configuration error.
//! - [`ShotNoise`] is deterministic given its seed and the sequence of
//!   calls.
//!
//! Conventions
//! -----------
//! - Coupling maps list both directions of every edge, `[control, target]`.
//! - `ShotPolicy::Folded` reproduces the reference experiments: the shot
//!   count is recorded but precision stays `0`, because the noisy backend
//!   already folds sampling noise into its value.
use std::str::FromStr;

use rand::{SeedableRng, distributions::Distribution, rngs::StdRng};
use statrs::distribution::Normal;

use crate::{
    estimation::{
        errors::{EstResult, EstimatorError},
        traits::{Estimate, Estimator},
    },
    optimization::spsa::types::ParamVector,
};

/// Baseline single-qubit depolarizing probability.
pub const DEFAULT_P_ERR_1Q: f64 = 0.001;

/// Baseline two-qubit depolarizing probability.
pub const DEFAULT_P_ERR_2Q: f64 = 0.02;

/// Native gate basis of the noisy backend.
pub const BASIS_GATES: [&str; 5] = ["id", "rz", "sx", "x", "cx"];

/// Depolarizing error probabilities for one experiment configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepolarizingNoise {
    pub scale: f64,
    pub p_1q: f64,
    pub p_2q: f64,
}

impl DepolarizingNoise {
    /// Scale the baseline probabilities by `scale`.
    ///
    /// # Errors
    /// - [`EstimatorError::InvalidErrorScale`] if `scale` is negative or
    ///   non-finite.
    /// - [`EstimatorError::InvalidProbability`] if a scaled probability
    ///   exceeds `1`.
    pub fn scaled(scale: f64) -> EstResult<Self> {
        Self::with_baseline(scale, DEFAULT_P_ERR_1Q, DEFAULT_P_ERR_2Q)
    }

    /// Scale explicit baseline probabilities by `scale`.
    pub fn with_baseline(scale: f64, p_1q: f64, p_2q: f64) -> EstResult<Self> {
        if !scale.is_finite() {
            return Err(EstimatorError::InvalidErrorScale {
                scale,
                reason: "Error scale must be finite.",
            });
        }
        if scale < 0.0 {
            return Err(EstimatorError::InvalidErrorScale {
                scale,
                reason: "Error scale must be non-negative.",
            });
        }
        let p_1q = scale * p_1q;
        let p_2q = scale * p_2q;
        verify_probability("single-qubit", p_1q)?;
        verify_probability("two-qubit", p_2q)?;
        Ok(Self { scale, p_1q, p_2q })
    }

    /// `true` when both probabilities are zero.
    pub fn is_noiseless(&self) -> bool {
        self.p_1q == 0.0 && self.p_2q == 0.0
    }
}

fn verify_probability(name: &'static str, value: f64) -> EstResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EstimatorError::InvalidProbability { name, value });
    }
    Ok(())
}

/// Ring connectivity for the supported device sizes.
///
/// # Errors
/// [`EstimatorError::UnsupportedQubitCount`] unless `n_qubits` is 4 or 6.
pub fn coupling_map(n_qubits: usize) -> EstResult<Vec<[usize; 2]>> {
    let edges: &[[usize; 2]] = match n_qubits {
        6 => &[[0, 1], [1, 2], [2, 3], [3, 4], [4, 5], [5, 0]],
        4 => &[[0, 1], [1, 2], [2, 3], [2, 0]],
        _ => {
            return Err(EstimatorError::UnsupportedQubitCount {
                n_qubits,
                reason: "Number of qubits not supported; must be either 4 or 6.",
            });
        }
    };
    Ok(edges.iter().flat_map(|&[a, b]| [[a, b], [b, a]]).collect())
}

/// How a nominal shot count becomes an estimator precision.
///
/// Parsing is case-insensitive: `"folded"` or `"applied"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShotPolicy {
    /// Shots are recorded but precision is `0`.
    #[default]
    Folded,
    /// Precision is `1 / sqrt(n_shots)`; zero shots means no shot noise.
    Applied,
}

impl ShotPolicy {
    /// Precision implied by `n_shots` under this policy.
    pub fn precision(&self, n_shots: u64) -> f64 {
        match self {
            ShotPolicy::Folded => 0.0,
            ShotPolicy::Applied if n_shots == 0 => 0.0,
            ShotPolicy::Applied => 1.0 / (n_shots as f64).sqrt(),
        }
    }
}

impl FromStr for ShotPolicy {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "folded" => Ok(ShotPolicy::Folded),
            "applied" => Ok(ShotPolicy::Applied),
            _ => Err(EstimatorError::UnknownShotPolicy {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'folded' or 'applied'.",
            }),
        }
    }
}

/// Adds seeded Gaussian shot noise `N(0, precision)` to an inner estimator.
///
/// With `precision == 0` values pass through unchanged and no random
/// numbers are drawn.
pub struct ShotNoise<E: Estimator> {
    inner: E,
    precision: f64,
    normal: Option<Normal>,
    rng: StdRng,
}

impl<E: Estimator> ShotNoise<E> {
    /// Wrap `inner` with shot noise of standard deviation `precision`.
    ///
    /// # Errors
    /// [`EstimatorError::InvalidPrecision`] if `precision` is negative or
    /// non-finite.
    pub fn new(inner: E, precision: f64, seed: u64) -> EstResult<Self> {
        if !precision.is_finite() || precision < 0.0 {
            return Err(EstimatorError::InvalidPrecision { value: precision });
        }
        let normal = if precision > 0.0 {
            Some(
                Normal::new(0.0, precision)
                    .map_err(|_| EstimatorError::InvalidPrecision { value: precision })?,
            )
        } else {
            None
        };
        Ok(Self { inner, precision, normal, rng: StdRng::seed_from_u64(seed) })
    }

    /// Build from a shot count and policy.
    pub fn from_shots(inner: E, n_shots: u64, policy: ShotPolicy, seed: u64) -> EstResult<Self> {
        Self::new(inner, policy.precision(n_shots), seed)
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Estimator> Estimator for ShotNoise<E> {
    fn estimate(&mut self, params: &ParamVector) -> EstResult<Estimate> {
        let base = self.inner.estimate(params)?;
        match &self.normal {
            Some(normal) => {
                let value = base.value + normal.sample(&mut self.rng);
                Estimate::with_precision(value, self.precision)
            }
            None => Ok(base),
        }
    }

    fn num_parameters(&self) -> usize {
        self.inner.num_parameters()
    }

    fn circuit_depth(&self) -> Option<usize> {
        self.inner.circuit_depth()
    }
}
