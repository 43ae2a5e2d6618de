//! spsa::schedule — learning-rate and perturbation gain sequences.
//!
//! Purpose
//! -------
//! Describe the decaying sequences SPSA uses at iteration `k`:
//! the learning rate `a_k = a / (k + 1 + A)^α` and the perturbation
//! magnitude `c_k = c / (k + 1)^γ`, either with a fixed `a` or with `a`
//! calibrated from the objective before the first iteration.
//!
//! Key behaviors
//! -------------
//! - [`Gains`] evaluates both sequences for a given iteration.
//! - [`GainSchedule::Fixed`] uses caller-supplied gains verbatim.
//! - [`GainSchedule::Calibrated`] resolves `a` from the average magnitude of
//!   `steps` symmetric finite differences so that the first update has a
//!   target size (see [`Calibration::resolve`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - `a > 0`, `c > 0`, exponents and stability constant finite and
//!   non-negative; validated by [`GainSchedule::validate`].
//! - A calibrated `a` is floored at [`MIN_CALIBRATED_A`] so a flat objective
//!   never produces a zero learning rate.
//!
//! Conventions
//! -----------
//! - `k` is the 0-based logical iteration index reported by Argmin.
//! - Defaults follow the standard SPSA recommendations: `α = 0.602`,
//!   `γ = 0.101`, `c = 0.2`, target first-step magnitude `2π / 10`.
use std::f64::consts::PI;

use crate::optimization::{
    errors::{OptError, OptResult},
    spsa::types::DEFAULT_CALIBRATION_STEPS,
};

/// Standard learning-rate decay exponent.
pub const DEFAULT_ALPHA: f64 = 0.602;

/// Standard perturbation decay exponent.
pub const DEFAULT_GAMMA: f64 = 0.101;

/// Default initial perturbation magnitude.
pub const DEFAULT_C: f64 = 0.2;

/// Lower bound for a calibrated learning-rate numerator.
pub const MIN_CALIBRATED_A: f64 = 1e-10;

/// Resolved SPSA gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub a: f64,
    pub c: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub stability: f64,
}

impl Gains {
    /// Learning rate `a_k`.
    pub fn learning_rate(&self, k: u64) -> f64 {
        self.a / (k as f64 + 1.0 + self.stability).powf(self.alpha)
    }

    /// Perturbation magnitude `c_k`.
    pub fn perturbation(&self, k: u64) -> f64 {
        self.c / (k as f64 + 1.0).powf(self.gamma)
    }

    fn validate(&self) -> OptResult<()> {
        verify_positive("a", self.a)?;
        verify_positive("c", self.c)?;
        verify_non_negative("alpha", self.alpha)?;
        verify_non_negative("gamma", self.gamma)?;
        verify_non_negative("stability", self.stability)?;
        Ok(())
    }
}

/// Settings for calibrating `a` from the objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub c: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub stability: f64,
    pub target_magnitude: f64,
    pub steps: usize,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            c: DEFAULT_C,
            alpha: DEFAULT_ALPHA,
            gamma: DEFAULT_GAMMA,
            stability: 0.0,
            target_magnitude: 2.0 * PI / 10.0,
            steps: DEFAULT_CALIBRATION_STEPS,
        }
    }
}

impl Calibration {
    /// Turn the measured mean `|Δf| / (2c)` into resolved gains.
    pub fn resolve(&self, avg_magnitude: f64) -> Gains {
        let raw = self.target_magnitude / avg_magnitude;
        let a = if raw.is_finite() { raw.max(MIN_CALIBRATED_A) } else { MIN_CALIBRATED_A };
        Gains { a, c: self.c, alpha: self.alpha, gamma: self.gamma, stability: self.stability }
    }

    fn validate(&self) -> OptResult<()> {
        verify_positive("c", self.c)?;
        verify_positive("target_magnitude", self.target_magnitude)?;
        verify_non_negative("alpha", self.alpha)?;
        verify_non_negative("gamma", self.gamma)?;
        verify_non_negative("stability", self.stability)?;
        if self.steps == 0 {
            return Err(OptError::InvalidCalibrationSteps {
                steps: self.steps,
                reason: "Calibration needs at least one step.",
            });
        }
        Ok(())
    }
}

/// How the optimizer obtains its gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainSchedule {
    Fixed(Gains),
    Calibrated(Calibration),
}

impl Default for GainSchedule {
    fn default() -> Self {
        GainSchedule::Calibrated(Calibration::default())
    }
}

impl GainSchedule {
    /// Fixed gains with the standard exponents and no stability constant.
    pub fn fixed(a: f64, c: f64) -> Self {
        GainSchedule::Fixed(Gains {
            a,
            c,
            alpha: DEFAULT_ALPHA,
            gamma: DEFAULT_GAMMA,
            stability: 0.0,
        })
    }

    /// Number of objective evaluations spent before the first iteration.
    pub fn calibration_evals(&self) -> usize {
        match self {
            GainSchedule::Fixed(_) => 0,
            GainSchedule::Calibrated(cal) => 2 * cal.steps,
        }
    }

    /// # Errors
    /// [`OptError::InvalidGain`] or [`OptError::InvalidCalibrationSteps`].
    pub fn validate(&self) -> OptResult<()> {
        match self {
            GainSchedule::Fixed(g) => g.validate(),
            GainSchedule::Calibrated(cal) => cal.validate(),
        }
    }
}

fn verify_positive(name: &'static str, value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidGain { name, value, reason: "Gain must be finite." });
    }
    if value <= 0.0 {
        return Err(OptError::InvalidGain { name, value, reason: "Gain must be positive." });
    }
    Ok(())
}

fn verify_non_negative(name: &'static str, value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidGain { name, value, reason: "Gain must be finite." });
    }
    if value < 0.0 {
        return Err(OptError::InvalidGain { name, value, reason: "Gain must be non-negative." });
    }
    Ok(())
}
