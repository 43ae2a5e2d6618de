//! noisy_vqe — SPSA-driven variational eigensolver experiments under noise.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the SPSA optimizer and sweep summaries to Python through the
//! `_noisy_vqe` extension module. The quantum side (ansatz construction,
//! Hamiltonians, simulators) stays behind the [`estimation::Estimator`]
//! trait; this crate owns the optimization loop and its bookkeeping.
//!
//! Key behaviors
//! -------------
//! - Re-export the core modules: `estimation` (oracle trait and noise
//!   models), `optimization` (SPSA solver, evaluation log, history) and
//!   `experiment` (parameter sweeps and result tables).
//! - With `python-bindings`, define the `SPSA` and `SpsaResult` classes,
//!   `minimize_spsa` and a few summary functions, registered under the `optimization`
//!   and `experiment` submodules.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file only converts
//!   inputs, builds options and maps errors.
//! - A Python objective is called with a 1-D `float64` numpy array and must
//!   return a float or a `(value, precision)` tuple.
//!
//! Conventions
//! -----------
//! - Configuration errors surface in Python as `ValueError`; failures during
//!   evaluation surface as `RuntimeError`. Both carry the Rust message.
//! - Energies are in Hartree; parameters are rotation angles in radians.
//!
//! Downstream usage
//! ----------------
//! - Rust callers should depend on the inner modules directly and can ignore
//!   the PyO3 items guarded by the `python-bindings` feature.
//! - A pure-Python package is expected to wrap `_noisy_vqe` and supply the
//!   chemistry backend as a callable.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   integration tests under `tests/`. The PyO3 layer is exercised from
//!   Python.

pub mod estimation;
pub mod experiment;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    experiment::report::{convergence_series as series, tail_variance as tail_var},
    optimization::spsa::{
        self, Blocking, Calibration, GainSchedule, HistoryTracker, SpsaOptions, SpsaOutcome,
        SpsaStep,
    },
    utils::{PyCallableEstimator, extract_param_vector},
};

/// SPSA — configured SPSA optimizer exposed to Python.
///
/// Parameters
/// ----------
/// - `max_iter`: `int`, default 100. Logical iterations.
/// - `regularization`: `float`, default 1e-8. Added to every gradient
///   denominator.
/// - `blocking`: `bool`, default `True`. Reject proposals that raise the
///   objective by more than `allowed_increase`.
/// - `allowed_increase`: `float`, default 0.0.
/// - `learning_rate`, `perturbation`: optional fixed gains `a` and `c`.
///   With only `perturbation` given, `a` is calibrated from the objective
///   using that `c`. `learning_rate` without `perturbation` is rejected.
/// - `seed`: `int`, default 0. Seeds the perturbation directions.
/// - `verbose`: `bool`, default `False`. Iteration logging when the crate is
///   built with `obs_slog`.
///
/// Raises
/// ------
/// - `ValueError` for any invalid setting.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "noisy_vqe.optimization")]
pub struct SPSA {
    opts: SpsaOptions,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SPSA {
    #[new]
    #[pyo3(signature = (
        max_iter=100, regularization=1e-8, blocking=true, allowed_increase=0.0,
        learning_rate=None, perturbation=None, seed=0, verbose=false
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        max_iter: u64, regularization: f64, blocking: bool, allowed_increase: f64,
        learning_rate: Option<f64>, perturbation: Option<f64>, seed: u64, verbose: bool,
    ) -> PyResult<Self> {
        let gains = match (learning_rate, perturbation) {
            (Some(a), Some(c)) => GainSchedule::fixed(a, c),
            (None, c) => {
                let mut cal = Calibration::default();
                if let Some(c) = c {
                    cal.c = c;
                }
                GainSchedule::Calibrated(cal)
            }
            (Some(_), None) => {
                return Err(PyValueError::new_err(
                    "perturbation must be provided when learning_rate is set",
                ));
            }
        };
        let blocking = if blocking { Some(Blocking::new(allowed_increase)?) } else { None };
        let opts = SpsaOptions::new(max_iter, regularization, blocking, gains, seed)?
            .with_verbose(verbose);
        Ok(SPSA { opts })
    }

    /// Minimize `fun` from `x0`, optionally writing the evaluation log to
    /// `log_path`.
    #[pyo3(signature = (fun, x0, log_path=None, depth=None))]
    pub fn minimize<'py>(
        &self, py: Python<'py>, fun: &Bound<'py, PyAny>, x0: &Bound<'py, PyAny>,
        log_path: Option<PathBuf>, depth: Option<usize>,
    ) -> PyResult<SpsaResult> {
        let x0 = extract_param_vector(py, x0, "x0")?;
        let mut estimator = PyCallableEstimator::new(fun.clone(), x0.len())?.with_depth(depth);
        let mut history = HistoryTracker::new();
        let sink: Box<dyn Write> = match log_path {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::sink()),
        };
        let outcome = spsa::minimize(&mut estimator, x0, &self.opts, &mut history, sink, None)?;
        Ok(SpsaResult::new(outcome, &history))
    }

    #[getter]
    pub fn max_iter(&self) -> u64 {
        self.opts.max_iter
    }

    #[getter]
    pub fn expected_evals(&self) -> usize {
        self.opts.expected_evals()
    }
}

/// SpsaResult — outcome and trajectory of one SPSA run.
///
/// Fields
/// ------
/// - `inner`: [`SpsaOutcome`] with final parameters, value and counters.
/// - `energies`: every logged energy in evaluation order.
/// - `committed`: committed value after each logical iteration.
/// - `accepted`: blocking decision per logical iteration.
///
/// Notes
/// -----
/// - Constructed only by `SPSA.minimize`; Rust code should use
///   [`SpsaOutcome`] and [`HistoryTracker`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "noisy_vqe.optimization")]
pub struct SpsaResult {
    pub inner: SpsaOutcome,
    energies: Vec<f64>,
    committed: Vec<f64>,
    accepted: Vec<bool>,
}

#[cfg(feature = "python-bindings")]
impl SpsaResult {
    fn new(inner: SpsaOutcome, history: &HistoryTracker) -> Self {
        SpsaResult {
            inner,
            energies: history.energies(),
            committed: history.committed_values(),
            accepted: history.steps().iter().map(|s: &SpsaStep| s.accepted).collect(),
        }
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SpsaResult {
    #[getter]
    pub fn x(&self) -> Vec<f64> {
        self.inner.params.to_vec()
    }

    #[getter]
    pub fn fun(&self) -> Option<f64> {
        self.inner.value
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> u64 {
        self.inner.iterations
    }

    #[getter]
    pub fn n_evals(&self) -> usize {
        self.inner.n_evals
    }

    #[getter]
    pub fn n_accepted(&self) -> usize {
        self.inner.n_accepted
    }

    #[getter]
    pub fn n_rejected(&self) -> usize {
        self.inner.n_rejected
    }

    #[getter]
    pub fn energies(&self) -> Vec<f64> {
        self.energies.clone()
    }

    #[getter]
    pub fn committed(&self) -> Vec<f64> {
        self.committed.clone()
    }

    #[getter]
    pub fn accepted(&self) -> Vec<bool> {
        self.accepted.clone()
    }
}

/// One-shot form of `SPSA(...).minimize(fun, x0, log_path)`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (
    fun, x0, max_iter=100, regularization=1e-8, blocking=true, allowed_increase=0.0,
    learning_rate=None, perturbation=None, seed=0, log_path=None
))]
#[allow(clippy::too_many_arguments)]
pub fn minimize_spsa<'py>(
    py: Python<'py>, fun: &Bound<'py, PyAny>, x0: &Bound<'py, PyAny>, max_iter: u64,
    regularization: f64, blocking: bool, allowed_increase: f64, learning_rate: Option<f64>,
    perturbation: Option<f64>, seed: u64, log_path: Option<PathBuf>,
) -> PyResult<SpsaResult> {
    let optimizer = SPSA::new(
        max_iter,
        regularization,
        blocking,
        allowed_increase,
        learning_rate,
        perturbation,
        seed,
        false,
    )?;
    optimizer.minimize(py, fun, x0, log_path, None)
}

/// Evaluate `fun` once at `params` outside any optimization trajectory.
#[cfg(feature = "python-bindings")]
#[pyfunction]
pub fn final_energy<'py>(
    py: Python<'py>, fun: &Bound<'py, PyAny>, params: &Bound<'py, PyAny>,
) -> PyResult<f64> {
    let params = extract_param_vector(py, params, "params")?;
    let mut estimator = PyCallableEstimator::new(fun.clone(), params.len())?;
    Ok(spsa::final_energy(&mut estimator, &params)?)
}

/// Sample variance of the last `window` energies (NaN below two points).
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (energies, window=10))]
pub fn tail_variance(energies: Vec<f64>, window: usize) -> f64 {
    tail_var(&energies, window)
}

/// Every `stride`-th energy starting at `offset`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (energies, offset=0, stride=1))]
pub fn convergence_series(energies: Vec<f64>, offset: usize, stride: usize) -> Vec<f64> {
    series(&energies, offset, stride)
}

/// _noisy_vqe — PyO3 module initializer for the Python extension.
///
/// Key behaviors
/// -------------
/// - Create the `optimization` and `experiment` submodules and attach them
///   to the parent module.
/// - Register both in `sys.modules` so dotted imports work.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating submodules or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _noisy_vqe<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let optimization_mod = PyModule::new(_py, "optimization")?;
    let experiment_mod = PyModule::new(_py, "experiment")?;
    register_optimization(m, &optimization_mod)?;
    register_experiment(m, &experiment_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("noisy_vqe.optimization", optimization_mod)?;

    _py.import("sys")?
        .getattr("modules")?
        .set_item("noisy_vqe.experiment", experiment_mod)?;

    Ok(())
}

#[cfg(feature = "python-bindings")]
fn register_optimization<'py>(
    noisy_vqe: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<SPSA>()?;
    m.add_class::<SpsaResult>()?;
    m.add_function(wrap_pyfunction!(minimize_spsa, m)?)?;
    m.add_function(wrap_pyfunction!(final_energy, m)?)?;
    noisy_vqe.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn register_experiment<'py>(
    noisy_vqe: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(tail_variance, m)?)?;
    m.add_function(wrap_pyfunction!(convergence_series, m)?)?;
    noisy_vqe.add_submodule(m)?;
    Ok(())
}
