//! utils — Python-boundary helpers shared by the PyO3 bindings.
//!
//! - [`extract_f64_array`] accepts numpy arrays, pandas Series or plain
//!   sequences and returns a contiguous read-only `float64` view.
//! - [`extract_param_vector`] turns such an input into a finite
//!   [`ParamVector`].
//! - [`PyCallableEstimator`] adapts a Python callable `f(theta) -> float`
//!   (or `(float, precision)`) to the [`Estimator`] trait.
//!
//! Everything here is compiled only with the `python-bindings` feature.

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
use crate::{
    estimation::{
        errors::{EstResult, EstimatorError},
        traits::{Estimate, Estimator},
    },
    optimization::spsa::types::ParamVector,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a Python parameter vector into an owned [`ParamVector`].
///
/// Errors
/// ------
/// - `TypeError` if the input is not a 1-D float sequence.
/// - `ValueError` if it is empty or contains NaN/±∞.
#[cfg(feature = "python-bindings")]
pub fn extract_param_vector<'py>(
    py: Python<'py>, raw: &Bound<'py, PyAny>, name: &str,
) -> PyResult<ParamVector> {
    let arr = extract_f64_array(py, raw)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array or sequence"))
    })?;
    if slice.is_empty() {
        return Err(PyValueError::new_err(format!("{name} must not be empty")));
    }
    if let Some((i, v)) = slice.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PyValueError::new_err(format!("{name}[{i}] = {v} is not finite")));
    }
    Ok(ParamVector::from(slice.to_vec()))
}

/// Estimator backed by a Python callable.
///
/// The callable receives a 1-D `float64` numpy array and returns either a
/// float or a `(value, precision)` tuple. Python exceptions and malformed
/// return values surface as [`EstimatorError::Backend`].
#[cfg(feature = "python-bindings")]
pub struct PyCallableEstimator<'py> {
    fun: Bound<'py, PyAny>,
    n_params: usize,
    depth: Option<usize>,
}

#[cfg(feature = "python-bindings")]
impl<'py> PyCallableEstimator<'py> {
    pub fn new(fun: Bound<'py, PyAny>, n_params: usize) -> PyResult<Self> {
        if !fun.is_callable() {
            return Err(pyo3::exceptions::PyTypeError::new_err("fun must be callable"));
        }
        Ok(Self { fun, n_params, depth: None })
    }

    pub fn with_depth(mut self, depth: Option<usize>) -> Self {
        self.depth = depth;
        self
    }

    fn call(&self, params: &ParamVector) -> PyResult<Estimate> {
        let arr = params.to_vec().into_pyarray(self.fun.py());
        let out = self.fun.call1((arr,))?;
        if let Ok((value, precision)) = out.extract::<(f64, f64)>() {
            return Estimate::with_precision(value, precision).map_err(PyErr::from);
        }
        Ok(Estimate::exact(out.extract::<f64>()?))
    }
}

#[cfg(feature = "python-bindings")]
impl Estimator for PyCallableEstimator<'_> {
    fn estimate(&mut self, params: &ParamVector) -> EstResult<Estimate> {
        if params.len() != self.n_params {
            return Err(EstimatorError::ParamLengthMismatch {
                expected: self.n_params,
                found: params.len(),
            });
        }
        self.call(params).map_err(|err| EstimatorError::Backend { text: err.to_string() })
    }

    fn num_parameters(&self) -> usize {
        self.n_params
    }

    fn circuit_depth(&self) -> Option<usize> {
        self.depth
    }
}
