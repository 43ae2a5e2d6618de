//! Integration tests for SPSA runs and parameter sweeps.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path from an estimator, through the SPSA
//!   optimizer and its evaluation log, to sweep records and the results
//!   table on disk.
//! - Use smooth synthetic landscapes in place of a quantum backend so the
//!   expected behavior is known in advance.
//!
//! Coverage
//! --------
//! - `optimization::spsa`:
//!   - Calibrated gains with strict blocking on a quadratic bowl.
//!   - Log/history agreement and contiguous evaluation indices.
//!   - Partial history after an estimator failure.
//! - `experiment`:
//!   - Reproducible sweeps with applied shot noise.
//!   - Results table contents after a failing run.
//!
//! Exclusions
//! ----------
//! - Option validation, gain formulas and table formatting, which are
//!   covered by unit tests.
//! - Python bindings, exercised from Python.
use std::fs;

use ndarray::{Array1, array};
use noisy_vqe::{
    estimation::{EstResult, EstimatorError, FnEstimator, ShotPolicy},
    experiment::{ExperimentError, ExperimentKey, RunPoint, SweepConfig, run_sweep},
    optimization::{
        errors::OptError,
        spsa::{GainSchedule, HistoryTracker, SpsaOptions, minimize},
    },
};

/// Purpose
/// -------
/// Shifted quadratic bowl `sum_i (x_i - 0.3)^2` with its minimum at 0.
fn bowl(x: &Array1<f64>) -> EstResult<f64> {
    Ok(x.iter().map(|v| (v - 0.3).powi(2)).sum())
}

/// Purpose
/// -------
/// Sweep configuration over two bond lengths and two error scales, rooted
/// at `dir`.
fn sweep_config(dir: &std::path::Path) -> SweepConfig {
    SweepConfig {
        bond_lengths: vec![1.4, 1.6],
        n_shots: vec![1000],
        n_iters: vec![5],
        error_scales: vec![0.0, 1.0],
        shot_policy: ShotPolicy::Applied,
        gains: GainSchedule::fixed(0.1, 0.1),
        output_dir: dir.to_path_buf(),
        seed: 11,
        ..SweepConfig::default()
    }
}

#[test]
// Purpose
// -------
// Calibrated SPSA with strict blocking descends a smooth bowl.
//
// Given
// -----
// - A 4-parameter shifted bowl, x0 = [1, -1, 0.5, -0.5], 60 iterations,
//   default calibration, strict blocking.
//
// Expect
// ------
// - 50 + 1 + 180 evaluations; the committed sequence never increases and
//   never exceeds f(x0); the final value is below f(x0).
fn calibrated_blocking_descends_bowl() {
    // Arrange
    let x0 = array![1.0, -1.0, 0.5, -0.5];
    let f0 = bowl(&x0).unwrap();
    let mut est = FnEstimator::new(4, bowl);
    let opts = SpsaOptions { max_iter: 60, ..SpsaOptions::default() };
    let mut history = HistoryTracker::new();

    // Act
    let out = minimize(&mut est, x0, &opts, &mut history, std::io::sink(), None).unwrap();

    // Assert
    assert_eq!(out.n_evals, 231);
    assert_eq!(history.len(), 231);
    assert_eq!(history.evaluations()[50].energy, f0);
    assert_eq!(out.n_accepted + out.n_rejected, 60);
    let value = out.value.unwrap();
    assert!(value < f0, "final value {value} not below f(x0) = {f0}");
    let committed = history.committed_values();
    assert!(committed.len() <= 60);
    assert!(committed.windows(2).all(|w| w[1] <= w[0]));
    assert!(committed.iter().all(|&v| v <= f0));
    assert_eq!(value, *committed.last().unwrap());
}

#[test]
// Purpose
// -------
// The persisted log and the history hold the same evaluations.
//
// Given
// -----
// - A 2-parameter bowl, fixed gains, no blocking, 8 iterations, logged
//   into an in-memory buffer.
//
// Expect
// ------
// - One header plus 16 rows; row indices run 0..16 without gaps and the
//   energies agree with the history to the printed precision.
fn log_indices_are_contiguous() {
    // Arrange
    let mut est = FnEstimator::new(2, bowl);
    let opts = SpsaOptions::new(8, 1e-8, None, GainSchedule::fixed(0.05, 0.1), 4).unwrap();
    let mut history = HistoryTracker::new();
    let mut buf: Vec<u8> = Vec::new();

    // Act
    minimize(&mut est, array![0.0, 1.0], &opts, &mut history, &mut buf, None).unwrap();

    // Assert
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().contains("Energy (Hartree)"));
    let rows: Vec<(usize, f64)> = lines
        .map(|l| {
            let mut cols = l.split_whitespace();
            let idx = cols.next().unwrap().parse().unwrap();
            let e = cols.next().unwrap().parse().unwrap();
            (idx, e)
        })
        .collect();
    assert_eq!(rows.len(), 16);
    for (expected, ((idx, e), rec)) in rows.iter().zip(history.evaluations()).enumerate() {
        assert_eq!(*idx, expected);
        assert_eq!(rec.index, expected);
        assert!((e - rec.energy).abs() < 1e-6);
    }
}

#[test]
// Purpose
// -------
// A backend failure aborts the run and keeps what was logged before it.
//
// Given
// -----
// - A bowl that fails on its 6th call, fixed gains, strict blocking.
//
// Expect
// ------
// - `EstimatorFailed { eval_index: 5 }`; history keeps 5 evaluations (the
//   initial point, one completed step and half a pair).
fn failure_keeps_partial_history() {
    // Arrange
    let mut calls = 0usize;
    let mut est = FnEstimator::new(2, move |x: &Array1<f64>| {
        calls += 1;
        if calls == 6 {
            Err(EstimatorError::Backend { text: "job timed out".to_string() })
        } else {
            bowl(x)
        }
    });
    let opts = SpsaOptions {
        max_iter: 10,
        gains: GainSchedule::fixed(0.1, 0.1),
        ..SpsaOptions::default()
    };
    let mut history = HistoryTracker::new();

    // Act
    let err = minimize(&mut est, array![0.5, 0.5], &opts, &mut history, std::io::sink(), None)
        .unwrap_err();

    // Assert
    match err {
        OptError::EstimatorFailed { eval_index, .. } => assert_eq!(eval_index, 5),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(history.len(), 5);
    assert_eq!(history.steps().len(), 1);
}

#[test]
// Purpose
// -------
// Sweeps are reproducible under applied shot noise.
//
// Given
// -----
// - The same configuration run twice into separate directories, with
//   1000 shots under the applied policy.
//
// Expect
// ------
// - Identical records; the headline energy differs from the noiseless
//   bowl at the final parameters; both tables list 4 runs.
fn sweep_is_reproducible_with_shot_noise() {
    // Arrange
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let mut factory = |_: &RunPoint| Ok::<_, EstimatorError>(FnEstimator::new(3, bowl));

    // Act
    let a = run_sweep(&sweep_config(dir_a.path()), &mut factory).unwrap();
    let b = run_sweep(&sweep_config(dir_b.path()), &mut factory).unwrap();

    // Assert
    assert_eq!(a, b);
    let entry = &a[&ExperimentKey::new(1000, 5, 0.0)];
    let first = &entry.runs[0];
    assert_eq!(first.energies.len(), 16);
    assert_ne!(first.energy_fav, bowl(&first.outcome.params).unwrap());
    for dir in [dir_a.path(), dir_b.path()] {
        let table = fs::read_to_string(sweep_config(dir).results_path()).unwrap();
        assert_eq!(table.lines().count(), 5);
    }
}

#[test]
// Purpose
// -------
// A failing run stops the sweep after earlier rows were flushed.
//
// Given
// -----
// - Estimators that fail immediately at bond length 1.6 only.
//
// Expect
// ------
// - `Optimization { EstimatorFailed { eval_index: 0 } }`; the table holds
//   the header and the 1.4 row; the 1.4 log is complete.
fn failing_run_leaves_flushed_rows() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let cfg = sweep_config(dir.path());
    let mut factory = |point: &RunPoint| {
        let fail = point.bond_length > 1.5;
        Ok::<_, EstimatorError>(FnEstimator::new(3, move |x: &Array1<f64>| {
            if fail {
                Err(EstimatorError::Backend { text: "simulator crashed".to_string() })
            } else {
                bowl(x)
            }
        }))
    };

    // Act
    let err = run_sweep(&cfg, &mut factory).unwrap_err();

    // Assert
    match err {
        ExperimentError::Optimization {
            source: OptError::EstimatorFailed { eval_index, .. },
        } => assert_eq!(eval_index, 0),
        other => panic!("unexpected error {other:?}"),
    }
    let table = fs::read_to_string(cfg.results_path()).unwrap();
    assert_eq!(table.lines().count(), 2);
    let key = ExperimentKey::new(1000, 5, 0.0);
    let log = fs::read_to_string(cfg.run_log_path(&key, 1.4)).unwrap();
    assert_eq!(log.lines().count(), 17);
}
