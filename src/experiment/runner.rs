//! experiment::runner — sweep orchestration.
//!
//! Purpose
//! -------
//! Execute a [`SweepConfig`]: for every shot count, iteration count, error
//! scale and bond length, build a fresh estimator, minimize it with SPSA from
//! a random initial point, perform the headline evaluation, and record the
//! result both in memory and in the results table.
//!
//! Key behaviors
//! -------------
//! - The configuration is validated before any file is created or any
//!   estimator is built.
//! - Each run gets its own log file ([`SweepConfig::run_log_path`]), its own
//!   SPSA seed (`seed + run_index`) and its own shot-noise seed. The noise
//!   seed is the SPSA seed XOR [`SHOT_NOISE_STREAM`], so perturbation
//!   directions and shot noise never share a random stream.
//! - Initial points are drawn uniformly in `[-π, π)` from one generator
//!   seeded with `config.seed`, so a sweep is reproducible end to end.
//! - The first failing run aborts the sweep; rows already written stay in
//!   the results table.
//!
//! Conventions
//! -----------
//! - Estimators come from an [`EstimatorFactory`]; building circuits,
//!   Hamiltonians and backends is the factory's business.
//! - Shot noise is applied by wrapping the built estimator in
//!   [`ShotNoise`] with the precision from the configured [`ShotPolicy`];
//!   under the default folded policy the wrapper is a pass-through.
//!
//! [`ShotPolicy`]: crate::estimation::noise::ShotPolicy
use std::{
    f64::consts::PI,
    fs::{self, File},
    io::BufWriter,
};

use crate::{
    estimation::{
        errors::EstResult,
        noise::{BASIS_GATES, DepolarizingNoise, ShotNoise, coupling_map},
        traits::{Estimator, EstimatorKind},
    },
    experiment::{
        config::{Ansatz, ExperimentKey, Molecule, SweepConfig},
        errors::ExperimentResult,
        report::{ResultsWriter, RunRecord, SweepResults, tail_variance},
    },
    optimization::spsa::{
        api::{final_energy, minimize},
        history::HistoryTracker,
        types::ParamVector,
    },
};
use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Mixed into the SPSA seed to derive the shot-noise seed.
pub const SHOT_NOISE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Everything an estimator factory needs to know about one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPoint {
    pub key: ExperimentKey,
    pub molecule: Molecule,
    pub ansatz: Ansatz,
    pub bond_length: f64,
    pub geometry: String,
    pub n_qubits: usize,
    pub active_orbitals: usize,
    pub n_electrons: usize,
    pub noise: DepolarizingNoise,
    pub basis_gates: Vec<&'static str>,
    pub coupling_map: Vec<[usize; 2]>,
    pub n_shots: u64,
    pub shot_precision: f64,
    pub estimator_kind: EstimatorKind,
    /// Seeds the SPSA perturbation directions.
    pub seed: u64,
    /// Seeds the Gaussian shot noise.
    pub noise_seed: u64,
}

/// Builds one estimator per sweep point.
///
/// Closures `FnMut(&RunPoint) -> EstResult<E>` implement this trait.
pub trait EstimatorFactory {
    type Estimator: Estimator;

    fn build(&mut self, point: &RunPoint) -> EstResult<Self::Estimator>;
}

impl<F, E> EstimatorFactory for F
where
    F: FnMut(&RunPoint) -> EstResult<E>,
    E: Estimator,
{
    type Estimator = E;

    fn build(&mut self, point: &RunPoint) -> EstResult<E> {
        self(point)
    }
}

/// Run the whole sweep.
///
/// # Errors
/// - Any [`SweepConfig::validate`] error, before anything is written.
/// - I/O errors creating directories, logs or the results table.
/// - Estimator construction errors and optimization errors of the first
///   failing run.
pub fn run_sweep<F: EstimatorFactory>(
    config: &SweepConfig, factory: &mut F,
) -> ExperimentResult<SweepResults> {
    config.validate()?;

    let results_path = config.results_path();
    if let Some(dir) = results_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::create_dir_all(config.run_log_dir())?;
    let mut table = ResultsWriter::new(File::create(&results_path)?)?;

    #[cfg(feature = "obs_slog")]
    let logger = config.verbose.then(progress_logger);

    let mut x0_rng = StdRng::seed_from_u64(config.seed);
    let mut results = SweepResults::new();
    let mut run_index = 0u64;
    for key in config.keys() {
        for &bond_length in &config.bond_lengths {
            let seed = config.seed.wrapping_add(run_index);
            run_index += 1;
            let point = run_point(config, key, bond_length, seed)?;
            let record = run_point_once(config, &point, factory.build(&point)?, &mut x0_rng)?;
            table.write_row(&record)?;

            #[cfg(feature = "obs_slog")]
            if let Some(log) = &logger {
                log_run(log, &point, &record);
            }

            results.entry(key).or_default().push(record);
        }
    }
    Ok(results)
}

/// Describe one sweep point.
///
/// # Errors
/// Invalid noise scaling or an unsupported qubit count.
pub fn run_point(
    config: &SweepConfig, key: ExperimentKey, bond_length: f64, seed: u64,
) -> ExperimentResult<RunPoint> {
    let n_qubits = config.n_qubits();
    Ok(RunPoint {
        key,
        molecule: config.molecule,
        ansatz: config.ansatz,
        bond_length,
        geometry: config.molecule.geometry(bond_length),
        n_qubits,
        active_orbitals: config.active_orbitals,
        n_electrons: config.n_electrons,
        noise: DepolarizingNoise::scaled(key.dep_error)?,
        basis_gates: BASIS_GATES.to_vec(),
        coupling_map: coupling_map(n_qubits)?,
        n_shots: key.n_shots,
        shot_precision: config.shot_policy.precision(key.n_shots),
        estimator_kind: config.estimator_kind,
        seed,
        noise_seed: seed ^ SHOT_NOISE_STREAM,
    })
}

fn run_point_once<E: Estimator>(
    config: &SweepConfig, point: &RunPoint, estimator: E, x0_rng: &mut StdRng,
) -> ExperimentResult<RunRecord> {
    let mut estimator = ShotNoise::new(estimator, point.shot_precision, point.noise_seed)?;
    let n_params = estimator.num_parameters();
    let x0: ParamVector = Array1::from_shape_fn(n_params, |_| x0_rng.gen_range(-PI..PI));
    let opts = config.spsa_options(point.key.n_iters, point.seed)?;

    let log_path = config.run_log_path(&point.key, point.bond_length);
    let sink = BufWriter::new(File::create(&log_path)?);
    let mut history = HistoryTracker::new();
    let outcome = minimize(&mut estimator, x0.clone(), &opts, &mut history, sink, None)?;
    let energy_fav = final_energy(&mut estimator, &outcome.params)?;

    let energies = history.energies();
    let qvariance = tail_variance(&energies, config.tail_window);
    Ok(RunRecord {
        key: point.key,
        bond_length: point.bond_length,
        committed: history.committed_values(),
        energies,
        initial_params: x0,
        outcome,
        energy_fav,
        qvariance,
        depth: estimator.circuit_depth(),
        n_params,
    })
}

// ---- Progress logging ----

#[cfg(feature = "obs_slog")]
fn progress_logger() -> slog::Logger {
    use slog::Drain;

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, slog::o!())
}

#[cfg(feature = "obs_slog")]
fn log_run(log: &slog::Logger, point: &RunPoint, record: &RunRecord) {
    slog::info!(log, "run completed";
        "ansatz" => point.ansatz.as_str(),
        "shots" => point.key.n_shots,
        "iters" => point.key.n_iters,
        "dep_error" => point.key.dep_error,
        "bond_length" => point.bond_length,
        "energy_fav" => format!("{:.6}", record.energy_fav),
        "qvariance" => record.qvariance,
        "depth" => record.depth.map_or_else(|| "-".to_string(), |d| d.to_string()),
        "n_params" => record.n_params,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        estimation::{errors::EstimatorError, traits::FnEstimator},
        experiment::errors::ExperimentError,
        optimization::{errors::OptError, spsa::schedule::GainSchedule},
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Run-point construction from a configuration.
    // - Sweep bookkeeping: one record per (key, bond length), one log file
    //   per run, one table row per run.
    // - Early rejection of invalid configurations and propagation of
    //   factory failures.
    //
    // They intentionally DO NOT cover:
    // - Optimizer numerics, tested in `optimization::spsa`.
    // -------------------------------------------------------------------------

    fn small_config(dir: &std::path::Path) -> SweepConfig {
        SweepConfig {
            bond_lengths: vec![1.4, 1.6],
            n_iters: vec![3],
            error_scales: vec![0.0, 1.0],
            gains: GainSchedule::fixed(0.1, 0.1),
            output_dir: dir.to_path_buf(),
            ..SweepConfig::default()
        }
    }

    fn bowl(point: &RunPoint) -> EstResult<FnEstimator<impl FnMut(&ParamVector) -> EstResult<f64>>> {
        let offset = -point.bond_length;
        Ok(FnEstimator::new(3, move |x: &ParamVector| Ok(offset + x.dot(x))).with_depth(12))
    }

    #[test]
    // Purpose
    // -------
    // Run points carry scaled noise, the coupling map and the geometry.
    //
    // Given
    // -----
    // - Default configuration, key (0, 100, 2.0), bond length 1.5.
    //
    // Expect
    // ------
    // - p_2q = 0.04, 8 directed edges, the native basis, LiH geometry,
    //   folded precision 0.
    fn run_point_describes_configuration() {
        // Arrange
        let cfg = SweepConfig::default();

        // Act
        let point = run_point(&cfg, ExperimentKey::new(0, 100, 2.0), 1.5, 9).unwrap();

        // Assert
        assert!((point.noise.p_2q - 0.04).abs() < 1e-15);
        assert_eq!(point.coupling_map.len(), 8);
        assert_eq!(point.basis_gates, vec!["id", "rz", "sx", "x", "cx"]);
        assert_eq!(point.geometry, "Li 0 0 0; H 0 0 1.5");
        assert_eq!(point.shot_precision, 0.0);
        assert_eq!(point.seed, 9);
    }

    #[test]
    // Purpose
    // -------
    // Perturbation directions and shot noise draw from different streams.
    //
    // Given
    // -----
    // - Run points for consecutive run indices 0..4.
    //
    // Expect
    // ------
    // - Noise seeds differ from every SPSA seed of the sweep, and the first
    //   64 draws of the two generators of each run are not identical.
    fn shot_noise_stream_is_independent_of_directions() {
        // Arrange
        let cfg = SweepConfig::default();
        let key = ExperimentKey::new(1000, 100, 0.0);

        // Act
        let points: Vec<RunPoint> =
            (0..4).map(|i| run_point(&cfg, key, 1.5, cfg.seed + i).unwrap()).collect();

        // Assert
        for p in &points {
            assert!(points.iter().all(|q| q.seed != p.noise_seed));
            let mut directions = StdRng::seed_from_u64(p.seed);
            let mut noise = StdRng::seed_from_u64(p.noise_seed);
            let a: Vec<u64> = (0..64).map(|_| directions.gen()).collect();
            let b: Vec<u64> = (0..64).map(|_| noise.gen()).collect();
            assert_ne!(a, b);
        }
    }

    #[test]
    // Purpose
    // -------
    // A sweep produces one record, log and row per (key, bond length).
    //
    // Given
    // -----
    // - 2 error scales × 2 bond lengths, 3 iterations, fixed gains,
    //   a 3-parameter bowl estimator with depth 12.
    //
    // Expect
    // ------
    // - 2 keys with 2 runs each; every run has 10 energies (initial point
    //   plus three per iteration) and its own log file with 11 lines; the
    //   table has 5 lines.
    fn sweep_records_every_run() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_config(dir.path());
        let mut factory = bowl;

        // Act
        let results = run_sweep(&cfg, &mut factory).unwrap();

        // Assert
        assert_eq!(results.len(), 2);
        for (key, entry) in &results {
            assert_eq!(entry.bond_lengths, vec![1.4, 1.6]);
            for run in &entry.runs {
                assert_eq!(run.energies.len(), 10);
                assert_eq!(run.depth, Some(12));
                assert_eq!(run.n_params, 3);
                let log = fs::read_to_string(cfg.run_log_path(key, run.bond_length)).unwrap();
                assert_eq!(log.lines().count(), 11);
            }
        }
        let table = fs::read_to_string(cfg.results_path()).unwrap();
        assert_eq!(table.lines().count(), 5);
    }

    #[test]
    // Purpose
    // -------
    // Invalid configurations are rejected before any file is created.
    //
    // Given
    // -----
    // - 4 active orbitals, i.e. 8 qubits.
    //
    // Expect
    // ------
    // - `UnsupportedActiveSpace` and no results directory.
    fn invalid_config_writes_nothing() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cfg = SweepConfig { active_orbitals: 4, ..small_config(dir.path()) };
        let mut factory = bowl;

        // Act
        let err = run_sweep(&cfg, &mut factory).unwrap_err();

        // Assert
        assert!(matches!(err, ExperimentError::UnsupportedActiveSpace { n_qubits: 8, .. }));
        assert!(!cfg.results_path().exists());
    }

    #[test]
    // Purpose
    // -------
    // An estimator failure mid-sweep aborts it and keeps earlier rows.
    //
    // Given
    // -----
    // - A factory whose estimators fail for bond length 1.6.
    //
    // Expect
    // ------
    // - `Optimization { EstimatorFailed }`; the table holds the header and
    //   the 1.4 row.
    fn estimator_failure_aborts_sweep() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_config(dir.path());
        let mut factory = |point: &RunPoint| {
            let fail = point.bond_length > 1.5;
            Ok::<_, EstimatorError>(FnEstimator::new(3, move |x: &ParamVector| {
                if fail {
                    Err(EstimatorError::Backend { text: "simulator crashed".to_string() })
                } else {
                    Ok(x.dot(x))
                }
            }))
        };

        // Act
        let err = run_sweep(&cfg, &mut factory).unwrap_err();

        // Assert
        assert!(matches!(
            err,
            ExperimentError::Optimization { source: OptError::EstimatorFailed { eval_index: 0, .. } }
        ));
        let table = fs::read_to_string(cfg.results_path()).unwrap();
        assert_eq!(table.lines().count(), 2);
    }
}
