//! experiment::config — sweep configuration and experiment keys.
//!
//! Purpose
//! -------
//! Describe one sweep: which molecule and ansatz, which grids of bond
//! lengths, shot counts, iteration counts and depolarizing error scales,
//! the active space, and how estimators and the optimizer are configured.
//!
//! Key behaviors
//! -------------
//! - [`SweepConfig::validate`] rejects every configuration problem before
//!   any estimator is built or evaluated.
//! - [`ExperimentKey`] identifies one `(n_shots, n_iters, dep_error)` cell
//!   and is totally ordered so it can key a `BTreeMap`.
//! - [`SweepConfig::run_log_path`] gives each sweep point its own log file.
//!
//! Conventions
//! -----------
//! - Qubits are `2 * active_orbitals` (Jordan–Wigner, one qubit per spin
//!   orbital); only 4 and 6 qubits have a coupling map.
//! - Output layout: `<output_dir>/results/<results_file>` for the table and
//!   `<output_dir>/<kind>/<ansatz>/n_elec=<e>/no=<o>/…` for per-run logs.
use std::{
    cmp::Ordering,
    collections::BTreeSet,
    path::PathBuf,
    str::FromStr,
};

use crate::{
    estimation::{
        noise::{DepolarizingNoise, ShotPolicy},
        traits::EstimatorKind,
    },
    experiment::errors::{ExperimentError, ExperimentResult},
    optimization::spsa::{
        schedule::GainSchedule,
        traits::{Blocking, OptimizerName, SpsaOptions},
        types::DEFAULT_REGULARIZATION,
    },
};

/// Supported qubit counts.
pub const SUPPORTED_QUBITS: [usize; 2] = [4, 6];

/// Default number of trailing energies used for `qvariance`.
pub const DEFAULT_TAIL_WINDOW: usize = 10;

/// Diatomic molecule studied by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Molecule {
    #[default]
    LiH,
    H2,
}

impl Molecule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Molecule::LiH => "LiH",
            Molecule::H2 => "H2",
        }
    }

    /// Geometry string with the second atom on the z-axis at `bond_length` Å.
    pub fn geometry(&self, bond_length: f64) -> String {
        match self {
            Molecule::LiH => format!("Li 0 0 0; H 0 0 {bond_length}"),
            Molecule::H2 => format!("H 0 0 0; H 0 0 {bond_length}"),
        }
    }
}

impl FromStr for Molecule {
    type Err = ExperimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lih" => Ok(Molecule::LiH),
            "h2" => Ok(Molecule::H2),
            _ => Err(ExperimentError::UnknownMolecule {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'LiH' or 'H2'.",
            }),
        }
    }
}

/// Variational circuit family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ansatz {
    #[default]
    Uccsd,
    EfficientSu2,
}

impl Ansatz {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ansatz::Uccsd => "UCCSD",
            Ansatz::EfficientSu2 => "EfficientSU2",
        }
    }
}

impl FromStr for Ansatz {
    type Err = ExperimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uccsd" => Ok(Ansatz::Uccsd),
            "efficientsu2" | "hea" => Ok(Ansatz::EfficientSu2),
            _ => Err(ExperimentError::UnknownAnsatz {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'UCCSD', 'EfficientSU2' or 'HEA'.",
            }),
        }
    }
}

/// `(n_shots, n_iters, dep_error)` identifying one experiment cell.
///
/// `dep_error` is compared with `f64::total_cmp`; `-0.0` is normalized to
/// `0.0` on construction so both spellings land on the same key.
#[derive(Debug, Clone, Copy)]
pub struct ExperimentKey {
    pub n_shots: u64,
    pub n_iters: u64,
    pub dep_error: f64,
}

impl ExperimentKey {
    pub fn new(n_shots: u64, n_iters: u64, dep_error: f64) -> Self {
        Self { n_shots, n_iters, dep_error: dep_error + 0.0 }
    }
}

impl PartialEq for ExperimentKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ExperimentKey {}

impl PartialOrd for ExperimentKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExperimentKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.n_shots
            .cmp(&other.n_shots)
            .then(self.n_iters.cmp(&other.n_iters))
            .then(self.dep_error.total_cmp(&other.dep_error))
    }
}

/// Full description of one sweep.
///
/// Default: LiH, UCCSD, bond length 1.595 Å, 0 shots, 100 iterations,
/// error scales `[0, 1]`, 2 active orbitals, 2 electrons, `"spsa"`,
/// noisy estimator with folded shot noise, seed 0, output under `out/`.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub molecule: Molecule,
    pub ansatz: Ansatz,
    pub bond_lengths: Vec<f64>,
    pub n_shots: Vec<u64>,
    pub n_iters: Vec<u64>,
    pub error_scales: Vec<f64>,
    pub active_orbitals: usize,
    pub n_electrons: usize,
    pub optimizer: String,
    pub regularization: f64,
    pub estimator_kind: EstimatorKind,
    pub shot_policy: ShotPolicy,
    pub seed: u64,
    pub output_dir: PathBuf,
    pub results_file: String,
    pub tail_window: usize,
    pub gains: GainSchedule,
    pub verbose: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            molecule: Molecule::LiH,
            ansatz: Ansatz::Uccsd,
            bond_lengths: vec![1.595],
            n_shots: vec![0],
            n_iters: vec![100],
            error_scales: vec![0.0, 1.0],
            active_orbitals: 2,
            n_electrons: 2,
            optimizer: "spsa".to_string(),
            regularization: DEFAULT_REGULARIZATION,
            estimator_kind: EstimatorKind::Noisy,
            shot_policy: ShotPolicy::Folded,
            seed: 0,
            output_dir: PathBuf::from("out"),
            results_file: "results.txt".to_string(),
            tail_window: DEFAULT_TAIL_WINDOW,
            gains: GainSchedule::default(),
            verbose: false,
        }
    }
}

impl SweepConfig {
    pub fn n_qubits(&self) -> usize {
        2 * self.active_orbitals
    }

    /// Check the whole configuration.
    ///
    /// # Errors
    /// - [`ExperimentError::UnsupportedActiveSpace`] unless `2 * active` is 4 or 6.
    /// - [`ExperimentError::InvalidElectronCount`] if electrons exceed `2 * active`.
    /// - [`ExperimentError::Optimization`] for an unknown optimizer name or
    ///   invalid regularization/gains.
    /// - [`ExperimentError::EmptyGrid`], [`ExperimentError::InvalidBondLength`],
    ///   [`ExperimentError::InvalidIterationCount`],
    ///   [`ExperimentError::InvalidErrorScale`] for bad grids.
    /// - [`ExperimentError::DuplicateKey`] if two cells share a key.
    /// - [`ExperimentError::InvalidTailWindow`] if `tail_window < 2`.
    pub fn validate(&self) -> ExperimentResult<()> {
        let n_qubits = self.n_qubits();
        if !SUPPORTED_QUBITS.contains(&n_qubits) {
            return Err(ExperimentError::UnsupportedActiveSpace {
                active_orbitals: self.active_orbitals,
                n_qubits,
                reason: "Number of qubits not supported; must be either 4 or 6.",
            });
        }
        if self.n_electrons > n_qubits {
            return Err(ExperimentError::InvalidElectronCount {
                n_electrons: self.n_electrons,
                max: n_qubits,
            });
        }
        self.optimizer.parse::<OptimizerName>()?;
        self.spsa_options(1, 0)?;

        verify_non_empty("bond_lengths", self.bond_lengths.len())?;
        verify_non_empty("n_shots", self.n_shots.len())?;
        verify_non_empty("n_iters", self.n_iters.len())?;
        verify_non_empty("error_scales", self.error_scales.len())?;

        for &value in &self.bond_lengths {
            verify_bond_length(value)?;
        }
        let mut distinct = BTreeSet::new();
        for &value in &self.bond_lengths {
            if !distinct.insert(value.to_bits()) {
                return Err(ExperimentError::InvalidBondLength {
                    value,
                    reason: "Bond lengths must be distinct.",
                });
            }
        }
        for &value in &self.n_iters {
            if value == 0 {
                return Err(ExperimentError::InvalidIterationCount { value });
            }
        }
        for &value in &self.error_scales {
            verify_error_scale(value)?;
        }

        let mut seen = BTreeSet::new();
        for key in self.keys() {
            if !seen.insert(key) {
                return Err(ExperimentError::DuplicateKey {
                    n_shots: key.n_shots,
                    n_iters: key.n_iters,
                    dep_error: key.dep_error,
                });
            }
        }

        if self.tail_window < 2 {
            return Err(ExperimentError::InvalidTailWindow { value: self.tail_window });
        }
        Ok(())
    }

    /// Experiment keys in sweep order (shots, then iterations, then scale).
    pub fn keys(&self) -> impl Iterator<Item = ExperimentKey> + '_ {
        self.n_shots.iter().flat_map(move |&s| {
            self.n_iters.iter().flat_map(move |&i| {
                self.error_scales.iter().map(move |&d| ExperimentKey::new(s, i, d))
            })
        })
    }

    /// Optimizer options for one run: strict blocking, the configured gains
    /// and regularization, and a per-run seed.
    pub fn spsa_options(&self, max_iter: u64, seed: u64) -> ExperimentResult<SpsaOptions> {
        let opts = SpsaOptions::new(
            max_iter,
            self.regularization,
            Some(Blocking::strict()),
            self.gains,
            seed,
        )?;
        Ok(opts.with_verbose(self.verbose))
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join("results").join(&self.results_file)
    }

    /// Directory holding the per-run logs of this sweep.
    pub fn run_log_dir(&self) -> PathBuf {
        self.output_dir
            .join(self.estimator_kind.as_str())
            .join(self.ansatz.as_str())
            .join(format!("n_elec={}", self.n_electrons))
            .join(format!("no={}", self.active_orbitals))
    }

    /// Per-run log file; distinct for every key and bond length.
    pub fn run_log_path(&self, key: &ExperimentKey, bond_length: f64) -> PathBuf {
        self.run_log_dir().join(format!(
            "shots{}_iters{}_scale{}_bond{}.out",
            key.n_shots, key.n_iters, key.dep_error, bond_length
        ))
    }
}

fn verify_non_empty(name: &'static str, len: usize) -> ExperimentResult<()> {
    if len == 0 {
        return Err(ExperimentError::EmptyGrid { name });
    }
    Ok(())
}

fn verify_bond_length(value: f64) -> ExperimentResult<()> {
    if !value.is_finite() {
        return Err(ExperimentError::InvalidBondLength {
            value,
            reason: "Bond length must be finite.",
        });
    }
    if value <= 0.0 {
        return Err(ExperimentError::InvalidBondLength {
            value,
            reason: "Bond length must be positive.",
        });
    }
    Ok(())
}

fn verify_error_scale(value: f64) -> ExperimentResult<()> {
    if !value.is_finite() {
        return Err(ExperimentError::InvalidErrorScale {
            value,
            reason: "Error scale must be finite.",
        });
    }
    if value < 0.0 {
        return Err(ExperimentError::InvalidErrorScale {
            value,
            reason: "Error scale must be non-negative.",
        });
    }
    if DepolarizingNoise::scaled(value).is_err() {
        return Err(ExperimentError::InvalidErrorScale {
            value,
            reason: "Scaled depolarizing probabilities must not exceed 1.",
        });
    }
    Ok(())
}
