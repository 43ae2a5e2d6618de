//! experiment::report — aggregated run records and tabular summaries.
//!
//! Purpose
//! -------
//! Hold what a sweep produced and turn it into the plain-text results
//! table and the series that plotting front-ends consume. Rendering plots
//! is left to those front-ends.
//!
//! Key behaviors
//! -------------
//! - [`ResultsWriter`] writes the header once and one fixed-width row per
//!   completed run, flushing after each line so partial sweeps are
//!   readable.
//! - [`tail_variance`] computes `qvariance`, the sample variance of the
//!   last `window` logged energies.
//! - [`convergence_series`] subsamples an energy log; [`pes_curve`]
//!   extracts (bond length, headline energy) pairs for one key.
//!
//! Conventions
//! -----------
//! - Table columns: `n_shots n_iters dep_error energy_fav depth qvariance`,
//!   left-aligned with widths 10, 10, 12, 10, 10, 10; floats to 6 decimals.
//!   A missing depth is written as `-`.
use std::{collections::BTreeMap, io::Write};

use crate::{
    experiment::{config::ExperimentKey, errors::ExperimentResult},
    optimization::spsa::{
        traits::SpsaOutcome,
        types::{Energy, ParamVector},
    },
};
use statrs::statistics::Statistics;

/// Everything kept from one (key, bond length) run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub key: ExperimentKey,
    pub bond_length: f64,
    /// Every logged energy in evaluation order, calibration included.
    pub energies: Vec<Energy>,
    /// Committed value after each logical iteration.
    pub committed: Vec<Energy>,
    pub initial_params: ParamVector,
    pub outcome: SpsaOutcome,
    /// Headline energy from the separate final evaluation.
    pub energy_fav: Energy,
    pub qvariance: f64,
    pub depth: Option<usize>,
    pub n_params: usize,
}

/// Runs sharing one experiment key, in bond-length order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepEntry {
    pub bond_lengths: Vec<f64>,
    pub runs: Vec<RunRecord>,
}

impl SweepEntry {
    pub fn push(&mut self, record: RunRecord) {
        self.bond_lengths.push(record.bond_length);
        self.runs.push(record);
    }

    pub fn energies_fav(&self) -> Vec<Energy> {
        self.runs.iter().map(|r| r.energy_fav).collect()
    }
}

/// Results of a whole sweep, keyed by experiment cell.
pub type SweepResults = BTreeMap<ExperimentKey, SweepEntry>;

/// Header line of the results table (without newline).
pub fn results_header() -> String {
    format!(
        "{:<10} {:<10} {:<12} {:<10} {:<10} {:<10} ",
        "n_shots", "n_iters", "dep_error", "energy_fav", "depth", "qvariance"
    )
}

/// One row of the results table (without newline).
pub fn results_row(record: &RunRecord) -> String {
    let depth = record.depth.map_or_else(|| "-".to_string(), |d| d.to_string());
    format!(
        "{:<10} {:<10} {:<12.6} {:<10.6} {:<10} {:<10.6}",
        record.key.n_shots,
        record.key.n_iters,
        record.key.dep_error,
        record.energy_fav,
        depth,
        record.qvariance
    )
}

/// Incremental writer for the results table.
pub struct ResultsWriter<W: Write> {
    sink: W,
    rows: usize,
}

impl<W: Write> ResultsWriter<W> {
    /// Write the header and flush.
    pub fn new(mut sink: W) -> ExperimentResult<Self> {
        writeln!(sink, "{}", results_header())?;
        sink.flush()?;
        Ok(Self { sink, rows: 0 })
    }

    pub fn write_row(&mut self, record: &RunRecord) -> ExperimentResult<()> {
        writeln!(self.sink, "{}", results_row(record))?;
        self.sink.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Sample variance of the last `window` energies.
///
/// Uses all energies when fewer than `window` exist; `NaN` when fewer than
/// two are available.
pub fn tail_variance(energies: &[Energy], window: usize) -> f64 {
    let start = energies.len().saturating_sub(window);
    energies[start..].iter().variance()
}

/// Every `stride`-th energy starting at `offset`.
///
/// With three evaluations per blocking iteration, `stride = 3 * k` gives
/// one point every `k` iterations. A zero stride yields an empty series.
pub fn convergence_series(energies: &[Energy], offset: usize, stride: usize) -> Vec<Energy> {
    if stride == 0 {
        return Vec::new();
    }
    energies.iter().skip(offset).step_by(stride).copied().collect()
}

/// (bond length, headline energy) pairs for one key, in sweep order.
pub fn pes_curve(results: &SweepResults, key: &ExperimentKey) -> Option<Vec<(f64, Energy)>> {
    results.get(key).map(|entry| {
        entry.runs.iter().map(|r| (r.bond_length, r.energy_fav)).collect()
    })
}
