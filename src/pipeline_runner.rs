//! Pipeline Runner - stage orchestration
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │ Generate │──▶│  Driver  │──▶│  Native  │──▶│   Gate   │──▶│  Report  │
//! │ (.bin)   │   │ (procs)  │   │ (sample) │   │ (poll)   │   │ (json)   │
//! └──────────┘   └──────────┘   └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! Generation and build failures abort before anything is measured. A failure
//! at one size of the native run is handled per [`SizeFailurePolicy`]; rows
//! already collected are written either way. A results file from an earlier
//! run is removed before measuring, so a failed run never leaves one behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::bench::generator::{self, GeneratedPair};
use crate::bench::pacing::Sleeper;
use crate::bench::runner::{MultiplicationRunner, RunnerConfig};
use crate::bench::sampler::ResourceSampler;
use crate::config::{AppConfig, BenchmarkConfig, SizeFailurePolicy};
use crate::csv_io;
use crate::driver::{ProcessDriver, ProcessReport};
use crate::error::{BenchError, BenchResult};
use crate::layout::{self, BenchLayout};
use crate::matrix::Matrix;
use crate::models::{ResultRecord, ResultsTable};
use crate::perf;
use crate::report::ComparisonReport;
use crate::sync_gate::{GateReport, SyncGate};

/// Outcome of the in-process benchmark for one language.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeRunSummary {
    pub language: String,
    pub output: PathBuf,
    pub completed: Vec<usize>,
    pub failed: Vec<(usize, String)>,
}

// ============================================================
// STAGES
// ============================================================

/// Create the directory layout and write all input matrices.
pub fn generate_inputs(
    bench: &BenchmarkConfig,
    layout: &BenchLayout,
) -> BenchResult<Vec<GeneratedPair>> {
    layout.ensure()?;
    generator::generate_matrices(&bench.matrix_sizes, bench.seed, &layout.matrix_dir)
}

/// Build and run every configured external language implementation.
pub fn drive_external(config: &AppConfig, layout: &BenchLayout) -> BenchResult<Vec<ProcessReport>> {
    layout.ensure()?;
    ProcessDriver::new(&layout.results_dir).run_all(&config.driver.build, &config.driver.run)
}

/// Warm up, measure every size, aggregate and write this language's CSV.
pub fn run_native_benchmark<S, Z>(
    bench: &BenchmarkConfig,
    layout: &BenchLayout,
    sampler: S,
    sleeper: Z,
) -> BenchResult<NativeRunSummary>
where
    S: ResourceSampler,
    Z: Sleeper,
{
    let mut runner = MultiplicationRunner::new(RunnerConfig::from(bench), sampler, sleeper);
    let policy = bench.on_size_failure;
    let output = layout.results_csv(&bench.language);
    remove_previous_results(&output)?;

    if let Err(e) = warm_up_largest(bench, layout, &mut runner) {
        match policy {
            SizeFailurePolicy::Abort => return Err(e),
            SizeFailurePolicy::Continue => {
                tracing::warn!("[RUN] Warm-up skipped: {}", e);
            }
        }
    }

    let mut table = ResultsTable::new(bench.language.clone());
    let mut summary = NativeRunSummary {
        language: bench.language.clone(),
        output: output.clone(),
        completed: Vec::new(),
        failed: Vec::new(),
    };
    let mut first_error: Option<BenchError> = None;

    for &size in &bench.matrix_sizes {
        tracing::info!("[RUN] === Processing matrices of size {}x{} ===", size, size);
        match measure_size(bench, layout, &mut runner, size) {
            Ok(record) => {
                table.push(record);
                summary.completed.push(size);
            }
            Err(e) => {
                tracing::error!("[RUN] Size {} failed: {}", size, e);
                summary.failed.push((size, e.to_string()));
                if policy == SizeFailurePolicy::Abort {
                    if !table.is_empty() {
                        csv_io::write_results(&table, &output)?;
                    }
                    return Err(e);
                }
                first_error.get_or_insert(e);
            }
        }
    }

    if table.is_empty() {
        // Never publish a header-only file: it would open the gate on no data.
        return Err(first_error.unwrap_or(BenchError::EmptySamples {
            language: bench.language.clone(),
            size: 0,
        }));
    }
    csv_io::write_results(&table, &output)?;
    tracing::info!(
        "[RUN] {} completed {} size(s), {} failed",
        bench.language,
        summary.completed.len(),
        summary.failed.len()
    );
    Ok(summary)
}

fn remove_previous_results(path: &Path) -> BenchResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!("[RUN] Removed previous results {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(BenchError::ResultsIo {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn warm_up_largest<S: ResourceSampler, Z: Sleeper>(
    bench: &BenchmarkConfig,
    layout: &BenchLayout,
    runner: &mut MultiplicationRunner<S, Z>,
) -> BenchResult<()> {
    let Some(largest) = bench.largest_size() else {
        return Ok(());
    };
    if bench.warmup_iterations == 0 {
        return Ok(());
    }
    let a = Matrix::read_from_file(&layout::matrix_a_path(&layout.matrix_dir, largest), largest)?;
    let b = Matrix::read_from_file(&layout::matrix_b_path(&layout.matrix_dir, largest), largest)?;
    runner.warm_up(&a, &b)
}

fn measure_size<S: ResourceSampler, Z: Sleeper>(
    bench: &BenchmarkConfig,
    layout: &BenchLayout,
    runner: &mut MultiplicationRunner<S, Z>,
    size: usize,
) -> BenchResult<ResultRecord> {
    let path_a = layout::matrix_a_path(&layout.matrix_dir, size);
    let path_b = layout::matrix_b_path(&layout.matrix_dir, size);
    let a = Matrix::read_from_file(&path_a, size)?;
    let b = Matrix::read_from_file(&path_b, size)?;

    let samples = runner.run(&a, &b)?;
    perf::aggregate(&bench.language, size, &path_a, &path_b, &samples)
}

/// Wait for every language's CSV, then build and write the comparison.
pub fn await_and_compare<Z: Sleeper>(
    config: &AppConfig,
    layout: &BenchLayout,
    sleeper: Z,
) -> BenchResult<(GateReport, ComparisonReport)> {
    let expected = layout.expected_results(&config.sync.languages);
    let mut gate = SyncGate::from_config(&config.sync, sleeper);
    let gate_report = gate.wait_for(&expected)?;

    let tables = ComparisonReport::load(&expected)?;
    let report = ComparisonReport::from_tables(&tables);
    report.log_summary();
    report.write_json(&layout.graphs_dir.join("comparison.json"))?;
    Ok((gate_report, report))
}
