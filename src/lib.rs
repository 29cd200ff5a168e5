//! naive_matrix_bench - Cross-language naive matrix multiplication benchmark
//!
//! Orchestration and measurement harness: every language multiplies the same
//! seeded matrices with the textbook triple loop and reports time, CPU and
//! memory in one shared CSV schema.
//!
//! # Modules
//!
//! - [`matrix`] - `i32` square matrices, raw binary format, naive kernel
//! - [`bench`] - Input generation, resource sampling, paced measurement loop
//! - [`perf`] - Mean / median / std aggregation
//! - [`models`] - ResultRecord and ResultsTable
//! - [`csv_io`] - Canonical results CSV
//! - [`driver`] - External language processes
//! - [`sync_gate`] - Bounded wait for every language's results
//! - [`report`] - Comparison hand-off for plotting
//! - [`pipeline_runner`] - Stage orchestration

pub mod bench;
pub mod config;
pub mod csv_io;
pub mod driver;
pub mod error;
pub mod layout;
pub mod logging;
pub mod matrix;
pub mod models;
pub mod perf;
pub mod pipeline_runner;
pub mod report;
pub mod sync_gate;

// Convenient re-exports at crate root
pub use bench::generator::{GeneratedPair, generate_matrices};
pub use bench::pacing::{Pause, RecordingSleeper, Sleeper, ThreadSleeper};
pub use bench::runner::{BenchmarkSample, MultiplicationRunner, RunnerConfig};
pub use bench::sampler::{FixedSampler, ProcessSampler, ResourceSampler};
pub use config::{AppConfig, SizeFailurePolicy};
pub use driver::{ExternalCommand, ProcessDriver, ProcessReport};
pub use error::{BenchError, BenchResult};
pub use layout::BenchLayout;
pub use matrix::{Matrix, naive_multiply};
pub use models::{ResultRecord, ResultsTable};
pub use perf::{MetricStats, SampleSeries, aggregate};
pub use report::ComparisonReport;
pub use sync_gate::{GateReport, SyncGate};
