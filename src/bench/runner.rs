//! Resource-Sampling Multiplication Runner
//!
//! Runs the naive kernel in this process, one [`BenchmarkSample`] per
//! iteration. Measurement is strictly sequential on the calling thread:
//! concurrent kernels would contend for the CPU and distort every reading.
//!
//! Per-iteration order:
//!
//! ```text
//! cpu baseline -> rss baseline -> [ timed multiply ] -> elapsed -> cpu % -> rss delta
//! ```
//!
//! The CPU reading closes the window opened by the baseline, so it must be the
//! first sample taken after the multiply. Sampling overhead is not subtracted.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::bench::pacing::{Pause, Sleeper};
use crate::bench::sampler::{RSS_UNAVAILABLE, ResourceSampler};
use crate::config::BenchmarkConfig;
use crate::error::{BenchError, BenchResult};
use crate::matrix::{Matrix, naive_multiply};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub type Kernel = fn(&Matrix, &Matrix) -> Result<Matrix, String>;

/// One measured iteration. Time, CPU and memory always come from the same run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    pub elapsed_seconds: f64,
    pub cpu_percent: f64,
    pub memory_delta_mb: f64,
}

impl BenchmarkSample {
    fn check(self, size: usize, iteration: usize) -> BenchResult<Self> {
        let fields = [
            ("elapsed", self.elapsed_seconds),
            ("cpu", self.cpu_percent),
            ("memory", self.memory_delta_mb),
        ];
        for (name, v) in fields {
            if !v.is_finite() || v < 0.0 {
                return Err(BenchError::MultiplicationFault {
                    size,
                    iteration,
                    reason: format!("invalid {} reading: {}", name, v),
                });
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub iterations: usize,
    pub pause_every: usize,
    pub cooldown: Duration,
    pub warmup_iterations: usize,
    pub warmup_pause: Duration,
}

impl From<&BenchmarkConfig> for RunnerConfig {
    fn from(c: &BenchmarkConfig) -> Self {
        Self {
            iterations: c.iterations,
            pause_every: c.pause_every,
            cooldown: c.cooldown(),
            warmup_iterations: c.warmup_iterations,
            warmup_pause: c.warmup_pause(),
        }
    }
}

/// Cooldown after `iteration` (1-based): every `pause_every` iterations,
/// never after the last one.
#[inline]
pub fn should_cool_down(iteration: usize, iterations: usize, pause_every: usize) -> bool {
    pause_every > 0 && iteration % pause_every == 0 && iteration != iterations
}

pub struct MultiplicationRunner<S, Z> {
    config: RunnerConfig,
    sampler: S,
    sleeper: Z,
    kernel: Kernel,
}

impl<S: ResourceSampler, Z: Sleeper> MultiplicationRunner<S, Z> {
    pub fn new(config: RunnerConfig, sampler: S, sleeper: Z) -> Self {
        Self {
            config,
            sampler,
            sleeper,
            kernel: naive_multiply,
        }
    }

    /// Swap the multiplication routine (fault-injection in tests).
    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Unrecorded multiplications to settle caches and allocator state, each
    /// followed by the warm-up pause. Callers pass the largest configured size.
    pub fn warm_up(&mut self, a: &Matrix, b: &Matrix) -> BenchResult<()> {
        let rounds = self.config.warmup_iterations;
        tracing::info!(
            "[RUN] Warm-up: {} iterations for size {}x{}",
            rounds,
            a.size(),
            a.size()
        );
        for round in 1..=rounds {
            self.multiply(a, b, round)?;
            tracing::debug!("[RUN] Warm-up iteration {} completed", round);
            self.sleeper
                .sleep(self.config.warmup_pause, Pause::WarmUp { round });
        }
        Ok(())
    }

    /// Measure `iterations` multiplications of `a * b`.
    ///
    /// Any fault aborts the size: no sample of a failed iteration, and none
    /// of the earlier ones, is returned.
    pub fn run(&mut self, a: &Matrix, b: &Matrix) -> BenchResult<Vec<BenchmarkSample>> {
        let RunnerConfig {
            iterations,
            pause_every,
            cooldown,
            ..
        } = self.config;
        tracing::info!(
            "[RUN] Size {}x{}: {} iterations, {:?} pause every {} iterations",
            a.size(),
            a.size(),
            iterations,
            cooldown,
            pause_every
        );

        let mut samples = Vec::with_capacity(iterations);
        for iteration in 1..=iterations {
            let sample = self.measure_once(a, b, iteration)?;
            samples.push(sample);

            if should_cool_down(iteration, iterations, pause_every) {
                self.sleeper.sleep(
                    cooldown,
                    Pause::Cooldown {
                        after_iteration: iteration,
                    },
                );
            }
        }
        Ok(samples)
    }

    fn measure_once(
        &mut self,
        a: &Matrix,
        b: &Matrix,
        iteration: usize,
    ) -> BenchResult<BenchmarkSample> {
        let _ = self.sampler.cpu_percent();
        let rss_start = self.sampler.memory_rss_bytes();

        let start = Instant::now();
        self.multiply(a, b, iteration)?;
        let elapsed = start.elapsed().as_secs_f64();

        let cpu = self.sampler.cpu_percent();
        let rss_end = self.sampler.memory_rss_bytes();

        let memory_delta_mb = if rss_start == RSS_UNAVAILABLE || rss_end == RSS_UNAVAILABLE {
            f64::NAN
        } else {
            rss_end.abs_diff(rss_start) as f64 / BYTES_PER_MB
        };
        BenchmarkSample {
            elapsed_seconds: elapsed,
            cpu_percent: cpu,
            memory_delta_mb,
        }
        .check(a.size(), iteration)
    }

    fn multiply(&self, a: &Matrix, b: &Matrix, iteration: usize) -> BenchResult<()> {
        let kernel = self.kernel;
        let fault = |reason: String| BenchError::MultiplicationFault {
            size: a.size(),
            iteration,
            reason,
        };
        match catch_unwind(AssertUnwindSafe(|| kernel(a, b))) {
            Ok(Ok(product)) => {
                std::hint::black_box(product);
                Ok(())
            }
            Ok(Err(reason)) => Err(fault(reason)),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "kernel panicked".to_string());
                Err(fault(format!("panic: {}", reason)))
            }
        }
    }
}
