//! Statistics Aggregator
//!
//! Reduces per-iteration samples to mean / median / population standard
//! deviation for time, CPU and memory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bench::runner::BenchmarkSample;
use crate::error::{BenchError, BenchResult};
use crate::models::ResultRecord;

/// Central tendency and spread of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (divides by `n`)
    pub std: f64,
}

impl MetricStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mean = mean(values);
        Some(Self {
            mean,
            median: median(values),
            std: std_dev(values, mean),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// The three metric columns of one sample set. Index `i` of every column
/// comes from sample `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    pub times: Vec<f64>,
    pub cpu: Vec<f64>,
    pub memory: Vec<f64>,
}

impl SampleSeries {
    pub fn from_samples(samples: &[BenchmarkSample]) -> Self {
        let mut series = Self {
            times: Vec::with_capacity(samples.len()),
            cpu: Vec::with_capacity(samples.len()),
            memory: Vec::with_capacity(samples.len()),
        };
        for s in samples {
            series.times.push(s.elapsed_seconds);
            series.cpu.push(s.cpu_percent);
            series.memory.push(s.memory_delta_mb);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn is_aligned(&self) -> bool {
        self.times.len() == self.cpu.len() && self.cpu.len() == self.memory.len()
    }
}

/// Build the record for one (language, size).
///
/// Zero samples is a caller error ([`BenchError::EmptySamples`]), never a
/// zero-filled row.
pub fn aggregate(
    language: &str,
    size: usize,
    matrix_a: &Path,
    matrix_b: &Path,
    samples: &[BenchmarkSample],
) -> BenchResult<ResultRecord> {
    let empty = || BenchError::EmptySamples {
        language: language.to_string(),
        size,
    };
    let series = SampleSeries::from_samples(samples);
    debug_assert!(series.is_aligned());

    let time = MetricStats::from_values(&series.times).ok_or_else(empty)?;
    let cpu = MetricStats::from_values(&series.cpu).ok_or_else(empty)?;
    let memory = MetricStats::from_values(&series.memory).ok_or_else(empty)?;

    let size = u32::try_from(size)
        .map_err(|_| BenchError::Config(format!("matrix size {} does not fit in u32", size)))?;

    tracing::info!(
        "[STATS] {} size {}: mean_time={:.6}s median_time={:.6}s std_time={:.6}s mean_cpu={:.2}% mean_mem={:.2}MB",
        language,
        size,
        time.mean,
        time.median,
        time.std,
        cpu.mean,
        memory.mean
    );

    Ok(ResultRecord {
        size,
        matrix_a_path: matrix_a.to_path_buf(),
        matrix_b_path: matrix_b.to_path_buf(),
        time,
        cpu,
        memory,
        language: language.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    fn sample(t: f64, c: f64, m: f64) -> BenchmarkSample {
        BenchmarkSample {
            elapsed_seconds: t,
            cpu_percent: c,
            memory_delta_mb: m,
        }
    }

    #[test]
    fn test_one_two_three() {
        let s = MetricStats::from_values(&[1.0, 2.0, 3.0]).unwrap();
        assert!(close(s.mean, 2.0));
        assert!(close(s.median, 2.0));
        assert!(close(s.std, 0.8165), "std = {}", s.std);
    }

    #[test]
    fn test_even_count_median_averages_middle_pair() {
        let s = MetricStats::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!(close(s.median, 2.5));
        assert!(close(s.mean, 2.5));
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let s = MetricStats::from_values(&[0.125]).unwrap();
        assert_eq!(s.mean, 0.125);
        assert_eq!(s.median, 0.125);
        assert_eq!(s.std, 0.0);
    }

    #[test]
    fn test_empty_has_no_stats() {
        assert!(MetricStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_aggregate_keeps_metrics_independent() {
        let samples = [
            sample(1.0, 90.0, 0.5),
            sample(2.0, 100.0, 0.0),
            sample(3.0, 95.0, 1.0),
        ];
        let series = SampleSeries::from_samples(&samples);
        assert!(series.is_aligned());
        assert_eq!(series.len(), 3);
        assert_eq!(series.cpu, vec![90.0, 100.0, 95.0]);

        let record = aggregate(
            "Rust",
            10,
            Path::new("matrices/A_10.bin"),
            Path::new("matrices/B_10.bin"),
            &samples,
        )
        .unwrap();
        assert_eq!(record.size, 10);
        assert_eq!(record.language, "Rust");
        assert!(close(record.time.mean, 2.0));
        assert!(close(record.time.std, 0.8165));
        assert!(close(record.cpu.median, 95.0));
        assert!(close(record.memory.mean, 0.5));
    }

    #[test]
    fn test_aggregate_rejects_empty_samples() {
        let err = aggregate("C", 100, Path::new("a"), Path::new("b"), &[]).unwrap_err();
        match err {
            BenchError::EmptySamples { language, size } => {
                assert_eq!(language, "C");
                assert_eq!(size, 100);
            }
            other => panic!("expected EmptySamples, got {:?}", other),
        }
    }
}
