//! Cross-language comparison hand-off.
//!
//! Runs after the synchronization gate: loads every language's canonical CSV,
//! ranks languages per size by mean time, logs the table and writes
//! `comparison.json` for the plotting collaborator.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::csv_io;
use crate::error::{BenchError, BenchResult};
use crate::models::ResultsTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub mean_time_s: f64,
    pub median_time_s: f64,
    pub mean_cpu_pct: f64,
    pub mean_memory_mb: f64,
    /// Mean time divided by the fastest language's mean time at this size
    pub slowdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeComparison {
    pub size: u32,
    /// Fastest first
    pub entries: Vec<LanguageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub generated_at: DateTime<Utc>,
    pub languages: Vec<String>,
    pub sizes: Vec<SizeComparison>,
}

impl ComparisonReport {
    /// Load the canonical CSV of every expected language.
    pub fn load(expected: &BTreeMap<String, PathBuf>) -> BenchResult<Vec<ResultsTable>> {
        expected
            .values()
            .map(|path| csv_io::load_results(path))
            .collect()
    }

    pub fn from_tables(tables: &[ResultsTable]) -> Self {
        let mut by_size: BTreeMap<u32, Vec<LanguageEntry>> = BTreeMap::new();
        for table in tables {
            for r in table.records() {
                by_size.entry(r.size).or_default().push(LanguageEntry {
                    language: r.language.clone(),
                    mean_time_s: r.time.mean,
                    median_time_s: r.time.median,
                    mean_cpu_pct: r.cpu.mean,
                    mean_memory_mb: r.memory.mean,
                    slowdown: 1.0,
                });
            }
        }

        let sizes = by_size
            .into_iter()
            .map(|(size, mut entries)| {
                entries.sort_by(|a, b| a.mean_time_s.total_cmp(&b.mean_time_s));
                let fastest = entries.first().map(|e| e.mean_time_s).unwrap_or(0.0);
                for e in &mut entries {
                    e.slowdown = if fastest > 0.0 {
                        e.mean_time_s / fastest
                    } else {
                        1.0
                    };
                }
                SizeComparison { size, entries }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            languages: tables.iter().map(|t| t.language.clone()).collect(),
            sizes,
        }
    }

    pub fn log_summary(&self) {
        for cmp in &self.sizes {
            tracing::info!("[REPORT] === {}x{} ===", cmp.size, cmp.size);
            for e in &cmp.entries {
                tracing::info!(
                    "[REPORT] {:<10} mean={:.6}s median={:.6}s cpu={:.1}% mem={:.2}MB x{:.2}",
                    e.language,
                    e.mean_time_s,
                    e.median_time_s,
                    e.mean_cpu_pct,
                    e.mean_memory_mb,
                    e.slowdown
                );
            }
        }
    }

    pub fn write_json(&self, path: &Path) -> BenchResult<()> {
        let io_err = |source| BenchError::ResultsIo {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        fs::write(path, json).map_err(io_err)?;
        tracing::info!("[REPORT] Comparison written to {}", path.display());
        Ok(())
    }
}
