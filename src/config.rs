use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::driver::ExternalCommand;
use crate::error::{BenchError, BenchResult};
use crate::matrix::Matrix;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub dirs: DirsConfig,
    pub benchmark: BenchmarkConfig,
    /// External language processes (build once, then run)
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DirsConfig {
    pub matrix_dir: PathBuf,
    pub results_dir: PathBuf,
    pub graphs_dir: PathBuf,
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            matrix_dir: PathBuf::from("matrices"),
            results_dir: PathBuf::from("results"),
            graphs_dir: PathBuf::from("graphs"),
        }
    }
}

/// What to do when a single matrix size fails inside the in-process runner.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizeFailurePolicy {
    /// Log the failure, keep the sizes already measured and move on.
    #[default]
    Continue,
    /// Write what was collected so far, then stop the run.
    Abort,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BenchmarkConfig {
    pub matrix_sizes: Vec<usize>,
    pub seed: u64,
    pub iterations: usize,
    pub pause_every: usize,
    pub pause_duration_secs: u64,
    pub warmup_iterations: usize,
    pub warmup_pause_secs: u64,
    /// Label written into the Language column for the in-process run
    pub language: String,
    #[serde(default)]
    pub on_size_failure: SizeFailurePolicy,
}

impl BenchmarkConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.pause_duration_secs)
    }

    pub fn warmup_pause(&self) -> Duration {
        Duration::from_secs(self.warmup_pause_secs)
    }

    pub fn largest_size(&self) -> Option<usize> {
        self.matrix_sizes.iter().copied().max()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DriverConfig {
    #[serde(default)]
    pub build: Vec<ExternalCommand>,
    #[serde(default)]
    pub run: Vec<ExternalCommand>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Languages whose results CSV must exist before comparison
    pub languages: Vec<String>,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            poll_interval_ms: 1000,
            timeout_secs: 3600,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`
    pub fn load(env: &str) -> BenchResult<Self> {
        Self::from_file(format!("config/{}.yaml", env))
    }

    pub fn from_file(path: impl Into<PathBuf>) -> BenchResult<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| {
            BenchError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> BenchResult<Self> {
        let config: AppConfig = serde_yaml::from_str(content)
            .map_err(|e| BenchError::Config(format!("Failed to parse config yaml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BenchResult<()> {
        let bench = &self.benchmark;
        if bench.matrix_sizes.is_empty() {
            return Err(BenchError::Config("matrix_sizes must not be empty".into()));
        }
        if bench.matrix_sizes.contains(&0) {
            return Err(BenchError::Config("matrix sizes must be positive".into()));
        }
        if let Some(n) = bench
            .matrix_sizes
            .iter()
            .find(|&&n| Matrix::expected_file_len(n).is_none())
        {
            return Err(BenchError::Config(format!("matrix size {} is too large", n)));
        }
        if bench.iterations == 0 {
            return Err(BenchError::Config("iterations must be at least 1".into()));
        }
        if bench.pause_every == 0 {
            return Err(BenchError::Config("pause_every must be at least 1".into()));
        }
        if bench.language.trim().is_empty() {
            return Err(BenchError::Config("benchmark.language must be set".into()));
        }
        if self.sync.poll_interval_ms == 0 {
            return Err(BenchError::Config("sync.poll_interval_ms must be positive".into()));
        }
        for cmd in self.driver.build.iter().chain(self.driver.run.iter()) {
            if cmd.program.trim().is_empty() {
                return Err(BenchError::Config(format!(
                    "driver step '{}' has an empty program",
                    cmd.label
                )));
            }
        }
        Ok(())
    }
}
