//! External Process Driver
//!
//! Runs each language's standalone benchmark as a blocking subprocess.
//! Commands are structured descriptors (program, argument list, working
//! directory) taken from configuration; nothing goes through a shell.
//!
//! Build steps all run before the first run step. Any failure, build or run,
//! stops the sequence.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCommand {
    /// Language (or build step) name used in logs and errors
    pub label: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Canonical results CSV this process is expected to produce
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Where older versions of the implementation drop their CSV
    #[serde(default)]
    pub legacy_output: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(label: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            output: None,
            legacy_output: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn legacy_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy_output = Some(path.into());
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Build,
    Run,
}

/// Outcome of one successful subprocess.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub label: String,
    pub kind: StepKind,
    /// Wall-clock duration of the whole invocation (spawn to exit)
    pub wall_time: Duration,
    /// Set when a CSV was moved from the legacy location
    pub relocated: Option<PathBuf>,
}

pub struct ProcessDriver {
    results_dir: PathBuf,
}

impl ProcessDriver {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// Compile once, then run every language in order. Fail-fast.
    pub fn run_all(
        &self,
        build: &[ExternalCommand],
        run: &[ExternalCommand],
    ) -> BenchResult<Vec<ProcessReport>> {
        let mut reports = Vec::with_capacity(build.len() + run.len());

        for step in build {
            reports.push(self.execute(step, StepKind::Build)?);
        }
        if !build.is_empty() {
            tracing::info!("[DRIVER] {} build step(s) completed", build.len());
        }

        for step in run {
            let mut report = self.execute(step, StepKind::Run)?;
            report.relocated = self.relocate_legacy_output(step)?;
            reports.push(report);
        }
        Ok(reports)
    }

    fn execute(&self, step: &ExternalCommand, kind: StepKind) -> BenchResult<ProcessReport> {
        tracing::info!(
            "[DRIVER] {:?} '{}': {} {}",
            kind,
            step.label,
            step.program,
            step.args.join(" ")
        );

        let start = Instant::now();
        let status = step
            .to_command()
            .status()
            .map_err(|source| BenchError::ProcessSpawn {
                label: step.label.clone(),
                program: step.program.clone(),
                source,
            })?;
        let wall_time = start.elapsed();

        if !status.success() {
            tracing::error!(
                "[DRIVER] '{}' failed after {:?} ({})",
                step.label,
                wall_time,
                status
            );
            return Err(BenchError::ExternalProcessFailure {
                label: step.label.clone(),
                program: step.program.clone(),
                code: status.code(),
            });
        }

        tracing::info!(
            "[DRIVER] '{}' finished in {:.3}s",
            step.label,
            wall_time.as_secs_f64()
        );
        Ok(ProcessReport {
            label: step.label.clone(),
            kind,
            wall_time,
            relocated: None,
        })
    }

    /// Move a CSV left at the legacy location into the results directory,
    /// replacing any file a previous run left there. Contents are not inspected.
    fn relocate_legacy_output(&self, step: &ExternalCommand) -> BenchResult<Option<PathBuf>> {
        let Some(legacy) = &step.legacy_output else {
            return Ok(None);
        };
        let target = match &step.output {
            Some(out) => out.clone(),
            None => match legacy.file_name() {
                Some(name) => self.results_dir.join(name),
                None => return Ok(None),
            },
        };
        if !legacy.exists() {
            return Ok(None);
        }
        if target.exists() {
            tracing::info!(
                "[DRIVER] Replacing previous {} results at {}",
                step.label,
                target.display()
            );
        }

        move_file(legacy, &target).map_err(|source| BenchError::ResultsIo {
            path: target.clone(),
            source,
        })?;
        tracing::info!(
            "[DRIVER] Moved {} output {} -> {}",
            step.label,
            legacy.display(),
            target.display()
        );
        Ok(Some(target))
    }
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_err() {
        // rename fails across filesystems
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}
