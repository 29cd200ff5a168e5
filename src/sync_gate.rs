//! Result Synchronization Gate
//!
//! Language implementations may run out-of-band (other runtimes, machines or
//! schedulers). The gate blocks until every expected results CSV exists, so
//! comparison never runs on a partial set. Existence is the only signal: an
//! empty or truncated file opens the gate and fails later when parsed.
//!
//! The wait is bounded: when the timeout elapses first, the gate fails with
//! [`BenchError::SynchronizationTimeout`] listing what is still missing.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::bench::pacing::{Pause, Sleeper};
use crate::config::SyncConfig;
use crate::error::{BenchError, BenchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    pub waited: Duration,
    pub polls: usize,
}

pub struct SyncGate<Z> {
    poll_interval: Duration,
    timeout: Duration,
    sleeper: Z,
}

impl<Z: Sleeper> SyncGate<Z> {
    pub fn new(poll_interval: Duration, timeout: Duration, sleeper: Z) -> Self {
        Self {
            poll_interval,
            timeout,
            sleeper,
        }
    }

    pub fn from_config(config: &SyncConfig, sleeper: Z) -> Self {
        Self::new(config.poll_interval(), config.timeout(), sleeper)
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Block until every path in `expected` exists.
    ///
    /// Returns without sleeping when all files are already present.
    pub fn wait_for(&mut self, expected: &BTreeMap<String, PathBuf>) -> BenchResult<GateReport> {
        let start = Instant::now();
        let mut polls = 0usize;
        let mut last_missing_count = usize::MAX;

        loop {
            polls += 1;
            let missing: Vec<(String, PathBuf)> = expected
                .iter()
                .filter(|(_, path)| !path.exists())
                .map(|(lang, path)| (lang.clone(), path.clone()))
                .collect();

            if missing.is_empty() {
                let waited = start.elapsed();
                tracing::info!(
                    "[GATE] All {} result files present after {:?}",
                    expected.len(),
                    waited
                );
                return Ok(GateReport { waited, polls });
            }

            if missing.len() != last_missing_count {
                let names: Vec<&str> = missing.iter().map(|(l, _)| l.as_str()).collect();
                tracing::info!("[GATE] Waiting for results: {}", names.join(", "));
                last_missing_count = missing.len();
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                tracing::error!("[GATE] Timed out after {:?}", elapsed);
                return Err(BenchError::SynchronizationTimeout {
                    waited: elapsed,
                    missing,
                });
            }

            let remaining = self.timeout - elapsed;
            self.sleeper
                .sleep(self.poll_interval.min(remaining), Pause::Poll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::pacing::{RecordingSleeper, ThreadSleeper};
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("target/test_gate_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn expected(dir: &std::path::Path, langs: &[&str]) -> BTreeMap<String, PathBuf> {
        langs
            .iter()
            .map(|l| (l.to_string(), dir.join(format!("{}_results.csv", l.to_lowercase()))))
            .collect()
    }

    #[test]
    fn test_returns_immediately_when_all_present() {
        let dir = scratch_dir("present");
        let exp = expected(&dir, &["C", "Rust"]);
        for path in exp.values() {
            fs::write(path, "").unwrap();
        }

        let mut gate = SyncGate::new(
            Duration::from_secs(5),
            Duration::from_secs(60),
            RecordingSleeper::new(),
        );
        let report = gate.wait_for(&exp).unwrap();
        assert_eq!(report.polls, 1);
        assert!(gate.sleeper().pauses.is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_expectation_opens_immediately() {
        let mut gate = SyncGate::new(
            Duration::from_millis(10),
            Duration::ZERO,
            RecordingSleeper::new(),
        );
        assert!(gate.wait_for(&BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_waits_until_missing_file_appears() {
        let dir = scratch_dir("appears");
        let exp = expected(&dir, &["Java", "Python"]);
        fs::write(&exp["Python"], "").unwrap();

        let late = exp["Java"].clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            fs::write(&late, "Size\n").unwrap();
        });

        let mut gate = SyncGate::new(
            Duration::from_millis(10),
            Duration::from_secs(10),
            ThreadSleeper,
        );
        let report = gate.wait_for(&exp).unwrap();
        writer.join().unwrap();

        assert!(exp["Java"].exists());
        assert!(report.polls > 1);
        assert!(report.waited >= Duration::from_millis(100));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_timeout_names_missing_language() {
        let dir = scratch_dir("timeout");
        let exp = expected(&dir, &["C", "Java"]);
        fs::write(&exp["C"], "").unwrap();

        let mut gate = SyncGate::new(
            Duration::from_millis(10),
            Duration::from_millis(60),
            ThreadSleeper,
        );
        match gate.wait_for(&exp) {
            Err(BenchError::SynchronizationTimeout { waited, missing }) => {
                assert!(waited >= Duration::from_millis(60));
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].0, "Java");
            }
            other => panic!("expected SynchronizationTimeout, got {:?}", other),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_file_passes_the_gate() {
        let dir = scratch_dir("empty_file");
        let exp = expected(&dir, &["Rust"]);
        fs::write(&exp["Rust"], "").unwrap();
        let mut gate = SyncGate::new(
            Duration::from_millis(10),
            Duration::from_millis(10),
            RecordingSleeper::new(),
        );
        assert!(gate.wait_for(&exp).is_ok());
        let _ = fs::remove_dir_all(&dir);
    }
}
