//! Process resource sampling.
//!
//! The runner only sees [`ResourceSampler`]. [`ProcessSampler`] reads the
//! current process through `sysinfo`; [`FixedSampler`] replays scripted
//! readings for tests.

use std::collections::VecDeque;

use sysinfo::{Pid, System};

use crate::error::{BenchError, BenchResult};

/// RSS reading for a process entry that could not be read.
pub const RSS_UNAVAILABLE: u64 = u64::MAX;

pub trait ResourceSampler {
    /// CPU utilization of this process since the previous call, in percent
    /// (may exceed 100 on multi-core hosts).
    fn cpu_percent(&mut self) -> f64;

    /// Resident set size of this process in bytes, as of the latest
    /// `cpu_percent` call. Must not disturb the CPU measurement window.
    /// [`RSS_UNAVAILABLE`] when the process could not be read.
    fn memory_rss_bytes(&mut self) -> u64;
}

/// Samples the running process via `sysinfo`.
///
/// `sysinfo` computes CPU usage as the delta between two process refreshes,
/// and every refresh restarts that window. Only `cpu_percent` refreshes; the
/// RSS captured by that same refresh is what `memory_rss_bytes` returns.
pub struct ProcessSampler {
    system: System,
    pid: Pid,
    rss: u64,
}

impl ProcessSampler {
    pub fn new() -> BenchResult<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| BenchError::Config(format!("cannot resolve current pid: {}", e)))?;
        let mut sampler = Self {
            system: System::new(),
            pid,
            rss: RSS_UNAVAILABLE,
        };
        sampler.refresh();
        Ok(sampler)
    }

    fn refresh(&mut self) -> f64 {
        // Process usage is scaled against global CPU time, keep it current.
        self.system.refresh_cpu();
        self.system.refresh_process(self.pid);
        match self.system.process(self.pid) {
            Some(p) => {
                self.rss = p.memory();
                p.cpu_usage() as f64
            }
            None => {
                self.rss = RSS_UNAVAILABLE;
                f64::NAN
            }
        }
    }
}

impl ResourceSampler for ProcessSampler {
    fn cpu_percent(&mut self) -> f64 {
        self.refresh()
    }

    fn memory_rss_bytes(&mut self) -> u64 {
        self.rss
    }
}

/// Replays queued readings; once a queue is exhausted the last value repeats.
#[derive(Debug, Clone, Default)]
pub struct FixedSampler {
    cpu: VecDeque<f64>,
    rss: VecDeque<u64>,
    last_cpu: f64,
    last_rss: u64,
    pub cpu_calls: usize,
    pub rss_calls: usize,
}

impl FixedSampler {
    pub fn new(cpu: impl IntoIterator<Item = f64>, rss: impl IntoIterator<Item = u64>) -> Self {
        Self {
            cpu: cpu.into_iter().collect(),
            rss: rss.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Always reports the same CPU and RSS.
    pub fn constant(cpu: f64, rss: u64) -> Self {
        Self {
            last_cpu: cpu,
            last_rss: rss,
            ..Default::default()
        }
    }
}

impl ResourceSampler for FixedSampler {
    fn cpu_percent(&mut self) -> f64 {
        self.cpu_calls += 1;
        if let Some(v) = self.cpu.pop_front() {
            self.last_cpu = v;
        }
        self.last_cpu
    }

    fn memory_rss_bytes(&mut self) -> u64 {
        self.rss_calls += 1;
        if let Some(v) = self.rss.pop_front() {
            self.last_rss = v;
        }
        self.last_rss
    }
}
