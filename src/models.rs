//! Result rows and tables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::perf::MetricStats;

/// One row of a language's results table: the statistics of every measured
/// iteration at one matrix size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub size: u32,
    pub matrix_a_path: PathBuf,
    pub matrix_b_path: PathBuf,
    pub time: MetricStats,
    pub cpu: MetricStats,
    pub memory: MetricStats,
    pub language: String,
}

/// All records of one language for one run, in the order the sizes were
/// tested. Written to disk in full; a rerun replaces the file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultsTable {
    pub language: String,
    records: Vec<ResultRecord>,
}

impl ResultsTable {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ResultRecord) {
        debug_assert_eq!(record.language, self.language);
        self.records.push(record);
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record_for_size(&self, size: u32) -> Option<&ResultRecord> {
        self.records.iter().find(|r| r.size == size)
    }

    pub(crate) fn from_records(language: String, records: Vec<ResultRecord>) -> Self {
        Self { language, records }
    }
}
