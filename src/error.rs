//! Error taxonomy for the benchmark harness.
//!
//! Every variant names the file, process or matrix size it concerns so an
//! operator can tell which input or language broke a run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type BenchResult<T> = Result<T, BenchError>;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Input generation failed at {path}: {source}")]
    InputGeneration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Corrupt matrix {path}: expected {expected_bytes} bytes for {size}x{size}, found {actual_bytes}"
    )]
    CorruptMatrix {
        path: PathBuf,
        size: usize,
        expected_bytes: u64,
        actual_bytes: u64,
    },

    #[error("Matrix I/O error on {path}: {source}")]
    MatrixIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Multiplication fault for size {size} at iteration {iteration}: {reason}")]
    MultiplicationFault {
        size: usize,
        iteration: usize,
        reason: String,
    },

    #[error("Failed to spawn '{label}' ({program}): {source}")]
    ProcessSpawn {
        label: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("External process '{label}' ({program}) failed with {}", describe_exit(.code))]
    ExternalProcessFailure {
        label: String,
        program: String,
        code: Option<i32>,
    },

    #[error("Synchronization timed out after {waited:?}; still missing: {}", describe_missing(.missing))]
    SynchronizationTimeout {
        waited: Duration,
        missing: Vec<(String, PathBuf)>,
    },

    #[error("No samples collected for {language} at size {size}")]
    EmptySamples { language: String, size: usize },

    #[error("Results I/O error on {path}: {source}")]
    ResultsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed results file {path} at line {line}: {reason}")]
    ResultsParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BenchError {
    /// Errors that invalidate the whole run rather than a single size.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BenchError::InputGeneration { .. }
                | BenchError::ProcessSpawn { .. }
                | BenchError::ExternalProcessFailure { .. }
                | BenchError::Config(_)
        )
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "termination by signal".to_string(),
    }
}

fn describe_missing(missing: &[(String, PathBuf)]) -> String {
    missing
        .iter()
        .map(|(lang, path)| format!("{} ({})", lang, path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_missing_languages() {
        let err = BenchError::SynchronizationTimeout {
            waited: Duration::from_millis(250),
            missing: vec![
                ("Java".to_string(), PathBuf::from("results/java_results.csv")),
                ("C".to_string(), PathBuf::from("results/c_results.csv")),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("Java (results/java_results.csv)"), "{}", msg);
        assert!(msg.contains("C (results/c_results.csv)"), "{}", msg);
    }

    #[test]
    fn test_exit_description() {
        let err = BenchError::ExternalProcessFailure {
            label: "Python".to_string(),
            program: "python3".to_string(),
            code: Some(2),
        };
        assert!(err.to_string().contains("exit code 2"));
        assert!(err.is_fatal());

        let signalled = BenchError::ExternalProcessFailure {
            label: "C".to_string(),
            program: "./naive_c".to_string(),
            code: None,
        };
        assert!(signalled.to_string().contains("signal"));
    }

    #[test]
    fn test_per_size_errors_are_not_fatal() {
        let err = BenchError::CorruptMatrix {
            path: PathBuf::from("matrices/A_10.bin"),
            size: 10,
            expected_bytes: 400,
            actual_bytes: 396,
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("matrices/A_10.bin"));
    }
}
