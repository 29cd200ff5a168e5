//! Directory layout and file naming conventions shared by every language.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DirsConfig;
use crate::error::{BenchError, BenchResult};

pub fn matrix_a_path(matrix_dir: &Path, size: usize) -> PathBuf {
    matrix_dir.join(format!("A_{}.bin", size))
}

pub fn matrix_b_path(matrix_dir: &Path, size: usize) -> PathBuf {
    matrix_dir.join(format!("B_{}.bin", size))
}

/// `results/{language_lowercase}_results.csv`
pub fn results_csv_path(results_dir: &Path, language: &str) -> PathBuf {
    results_dir.join(format!("{}_results.csv", language.trim().to_lowercase()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchLayout {
    pub matrix_dir: PathBuf,
    pub results_dir: PathBuf,
    pub graphs_dir: PathBuf,
}

impl BenchLayout {
    pub fn from_config(dirs: &DirsConfig) -> Self {
        Self {
            matrix_dir: dirs.matrix_dir.clone(),
            results_dir: dirs.results_dir.clone(),
            graphs_dir: dirs.graphs_dir.clone(),
        }
    }

    /// All three directories under one root (used by tests and ad-hoc runs).
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            matrix_dir: root.join("matrices"),
            results_dir: root.join("results"),
            graphs_dir: root.join("graphs"),
        }
    }

    /// Create any missing directory. Failure is fatal to the run.
    pub fn ensure(&self) -> BenchResult<()> {
        for dir in [&self.matrix_dir, &self.results_dir, &self.graphs_dir] {
            fs::create_dir_all(dir).map_err(|source| BenchError::InputGeneration {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn results_csv(&self, language: &str) -> PathBuf {
        results_csv_path(&self.results_dir, language)
    }

    /// Expected results file of every language, keyed by language label.
    pub fn expected_results(&self, languages: &[String]) -> BTreeMap<String, PathBuf> {
        languages
            .iter()
            .map(|lang| (lang.clone(), self.results_csv(lang)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_conventions() {
        let dir = Path::new("matrices");
        assert_eq!(matrix_a_path(dir, 100), PathBuf::from("matrices/A_100.bin"));
        assert_eq!(matrix_b_path(dir, 10_000), PathBuf::from("matrices/B_10000.bin"));
        assert_eq!(
            results_csv_path(Path::new("results"), "Python"),
            PathBuf::from("results/python_results.csv")
        );
    }

    #[test]
    fn test_expected_results_is_sorted_by_language() {
        let layout = BenchLayout::under("run");
        let expected =
            layout.expected_results(&["Rust".to_string(), "C".to_string(), "Java".to_string()]);
        let keys: Vec<&str> = expected.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["C", "Java", "Rust"]);
        assert_eq!(expected["Java"], PathBuf::from("run/results/java_results.csv"));
    }

    #[test]
    fn test_ensure_creates_all_directories() {
        let root = PathBuf::from(format!("target/test_layout_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let layout = BenchLayout::under(&root);
        layout.ensure().unwrap();
        assert!(layout.matrix_dir.is_dir());
        assert!(layout.results_dir.is_dir());
        assert!(layout.graphs_dir.is_dir());
        // idempotent
        layout.ensure().unwrap();
        let _ = fs::remove_dir_all(&root);
    }
}
