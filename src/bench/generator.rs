//! Deterministic Matrix Generator
//!
//! Writes `A_{n}.bin` and `B_{n}.bin` for every requested size. A single
//! seeded generator is created per call and consumed in a fixed order (for
//! each size in list order: all of A, then all of B), so the same seed and
//! size list always reproduce byte-identical files. The generator never
//! outlives the call.

use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{BenchError, BenchResult};
use crate::layout;
use crate::matrix::Matrix;

/// Paths written for one size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPair {
    pub size: usize,
    pub matrix_a: PathBuf,
    pub matrix_b: PathBuf,
}

/// Generate and persist the input matrices.
///
/// Any directory or write failure aborts with [`BenchError::InputGeneration`];
/// nothing downstream may run on a partial set of inputs.
pub fn generate_matrices(
    sizes: &[usize],
    seed: u64,
    matrix_dir: &Path,
) -> BenchResult<Vec<GeneratedPair>> {
    fs::create_dir_all(matrix_dir).map_err(|source| BenchError::InputGeneration {
        path: matrix_dir.to_path_buf(),
        source,
    })?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut generated = Vec::with_capacity(sizes.len());

    for &size in sizes {
        tracing::info!("[GEN] Generating matrices of size {}x{}", size, size);

        let matrix_a = Matrix::random(size, &mut rng);
        let matrix_b = Matrix::random(size, &mut rng);

        let pair = GeneratedPair {
            size,
            matrix_a: layout::matrix_a_path(matrix_dir, size),
            matrix_b: layout::matrix_b_path(matrix_dir, size),
        };
        write(&matrix_a, &pair.matrix_a)?;
        write(&matrix_b, &pair.matrix_b)?;

        tracing::info!(
            "[GEN] Saved {} and {}",
            pair.matrix_a.display(),
            pair.matrix_b.display()
        );
        generated.push(pair);
    }

    tracing::info!(
        "[GEN] All {} matrix pairs generated (seed={})",
        generated.len(),
        seed
    );
    Ok(generated)
}

fn write(matrix: &Matrix, path: &Path) -> BenchResult<()> {
    matrix
        .write_to_file(path)
        .map_err(|source| BenchError::InputGeneration {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("target/test_gen_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_same_seed_is_byte_identical() {
        let first = scratch_dir("det_a");
        let second = scratch_dir("det_b");

        generate_matrices(&[4, 7], 1, &first).unwrap();
        generate_matrices(&[4, 7], 1, &second).unwrap();

        for name in ["A_4.bin", "B_4.bin", "A_7.bin", "B_7.bin"] {
            let x = fs::read(first.join(name)).unwrap();
            let y = fs::read(second.join(name)).unwrap();
            assert_eq!(x, y, "{} differs between runs", name);
        }
        let _ = fs::remove_dir_all(&first);
        let _ = fs::remove_dir_all(&second);
    }

    #[test]
    fn test_a_and_b_are_independent_draws() {
        let dir = scratch_dir("indep");
        generate_matrices(&[16], 3, &dir).unwrap();
        let a = fs::read(dir.join("A_16.bin")).unwrap();
        let b = fs::read(dir.join("B_16.bin")).unwrap();
        assert_ne!(a, b);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_different_seed_differs() {
        let first = scratch_dir("seed_1");
        let second = scratch_dir("seed_2");
        generate_matrices(&[8], 1, &first).unwrap();
        generate_matrices(&[8], 2, &second).unwrap();
        assert_ne!(
            fs::read(first.join("A_8.bin")).unwrap(),
            fs::read(second.join("A_8.bin")).unwrap()
        );
        let _ = fs::remove_dir_all(&first);
        let _ = fs::remove_dir_all(&second);
    }

    #[test]
    fn test_consumption_order_follows_size_list() {
        // The first size's A matrix is the first thing drawn from the stream,
        // so it must match a standalone draw with the same seed.
        let dir = scratch_dir("order");
        generate_matrices(&[5, 3], 9, &dir).unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let expected_a5 = Matrix::random(5, &mut rng);
        let expected_b5 = Matrix::random(5, &mut rng);
        let expected_a3 = Matrix::random(3, &mut rng);

        assert_eq!(Matrix::read_from_file(&dir.join("A_5.bin"), 5).unwrap(), expected_a5);
        assert_eq!(Matrix::read_from_file(&dir.join("B_5.bin"), 5).unwrap(), expected_b5);
        assert_eq!(Matrix::read_from_file(&dir.join("A_3.bin"), 3).unwrap(), expected_a3);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_shape_integrity() {
        let dir = scratch_dir("shape");
        let pairs = generate_matrices(&[1, 10, 33], 1, &dir).unwrap();
        assert_eq!(pairs.len(), 3);
        for pair in &pairs {
            for path in [&pair.matrix_a, &pair.matrix_b] {
                let len = fs::metadata(path).unwrap().len();
                assert_eq!(len, 4 * (pair.size * pair.size) as u64);
                let m = Matrix::read_from_file(path, pair.size).unwrap();
                assert_eq!(m.size(), pair.size);
            }
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unwritable_directory_is_input_generation_error() {
        let dir = scratch_dir("blocked");
        fs::create_dir_all(dir.parent().unwrap()).unwrap();
        // A regular file where the directory should go
        fs::write(&dir, b"not a directory").unwrap();

        let err = generate_matrices(&[2], 1, &dir).unwrap_err();
        assert!(matches!(err, BenchError::InputGeneration { .. }));
        assert!(err.is_fatal());
        let _ = fs::remove_file(&dir);
    }
}
