//! Square `i32` matrices and their raw binary file format.
//!
//! On disk a matrix is `n * n` host-endian `i32` values in row-major order with
//! no header. The size comes from the file name convention (`A_{n}.bin`), so a
//! file whose length is not exactly `4 * n * n` bytes is rejected as corrupt.
//! Host byte order means files are only portable between machines of the same
//! endianness.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use rand::Rng;
use rand::distributions::Uniform;

use crate::error::{BenchError, BenchResult};

const ELEMENT_BYTES: usize = std::mem::size_of::<i32>();

/// Exclusive upper bound of generated element values (`[0, 10)`).
pub const VALUE_BOUND: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    size: usize,
    data: Vec<i32>,
}

impl Matrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0; size * size],
        }
    }

    /// Build from row-major data. `None` when `data.len() != size * size`.
    pub fn from_vec(size: usize, data: Vec<i32>) -> Option<Self> {
        if size.checked_mul(size) != Some(data.len()) {
            return None;
        }
        Some(Self { size, data })
    }

    /// Draw `size * size` values uniformly from `[0, VALUE_BOUND)`, row by row.
    pub fn random<R: Rng>(size: usize, rng: &mut R) -> Self {
        let dist = Uniform::new(0, VALUE_BOUND);
        let data = (0..size * size).map(|_| rng.sample(dist)).collect();
        Self { size, data }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.data[row * self.size + col]
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    /// Byte length of an `n x n` file, `None` when it does not fit in `u64`.
    pub fn expected_file_len(size: usize) -> Option<u64> {
        let n = u64::try_from(size).ok()?;
        n.checked_mul(n)?.checked_mul(ELEMENT_BYTES as u64)
    }

    fn checked_file_len(size: usize) -> BenchResult<u64> {
        Self::expected_file_len(size)
            .ok_or_else(|| BenchError::Config(format!("matrix size {} is too large", size)))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * ELEMENT_BYTES);
        for v in &self.data {
            bytes.extend_from_slice(&v.to_ne_bytes());
        }
        bytes
    }

    /// Decode a raw buffer. The buffer must hold exactly `size * size` elements.
    pub fn from_bytes(size: usize, bytes: &[u8], path: &Path) -> BenchResult<Self> {
        let expected = Self::checked_file_len(size)?;
        if bytes.len() as u64 != expected {
            return Err(BenchError::CorruptMatrix {
                path: path.to_path_buf(),
                size,
                expected_bytes: expected,
                actual_bytes: bytes.len() as u64,
            });
        }
        let data = bytes
            .chunks_exact(ELEMENT_BYTES)
            .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { size, data })
    }

    /// Read `path` as an `n x n` matrix. The file length is checked against the
    /// expected size before any bytes are read.
    pub fn read_from_file(path: &Path, size: usize) -> BenchResult<Self> {
        let io_err = |source| BenchError::MatrixIo {
            path: path.to_path_buf(),
            source,
        };
        let expected = Self::checked_file_len(size)?;
        let mut file = File::open(path).map_err(io_err)?;
        let actual = file.metadata().map_err(io_err)?.len();
        if actual != expected {
            return Err(BenchError::CorruptMatrix {
                path: path.to_path_buf(),
                size,
                expected_bytes: expected,
                actual_bytes: actual,
            });
        }
        let mut bytes = Vec::with_capacity(expected as usize);
        file.read_to_end(&mut bytes).map_err(io_err)?;
        let matrix = Self::from_bytes(size, &bytes, path)?;
        tracing::debug!("[MATRIX] Loaded {} ({}x{})", path.display(), size, size);
        Ok(matrix)
    }

    /// Write the raw form and fsync, so readers started afterwards see the
    /// complete file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }
}

/// Textbook `i, j, k` multiplication. No blocking, transposition or SIMD: the
/// benchmark compares naive baselines across languages.
///
/// Accumulation wraps like the C and Java kernels; with values in `[0, 10)`
/// it cannot overflow below `n = 26_512_000`.
pub fn naive_multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, String> {
    if a.size != b.size {
        return Err(format!(
            "shape mismatch: {}x{} * {}x{}",
            a.size, a.size, b.size, b.size
        ));
    }
    let n = a.size;
    let mut c = Matrix::zeros(n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let prod = a.data[i * n + k].wrapping_mul(b.data[k * n + j]);
                c.data[i * n + j] = c.data[i * n + j].wrapping_add(prod);
            }
        }
    }
    Ok(c)
}
