//! CSV I/O - canonical per-language results file
//!
//! Every language implementation writes the same 13-column schema. The
//! comparison step and the plotting collaborator depend on the header text
//! and column order, so both are fixed here.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{BenchError, BenchResult};
use crate::models::{ResultRecord, ResultsTable};
use crate::perf::MetricStats;

pub const RESULTS_HEADER: [&str; 13] = [
    "Size",
    "Matrix A File",
    "Matrix B File",
    "Mean Time (s)",
    "Median Time (s)",
    "Std Time (s)",
    "Mean CPU (%)",
    "Median CPU (%)",
    "Std CPU (%)",
    "Mean Memory (MB)",
    "Median Memory (MB)",
    "Std Memory (MB)",
    "Language",
];

// ============================================================
// Writing
// ============================================================

/// Replace `path` with the full table.
///
/// The rows go to a sibling temp file which is then renamed over the target,
/// so a concurrent reader sees either the previous file or the complete new
/// one, never an append or a half-written table.
pub fn write_results(table: &ResultsTable, path: &Path) -> BenchResult<()> {
    let io_err = |source| BenchError::ResultsIo {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp_path = temp_sibling(path);
    {
        let file = File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", RESULTS_HEADER.join(",")).map_err(io_err)?;
        for record in table.records() {
            writeln!(writer, "{}", format_row(record)).map_err(io_err)?;
        }
        writer.flush().map_err(io_err)?;
        writer.get_ref().sync_all().map_err(io_err)?;
    }
    fs::rename(&tmp_path, path).map_err(io_err)?;

    tracing::info!(
        "[STATS] Saved {} {} rows to {}",
        table.len(),
        table.language,
        path.display()
    );
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results.csv".to_string());
    path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
}

fn format_row(r: &ResultRecord) -> String {
    let cells = [
        r.size.to_string(),
        escape(&r.matrix_a_path.display().to_string()),
        escape(&r.matrix_b_path.display().to_string()),
        r.time.mean.to_string(),
        r.time.median.to_string(),
        r.time.std.to_string(),
        r.cpu.mean.to_string(),
        r.cpu.median.to_string(),
        r.cpu.std.to_string(),
        r.memory.mean.to_string(),
        r.memory.median.to_string(),
        r.memory.std.to_string(),
        escape(&r.language),
    ];
    cells.join(",")
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ============================================================
// Reading
// ============================================================

/// Load a results CSV written by any language implementation.
///
/// The header must match [`RESULTS_HEADER`] (surrounding whitespace in
/// header cells is tolerated), each row must have 13 cells, and a file
/// without rows is rejected: the synchronization gate only checks that the
/// file exists, so truncation surfaces here.
pub fn load_results(path: &Path) -> BenchResult<ResultsTable> {
    let file = File::open(path).map_err(|source| BenchError::ResultsIo {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let parse_err = |line: usize, reason: String| BenchError::ResultsParse {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut language: Option<String> = None;
    let mut records = Vec::new();
    let mut saw_header = false;

    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.map_err(|source| BenchError::ResultsIo {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_row(&line).map_err(|e| parse_err(line_num, e))?;

        if !saw_header {
            let header: Vec<&str> = cells.iter().map(|c| c.trim()).collect();
            if header != RESULTS_HEADER {
                return Err(parse_err(line_num, format!("unexpected header: {}", line)));
            }
            saw_header = true;
            continue;
        }

        let record = parse_record(&cells).map_err(|e| parse_err(line_num, e))?;
        match &language {
            None => language = Some(record.language.clone()),
            Some(lang) if *lang != record.language => {
                return Err(parse_err(
                    line_num,
                    format!("mixed languages: {} and {}", lang, record.language),
                ));
            }
            Some(_) => {}
        }
        records.push(record);
    }

    if !saw_header {
        return Err(parse_err(0, "empty file".to_string()));
    }
    let language = language.ok_or_else(|| parse_err(1, "no result rows".to_string()))?;
    Ok(ResultsTable::from_records(language, records))
}

fn parse_record(cells: &[String]) -> Result<ResultRecord, String> {
    if cells.len() != RESULTS_HEADER.len() {
        return Err(format!(
            "expected {} columns, found {}",
            RESULTS_HEADER.len(),
            cells.len()
        ));
    }
    let num = |i: usize| -> Result<f64, String> {
        cells[i]
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid {} '{}'", RESULTS_HEADER[i], cells[i]))
    };
    let size: u32 = cells[0]
        .trim()
        .parse()
        .map_err(|_| format!("invalid Size '{}'", cells[0]))?;

    Ok(ResultRecord {
        size,
        matrix_a_path: PathBuf::from(cells[1].trim()),
        matrix_b_path: PathBuf::from(cells[2].trim()),
        time: MetricStats {
            mean: num(3)?,
            median: num(4)?,
            std: num(5)?,
        },
        cpu: MetricStats {
            mean: num(6)?,
            median: num(7)?,
            std: num(8)?,
        },
        memory: MetricStats {
            mean: num(9)?,
            median: num(10)?,
            std: num(11)?,
        },
        language: cells[12].trim().to_string(),
    })
}

/// Split one line, honouring double-quoted cells.
fn split_row(line: &str) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted cell".to_string());
    }
    cells.push(cur);
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("target/test_csv_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn record(size: u32, language: &str, mean_time: f64) -> ResultRecord {
        ResultRecord {
            size,
            matrix_a_path: PathBuf::from(format!("matrices/A_{}.bin", size)),
            matrix_b_path: PathBuf::from(format!("matrices/B_{}.bin", size)),
            time: MetricStats {
                mean: mean_time,
                median: mean_time,
                std: 0.0,
            },
            cpu: MetricStats {
                mean: 99.5,
                median: 100.0,
                std: 0.25,
            },
            memory: MetricStats {
                mean: 0.0078125,
                median: 0.0,
                std: 0.01,
            },
            language: language.to_string(),
        }
    }

    #[test]
    fn test_header_is_canonical() {
        assert_eq!(
            RESULTS_HEADER.join(","),
            "Size,Matrix A File,Matrix B File,Mean Time (s),Median Time (s),Std Time (s),\
             Mean CPU (%),Median CPU (%),Std CPU (%),Mean Memory (MB),Median Memory (MB),\
             Std Memory (MB),Language"
        );
    }

    #[test]
    fn test_write_then_load_keeps_order_and_values() {
        let dir = scratch_dir("write_load");
        let path = dir.join("rust_results.csv");
        let mut table = ResultsTable::new("Rust");
        table.push(record(100, "Rust", 0.001953125));
        table.push(record(10, "Rust", 1.5e-6));
        write_results(&table, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), RESULTS_HEADER.join(","));
        assert!(lines.next().unwrap().starts_with("100,matrices/A_100.bin,"));

        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded, table);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rewrite_replaces_instead_of_appending() {
        let dir = scratch_dir("overwrite");
        let path = dir.join("c_results.csv");
        let mut first = ResultsTable::new("C");
        first.push(record(10, "C", 1.0));
        first.push(record(100, "C", 2.0));
        write_results(&first, &path).unwrap();

        let mut second = ResultsTable::new("C");
        second.push(record(10, "C", 3.0));
        write_results(&second, &path).unwrap();

        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records()[0].time.mean, 3.0);
        // no temp file left behind
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_header_with_spaces_is_accepted() {
        let dir = scratch_dir("spaced");
        let path = dir.join("java_results.csv");
        fs::write(
            &path,
            format!(
                "{}\n10,matrices/A_10.bin,matrices/B_10.bin,1,1,0,50,50,0,0,0,0,Java\n",
                RESULTS_HEADER.join(", ")
            ),
        )
        .unwrap();
        let table = load_results(&path).unwrap();
        assert_eq!(table.language, "Java");
        assert_eq!(table.records()[0].cpu.mean, 50.0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_truncated_file_fails_at_parse_time() {
        let dir = scratch_dir("truncated");
        let empty = dir.join("empty.csv");
        fs::write(&empty, "").unwrap();
        assert!(matches!(
            load_results(&empty),
            Err(BenchError::ResultsParse { .. })
        ));

        let header_only = dir.join("header_only.csv");
        fs::write(&header_only, format!("{}\n", RESULTS_HEADER.join(","))).unwrap();
        assert!(matches!(
            load_results(&header_only),
            Err(BenchError::ResultsParse { .. })
        ));

        let short_row = dir.join("short_row.csv");
        fs::write(
            &short_row,
            format!("{}\n10,matrices/A_10.bin,matrices/B_10.bin,0.1\n", RESULTS_HEADER.join(",")),
        )
        .unwrap();
        match load_results(&short_row) {
            Err(BenchError::ResultsParse { line, reason, .. }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("13 columns"), "{}", reason);
            }
            other => panic!("expected ResultsParse, got {:?}", other),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_old_header_is_rejected() {
        let dir = scratch_dir("old_header");
        let path = dir.join("python_results.csv");
        fs::write(
            &path,
            "Size,Matrix A File,Matrix B File,Mean Time (s),Median Time (s),Std Dev (s),Language\n",
        )
        .unwrap();
        let err = load_results(&path).unwrap_err();
        assert!(err.to_string().contains("unexpected header"), "{}", err);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_quoted_paths_survive() {
        let dir = scratch_dir("quoted");
        let path = dir.join("rust_results.csv");
        let mut rec = record(10, "Rust", 1.0);
        rec.matrix_a_path = PathBuf::from("odd,dir/A_10.bin");
        let mut table = ResultsTable::new("Rust");
        table.push(rec);
        write_results(&table, &path).unwrap();

        let loaded = load_results(&path).unwrap();
        assert_eq!(
            loaded.records()[0].matrix_a_path,
            PathBuf::from("odd,dir/A_10.bin")
        );
        let _ = fs::remove_dir_all(&dir);
    }
}
