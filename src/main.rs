//! naive_matrix_bench - benchmark orchestration entry point
//!
//! ```text
//! naive_matrix_bench [generate|native|drive|wait|all] [--env <ENV>]
//! ```
//!
//! - `generate` - write `matrices/A_{n}.bin` / `B_{n}.bin`
//! - `native`   - in-process benchmark for `benchmark.language`
//! - `drive`    - build, then run the external language benchmarks
//! - `wait`     - block until all results exist, then write the comparison
//! - `all`      - generate -> drive -> native -> wait (default)
//!
//! Configuration comes from `config/{env}.yaml` (default `dev`).

use anyhow::{Context, Result, bail};

use naive_matrix_bench::bench::pacing::ThreadSleeper;
use naive_matrix_bench::bench::sampler::ProcessSampler;
use naive_matrix_bench::config::AppConfig;
use naive_matrix_bench::layout::BenchLayout;
use naive_matrix_bench::pipeline_runner::{
    await_and_compare, drive_external, generate_inputs, run_native_benchmark,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Generate,
    Native,
    Drive,
    Wait,
    All,
}

fn get_mode() -> Result<Mode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--env" | "-e" => i += 2,
            "generate" => return Ok(Mode::Generate),
            "native" => return Ok(Mode::Native),
            "drive" => return Ok(Mode::Drive),
            "wait" => return Ok(Mode::Wait),
            "all" => return Ok(Mode::All),
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(Mode::All)
}

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn main() -> Result<()> {
    let mode = get_mode()?;
    let env = get_env();
    let config = AppConfig::load(&env).with_context(|| format!("loading config '{}'", env))?;
    let _log_guard = naive_matrix_bench::logging::init_logging(&config);

    tracing::info!("Starting benchmark in {:?} mode (env={})", mode, env);
    let layout = BenchLayout::from_config(&config.dirs);

    if matches!(mode, Mode::Generate | Mode::All) {
        generate_inputs(&config.benchmark, &layout).context("matrix generation failed")?;
    }

    if matches!(mode, Mode::Drive | Mode::All) {
        let reports =
            drive_external(&config, &layout).context("external benchmark sequence failed")?;
        for r in &reports {
            tracing::info!(
                "[DRIVER] {:?} {}: {:.3}s",
                r.kind,
                r.label,
                r.wall_time.as_secs_f64()
            );
        }
    }

    if matches!(mode, Mode::Native | Mode::All) {
        let sampler = ProcessSampler::new().context("initializing process sampler")?;
        let summary = run_native_benchmark(&config.benchmark, &layout, sampler, ThreadSleeper)
            .with_context(|| format!("{} benchmark failed", config.benchmark.language))?;
        for (size, reason) in &summary.failed {
            tracing::warn!("[RUN] Size {} skipped: {}", size, reason);
        }
        println!(
            "✅ {} results saved to {}",
            summary.language,
            summary.output.display()
        );
    }

    if matches!(mode, Mode::Wait | Mode::All) {
        let (gate, report) = await_and_compare(&config, &layout, ThreadSleeper)
            .context("comparison stage failed")?;
        println!(
            "✅ Compared {} language(s) over {} size(s) after waiting {:.1}s",
            report.languages.len(),
            report.sizes.len(),
            gate.waited.as_secs_f64()
        );
    }

    Ok(())
}
