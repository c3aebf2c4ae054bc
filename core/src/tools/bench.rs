use std::path::Path;
use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::bench::BenchmarkConfig;
use crate::bench::BenchmarkRequest;
use crate::bench::BenchmarkSummary;
use crate::bench::run_benchmark;
use crate::error::Result;
use crate::error::RunnerErr;
use crate::session::Session;
use crate::tools::ensure_approved;

const ITERATION_TIMEOUT_MS: u64 = 30_000;

fn default_iterations() -> u32 {
    5
}

fn default_warmup() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct BenchmarkScriptArgs {
    pub script_path: PathBuf,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_warmup")]
    pub warmup: u32,
}

/// Benchmarks a script under several runtime configurations and reports
/// per-configuration timing statistics.
pub async fn benchmark_script(
    session: &Session,
    args: BenchmarkScriptArgs,
) -> Result<CallToolResult> {
    let BenchmarkScriptArgs {
        script_path,
        iterations,
        warmup,
    } = args;

    if tokio::fs::metadata(&script_path)
        .await
        .map(|m| !m.is_file())
        .unwrap_or(true)
    {
        return Err(RunnerErr::NotFound(format!(
            "Script not found at {}",
            script_path.display()
        )));
    }

    ensure_approved(
        session,
        &format!(
            "Benchmark script: {} ({iterations} iterations)",
            script_path.display()
        ),
    )
    .await?;

    let cwd = script_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let request = BenchmarkRequest {
        base_command: vec!["bun".to_string(), script_path.display().to_string()],
        configs: vec![
            BenchmarkConfig::new("Default", Vec::new()),
            BenchmarkConfig::new("Smol Mode", vec!["--smol".to_string()]),
            // Bun enables the JIT by default; this config documents the
            // baseline under its common name.
            BenchmarkConfig::new("JIT Optimized", Vec::new()),
        ],
        iterations,
        warmup,
        cwd,
        timeout_ms: Some(ITERATION_TIMEOUT_MS),
    };

    let summaries = run_benchmark(&request).await;

    let mut text = format!("Benchmark results for: {}\n", script_path.display());
    text.push_str(&format!("Iterations: {iterations}, Warmup: {warmup}\n\n"));
    for (name, summary) in &summaries {
        text.push_str(&format!("{name}:\n"));
        text.push_str(&render_summary(summary));
        text.push('\n');
    }
    text.push_str("Recommendation: use the configuration with the best average time.\n");

    Ok(CallToolResult::text(text))
}

fn render_summary(summary: &BenchmarkSummary) -> String {
    match (summary.average(), summary.min(), summary.max()) {
        (Some(average), Some(min), Some(max)) => format!(
            "  Average: {:.2}ms\n  Min: {}ms, Max: {}ms\n  Successful runs: {}/{}\n",
            average.as_secs_f64() * 1_000.0,
            min.as_millis(),
            max.as_millis(),
            summary.successes(),
            summary.requested,
        ),
        _ => format!("  All runs failed ({} of {})\n", summary.failed, summary.requested),
    }
}
