use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;

use crate::exec::ExecParams;
use crate::exec::execute;

/// One named variation of the base command: the extra arguments are spliced
/// in directly after the program token (`bun --smol script.js`).
#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub name: String,
    pub args: Vec<String>,
}

impl BenchmarkConfig {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkRequest {
    pub base_command: Vec<String>,
    pub configs: Vec<BenchmarkConfig>,
    pub iterations: u32,
    pub warmup: u32,
    pub cwd: PathBuf,
    pub timeout_ms: Option<u64>,
}

/// Measured results for one configuration. Derived statistics are only
/// meaningful when at least one iteration succeeded.
#[derive(Clone, Debug, Default)]
pub struct BenchmarkSummary {
    /// Durations of successful measured iterations, in run order. Warm-up
    /// runs never appear here.
    pub durations: Vec<Duration>,
    pub failed: u32,
    pub requested: u32,
}

impl BenchmarkSummary {
    pub fn successes(&self) -> u32 {
        self.durations.len() as u32
    }

    pub fn average(&self) -> Option<Duration> {
        if self.durations.is_empty() {
            return None;
        }
        let total: Duration = self.durations.iter().sum();
        Some(total / self.durations.len() as u32)
    }

    pub fn min(&self) -> Option<Duration> {
        self.durations.iter().min().copied()
    }

    pub fn max(&self) -> Option<Duration> {
        self.durations.iter().max().copied()
    }
}

/// Runs every configuration in the order supplied: `warmup` discarded
/// iterations, then `iterations` measured ones, each through the process
/// executor with a fresh timeout. A failing iteration is counted and skipped,
/// never aborting the rest of its configuration or later configurations;
/// partial data beats an aborted run.
pub async fn run_benchmark(request: &BenchmarkRequest) -> IndexMap<String, BenchmarkSummary> {
    let mut summaries = IndexMap::new();

    for config in &request.configs {
        let mut summary = BenchmarkSummary {
            requested: request.iterations,
            ..Default::default()
        };

        for _ in 0..request.warmup {
            // Outcome and duration both discarded.
            let _ = run_iteration(request, config).await;
        }

        for _ in 0..request.iterations {
            let output = run_iteration(request, config).await;
            if output.outcome.is_success() {
                summary.durations.push(output.duration);
            } else {
                summary.failed += 1;
            }
        }

        summaries.insert(config.name.clone(), summary);
    }

    summaries
}

async fn run_iteration(
    request: &BenchmarkRequest,
    config: &BenchmarkConfig,
) -> crate::exec::ExecToolCallOutput {
    let mut command = Vec::with_capacity(request.base_command.len() + config.args.len());
    if let Some((program, rest)) = request.base_command.split_first() {
        command.push(program.clone());
        command.extend(config.args.iter().cloned());
        command.extend(rest.iter().cloned());
    }

    execute(ExecParams {
        command,
        cwd: request.cwd.clone(),
        timeout_ms: request.timeout_ms,
        env: HashMap::new(),
        stdin: None,
    })
    .await
}
