use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::error::Result;
use crate::runtime::ResolvedCommand;
use crate::session::Session;
use crate::tools::ensure_approved;
use crate::tools::ensure_positive_timeout;
use crate::tools::run_resolved;

const DEFAULT_TEST_TIMEOUT_MS: u64 = 60_000;
/// Headroom on top of the per-test timeout so the runner itself gets to
/// report before the process is killed.
const TEST_TIMEOUT_BUFFER_MS: u64 = 10_000;

#[derive(Debug, Deserialize)]
pub struct RunTestsArgs {
    /// Project directory to run the tests in.
    pub package_dir: PathBuf,
    /// Specific test file or directory.
    #[serde(default)]
    pub test_path: Option<String>,
    #[serde(default)]
    pub coverage: bool,
    #[serde(default)]
    pub watch: bool,
    /// Stop after N failures.
    #[serde(default)]
    pub bail: Option<u32>,
    /// Per-test timeout in milliseconds, forwarded to the runner.
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Runs the project's tests with `bun test`. There is no fallback-runtime
/// equivalent, so the command is used as written.
pub async fn run_tests(session: &Session, args: RunTestsArgs) -> Result<CallToolResult> {
    let RunTestsArgs {
        package_dir,
        test_path,
        coverage,
        watch,
        bail,
        timeout,
    } = args;

    ensure_positive_timeout(timeout)?;

    let mut command = "bun test".to_string();
    if let Some(test_path) = &test_path {
        command.push_str(&format!(" {test_path}"));
    }
    if coverage {
        command.push_str(" --coverage");
    }
    if watch {
        command.push_str(" --watch");
    }
    if let Some(bail) = bail {
        command.push_str(&format!(" --bail {bail}"));
    }
    if let Some(timeout) = timeout {
        command.push_str(&format!(" --timeout {timeout}"));
    }

    ensure_approved(session, &format!("Run tests: {command}")).await?;

    let process_timeout = timeout
        .map(|t| t + TEST_TIMEOUT_BUFFER_MS)
        .unwrap_or(DEFAULT_TEST_TIMEOUT_MS);

    run_resolved(
        ResolvedCommand {
            command,
            env: Default::default(),
        },
        package_dir,
        Some(process_timeout),
        None,
        "Tests completed",
    )
    .await
}
