//! Tool handlers: typed arguments in, [`CallToolResult`] out. The transport
//! layer that registers these with an RPC framework and validates argument
//! schemas lives outside this workspace.

pub mod analyze;
pub mod bench;
pub mod build;
pub mod eval;
pub mod install;
pub mod scripts;
pub mod server;
pub mod test_runner;
pub mod versions;

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use bun_runner_protocol::ContentBlock;

use crate::error::Result;
use crate::error::RunnerErr;
use crate::exec::ExecOutcome;
use crate::exec::ExecParams;
use crate::exec::ExecToolCallOutput;
use crate::exec::execute;
use crate::runtime::ResolvedCommand;
use crate::session::Session;

const SHELL: &str = "/bin/sh";

/// Wraps a resolved command string for the system shell, the form every
/// translated command line is executed in.
pub(crate) fn shell_invocation(command: &str) -> Vec<String> {
    vec![SHELL.to_string(), "-c".to_string(), command.to_string()]
}

pub(crate) fn permission_message(command: &str, cwd: &Path, has_stdin: bool) -> String {
    let mut message = format!("{command} (in {})", cwd.display());
    if has_stdin {
        message.push_str(" with provided standard input");
    }
    message
}

/// One gate per invocation; a refusal surfaces immediately, before anything
/// is spawned.
pub(crate) async fn ensure_approved(session: &Session, description: &str) -> Result<()> {
    if session.services.approval.request_approval(description).await {
        Ok(())
    } else {
        Err(RunnerErr::DeniedByUser)
    }
}

pub(crate) fn ensure_positive_timeout(timeout_ms: Option<u64>) -> Result<()> {
    match timeout_ms {
        Some(0) => Err(RunnerErr::MalformedInput(
            "timeout must be strictly positive".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Runs a command written for the preferred runtime through the resolver,
/// consulting the session's selected version.
pub(crate) async fn resolve_for_session(session: &Session, command: &str) -> ResolvedCommand {
    let selected = session.selected_version().await;
    session
        .services
        .runtime
        .resolve(command, selected.as_deref())
        .await
}

pub(crate) async fn run_resolved(
    resolved: ResolvedCommand,
    cwd: PathBuf,
    timeout_ms: Option<u64>,
    stdin: Option<String>,
    empty_message: &str,
) -> Result<CallToolResult> {
    let output = execute(ExecParams {
        command: shell_invocation(&resolved.command),
        cwd,
        timeout_ms,
        env: resolved.env,
        stdin,
    })
    .await;
    render_exec_output(output, empty_message)
}

/// Folds an execution into the caller-facing result. A non-zero exit or a
/// timeout is a reportable outcome, not the call's own failure: the captured
/// output rides along so the invoking agent can diagnose it. Only a process
/// that never started escalates as an error.
pub(crate) fn render_exec_output(
    output: ExecToolCallOutput,
    empty_message: &str,
) -> Result<CallToolResult> {
    let ExecToolCallOutput {
        outcome,
        stdout,
        stderr,
        duration,
    } = output;

    match outcome {
        ExecOutcome::SpawnFailed(reason) => Err(RunnerErr::Spawn(reason)),
        ExecOutcome::Success => {
            let mut content = vec![text_or(stdout, empty_message)];
            if !stderr.is_empty() {
                content.push(ContentBlock::text(format!("Standard Error: {stderr}")));
            }
            Ok(CallToolResult::from_blocks(content))
        }
        ExecOutcome::NonZeroExit(code) => {
            let content = vec![
                text_or(stdout, "Command returned with error code"),
                ContentBlock::text(format!(
                    "Standard Error: {stderr}\nError: exited with code {code}"
                )),
            ];
            Ok(CallToolResult::from_blocks(content))
        }
        ExecOutcome::TimedOut => {
            let content = vec![
                text_or(stdout, "Command timed out before producing output"),
                ContentBlock::text(format!(
                    "Standard Error: {stderr}\nError: timed out after {}ms",
                    duration.as_millis()
                )),
            ];
            Ok(CallToolResult::from_blocks(content))
        }
    }
}

fn text_or(stdout: String, empty_message: &str) -> ContentBlock {
    if stdout.is_empty() {
        ContentBlock::text(empty_message)
    } else {
        ContentBlock::text(stdout)
    }
}

/// Runs a fixed argv (no shell, no translation) and returns its trimmed
/// stdout on success. Shared by the version tools.
pub(crate) async fn capture_stdout(command: Vec<String>, cwd: PathBuf) -> Option<String> {
    let output = execute(ExecParams {
        command,
        cwd,
        timeout_ms: Some(10_000),
        env: HashMap::new(),
        stdin: None,
    })
    .await;
    if output.outcome.is_success() {
        Some(output.stdout.trim().to_string())
    } else {
        None
    }
}
