use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::error::Result;
use crate::error::RunnerErr;
use crate::session::Session;
use crate::tools::ensure_approved;
use crate::tools::ensure_positive_timeout;
use crate::tools::resolve_for_session;
use crate::tools::run_resolved;

const DEFAULT_EVAL_TIMEOUT_MS: u64 = 30_000;
/// How much of the snippet shows up in the permission prompt.
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct EvalArgs {
    /// JavaScript/TypeScript source to execute with `bun -e`.
    pub code: String,
    #[serde(default)]
    pub eval_directory: Option<PathBuf>,
    #[serde(default)]
    pub stdin: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Extra runtime flags, e.g. `--smol`.
    #[serde(default)]
    pub bun_args: Vec<String>,
}

/// Executes a code snippet directly with the runtime's eval flag.
pub async fn eval_code(session: &Session, args: EvalArgs) -> Result<CallToolResult> {
    let EvalArgs {
        code,
        eval_directory,
        stdin,
        timeout,
        bun_args,
    } = args;

    ensure_positive_timeout(timeout)?;

    let quoted = shlex::try_quote(&code)
        .map_err(|err| RunnerErr::MalformedInput(format!("code is not shell-safe: {err}")))?;
    let mut base_command = String::from("bun ");
    for arg in &bun_args {
        base_command.push_str(arg);
        base_command.push(' ');
    }
    base_command.push_str(&format!("-e {quoted}"));

    let cwd = match eval_directory {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let resolved = resolve_for_session(session, &base_command).await;

    let mut preview: String = code.chars().take(PREVIEW_CHARS).collect();
    if code.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    let mut message = format!("Execute code: {preview} (in {})", cwd.display());
    if stdin.is_some() {
        message.push_str(" with provided standard input");
    }
    ensure_approved(session, &message).await?;

    run_resolved(
        resolved,
        cwd,
        Some(timeout.unwrap_or(DEFAULT_EVAL_TIMEOUT_MS)),
        stdin,
        "Code executed successfully with no output",
    )
    .await
}
