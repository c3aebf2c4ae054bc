use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::error::Result;
use crate::error::RunnerErr;
use crate::manifest::load_manifest;
use crate::session::Session;
use crate::tools::ensure_approved;
use crate::tools::permission_message;
use crate::tools::resolve_for_session;
use crate::tools::run_resolved;

const SCRIPT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Deserialize)]
pub struct RunScriptArgs {
    /// Directory containing package.json.
    pub package_dir: PathBuf,
    pub script_name: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub stdin: Option<String>,
}

/// Executes a named script from the project manifest with the preferred
/// runtime (`bun run <name>`), falling back per the resolver.
pub async fn run_script(session: &Session, args: RunScriptArgs) -> Result<CallToolResult> {
    let RunScriptArgs {
        package_dir,
        script_name,
        args,
        stdin,
    } = args;

    let manifest = load_manifest(&package_dir).await?;
    if !manifest.scripts.contains_key(&script_name) {
        return Err(RunnerErr::NotFound(format!(
            "Script '{script_name}' not found in package.json"
        )));
    }

    let mut base_command = format!("bun run {script_name}");
    if !args.is_empty() {
        base_command.push_str(" -- ");
        base_command.push_str(&args.join(" "));
    }

    let resolved = resolve_for_session(session, &base_command).await;
    let message = permission_message(&resolved.command, &package_dir, stdin.is_some());
    ensure_approved(session, &message).await?;

    run_resolved(
        resolved,
        package_dir,
        Some(SCRIPT_TIMEOUT_MS),
        stdin,
        "Script executed successfully with no output",
    )
    .await
}
