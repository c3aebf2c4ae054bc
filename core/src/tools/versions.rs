use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::error::Result;
use crate::error::RunnerErr;
use crate::session::Session;
use crate::tools::capture_stdout;

fn bun_argv(program: &str, flag: &str) -> Vec<String> {
    vec![program.to_string(), flag.to_string()]
}

/// Reports the version (and revision, when the binary supports it) of the
/// runtime scripts will execute with. Read-only; not gated.
pub async fn get_version(_session: &Session) -> Result<CallToolResult> {
    let version = capture_stdout(bun_argv("bun", "--version"), PathBuf::from("."))
        .await
        .ok_or_else(|| RunnerErr::NotFound("bun is not installed or not on PATH".to_string()))?;

    let mut text = format!("Bun version: {version}");
    // Older binaries do not know --revision; silently skip it.
    if let Some(revision) = capture_stdout(bun_argv("bun", "--revision"), PathBuf::from(".")).await
    {
        text.push_str(&format!("\nRevision: {revision}"));
    }

    Ok(CallToolResult::text(text))
}

/// Enumerates every `bun` on the PATH and probes each one for its version.
pub async fn list_versions(_session: &Session) -> Result<CallToolResult> {
    let system_version = capture_stdout(bun_argv("bun", "--version"), PathBuf::from("."))
        .await
        .ok_or_else(|| RunnerErr::NotFound("bun is not installed or not on PATH".to_string()))?;

    let mut text = format!("System Bun version: {system_version}\n");

    let installations: Vec<PathBuf> = which::which_all("bun")
        .map(Iterator::collect)
        .unwrap_or_default();

    let mut probed = Vec::with_capacity(installations.len());
    for path in installations {
        let display = path.display().to_string();
        let version = capture_stdout(bun_argv(&display, "--version"), PathBuf::from(".")).await;
        probed.push((display, version));
    }
    text.push_str(&render_installations(&probed));

    Ok(CallToolResult::text(text))
}

/// Every path enumerated from the PATH is listed with its probed version,
/// even when there is only one; the single-installation line is reserved for
/// the case where enumeration itself came up empty.
fn render_installations(probed: &[(String, Option<String>)]) -> String {
    if probed.is_empty() {
        return "\nSingle Bun installation detected\n".to_string();
    }

    let mut text = String::from("\nBun installations found:\n");
    for (path, version) in probed {
        match version {
            Some(version) => text.push_str(&format!("{path}: {version}\n")),
            None => text.push_str(&format!("{path}: version unknown\n")),
        }
    }
    text
}

#[derive(Debug, Deserialize)]
pub struct SelectVersionArgs {
    /// "system" clears the selection; otherwise a version that must match an
    /// installed binary.
    pub version: String,
}

/// Records which runtime version subsequent commands should target. The
/// selection is session state only; the resolver applies it at translation
/// time.
pub async fn select_version(session: &Session, args: SelectVersionArgs) -> Result<CallToolResult> {
    let SelectVersionArgs { version } = args;

    if version == "system" {
        session.set_selected_version(None).await;
        return Ok(CallToolResult::text(
            "Using system Bun version for subsequent executions.",
        ));
    }

    let current = capture_stdout(bun_argv("bun", "--version"), PathBuf::from("."))
        .await
        .ok_or_else(|| RunnerErr::NotFound("bun is not installed or not on PATH".to_string()))?;

    if version == "latest" || version == current {
        session.set_selected_version(Some(version.clone())).await;
        Ok(CallToolResult::text(format!(
            "Selected Bun version: {version} (current: {current})"
        )))
    } else {
        Err(RunnerErr::NotFound(format!(
            "Version {version} not found. Current version: {current}. \
             Consider a Bun version manager for multiple versions."
        )))
    }
}
