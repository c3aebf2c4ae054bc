use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::error::Result;
use crate::error::RunnerErr;
use crate::registry::StopResult;
use crate::session::Session;
use crate::tools::ensure_approved;
use crate::tools::permission_message;
use crate::tools::resolve_for_session;
use crate::tools::shell_invocation;

#[derive(Debug, Deserialize)]
pub struct StartServerArgs {
    /// The server command as written for the preferred runtime, e.g.
    /// `bun run dev`.
    pub command: String,
    pub cwd: PathBuf,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Starts a long-running server-style process and registers it so later
/// calls can enumerate or stop it.
pub async fn start_server(session: &Session, args: StartServerArgs) -> Result<CallToolResult> {
    let StartServerArgs { command, cwd, port } = args;

    let resolved = resolve_for_session(session, &command).await;
    let message = format!(
        "Start server: {}",
        permission_message(&resolved.command, &cwd, false)
    );
    ensure_approved(session, &message).await?;

    let info = session
        .services
        .registry
        .start(shell_invocation(&resolved.command), cwd, resolved.env, port)
        .await?;

    let mut text = format!("Started server {} ({})", info.id, info.command);
    if let Some(port) = info.port {
        text.push_str(&format!(" on port {port}"));
    }
    Ok(CallToolResult::text(text))
}

/// Lists every tracked server with its reconciled status. Read-only; not
/// gated.
pub async fn list_servers(session: &Session) -> Result<CallToolResult> {
    let servers = session.services.registry.list().await;
    if servers.is_empty() {
        return Ok(CallToolResult::text("No servers running"));
    }

    let mut text = String::new();
    for info in servers {
        text.push_str(&format!(
            "{} [{}] {} (in {}, started {})",
            info.id,
            info.status.as_str(),
            info.command,
            info.cwd.display(),
            info.started_at.to_rfc3339(),
        ));
        if let Some(port) = info.port {
            text.push_str(&format!(" port {port}"));
        }
        if let Some(code) = info.exit_code {
            text.push_str(&format!(" exit code {code}"));
        }
        text.push('\n');
    }
    Ok(CallToolResult::text(text))
}

#[derive(Debug, Deserialize)]
pub struct StopServerArgs {
    pub id: String,
}

/// Stops a tracked server. Idempotent: stopping an already-stopped server
/// reports its existing terminal status.
pub async fn stop_server(session: &Session, args: StopServerArgs) -> Result<CallToolResult> {
    let StopServerArgs { id } = args;

    ensure_approved(session, &format!("Stop server: {id}")).await?;

    match session.services.registry.stop(&id).await {
        StopResult::Stopped(status) => Ok(CallToolResult::text(format!(
            "Stopped server {id} (status: {})",
            status.as_str()
        ))),
        StopResult::AlreadyStopped(status) => Ok(CallToolResult::text(format!(
            "Server {id} was already stopped (status: {})",
            status.as_str()
        ))),
        StopResult::NotFound => Err(RunnerErr::NotFound(format!("No server with id {id}"))),
    }
}
