use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::error::Result;
use crate::manifest::load_manifest;
use crate::session::Session;
use crate::tools::ensure_approved;
use crate::tools::permission_message;
use crate::tools::run_resolved;
use crate::runtime::ResolvedCommand;

// Installs can resolve a whole lockfile; give them room.
const INSTALL_TIMEOUT_MS: u64 = 300_000;

#[derive(Debug, Deserialize)]
pub struct InstallArgs {
    /// Directory containing package.json.
    pub package_dir: PathBuf,
    /// Specific dependency to add; `None` installs everything the manifest
    /// lists.
    #[serde(default)]
    pub dependency: Option<String>,
}

/// Runs `bun install` (optionally for one dependency). The install command is
/// deliberately not translated: the fallback rewrite rules have no sensible
/// equivalent for it and the package manager on PATH may differ.
pub async fn install(session: &Session, args: InstallArgs) -> Result<CallToolResult> {
    let InstallArgs {
        package_dir,
        dependency,
    } = args;

    // Surfaces NotFound before prompting when there is no manifest at all.
    load_manifest(&package_dir).await?;

    let command = match &dependency {
        Some(dep) => format!("bun install {dep}"),
        None => "bun install".to_string(),
    };

    let message = permission_message(&command, &package_dir, false);
    ensure_approved(session, &message).await?;

    run_resolved(
        ResolvedCommand {
            command,
            env: Default::default(),
        },
        package_dir,
        Some(INSTALL_TIMEOUT_MS),
        None,
        "bun install executed successfully with no output",
    )
    .await
}
