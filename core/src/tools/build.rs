use std::path::Path;
use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::error::Result;
use crate::error::RunnerErr;
use crate::session::Session;
use crate::tools::ensure_approved;
use crate::tools::resolve_for_session;
use crate::tools::run_resolved;

const BUILD_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    Browser,
    Bun,
    Node,
}

impl BuildTarget {
    fn as_str(self) -> &'static str {
        match self {
            BuildTarget::Browser => "browser",
            BuildTarget::Bun => "bun",
            BuildTarget::Node => "node",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildArgs {
    pub entry_point: PathBuf,
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    #[serde(default)]
    pub target: Option<BuildTarget>,
    #[serde(default)]
    pub minify: bool,
    #[serde(default)]
    pub sourcemap: bool,
    #[serde(default)]
    pub splitting: bool,
}

/// Bundles an entry point with `bun build` (or the fallback bundler when bun
/// is absent).
pub async fn build(session: &Session, args: BuildArgs) -> Result<CallToolResult> {
    let BuildArgs {
        entry_point,
        out_dir,
        target,
        minify,
        sourcemap,
        splitting,
    } = args;

    if tokio::fs::metadata(&entry_point)
        .await
        .map(|m| !m.is_file())
        .unwrap_or(true)
    {
        return Err(RunnerErr::NotFound(format!(
            "Entry point not found at {}",
            entry_point.display()
        )));
    }

    let mut base_command = format!("bun build {}", entry_point.display());
    if let Some(out_dir) = &out_dir {
        base_command.push_str(&format!(" --outdir {}", out_dir.display()));
    }
    if let Some(target) = target {
        base_command.push_str(&format!(" --target {}", target.as_str()));
    }
    if minify {
        base_command.push_str(" --minify");
    }
    if sourcemap {
        base_command.push_str(" --sourcemap");
    }
    if splitting {
        base_command.push_str(" --splitting");
    }

    let resolved = resolve_for_session(session, &base_command).await;
    ensure_approved(session, &format!("Build project: {}", resolved.command)).await?;

    let cwd = entry_point
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    run_resolved(
        resolved,
        cwd,
        Some(BUILD_TIMEOUT_MS),
        None,
        "Build completed successfully",
    )
    .await
}
