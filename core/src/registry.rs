use std::collections::HashMap;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use tokio::process::Child;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::error::RunnerErr;
use crate::spawn::kill_child_process_group;

use std::io;
use std::process::Stdio;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Starting,
    Running,
    Stopped,
    Failed,
}

impl ServerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ServerStatus::Stopped | ServerStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServerStatus::Starting => "starting",
            ServerStatus::Running => "running",
            ServerStatus::Stopped => "stopped",
            ServerStatus::Failed => "failed",
        }
    }
}

/// Caller-visible snapshot of a tracked server. The live process handle never
/// leaves the registry.
#[derive(Clone, Debug, Serialize)]
pub struct ServerInfo {
    pub id: String,
    pub command: String,
    pub cwd: PathBuf,
    pub port: Option<u16>,
    pub status: ServerStatus,
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
}

struct ManagedServer {
    info: ServerInfo,
    // None once the process has been reaped.
    child: Option<Child>,
}

impl ManagedServer {
    /// Folds an observed exit into the stored status so a stale `Running`
    /// entry is never surfaced. Explicitly-stopped entries keep `Stopped`.
    fn reconcile(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(exit_status)) => {
                self.info.exit_code = exit_status.code();
                self.info.status = if exit_status.success() {
                    ServerStatus::Stopped
                } else {
                    ServerStatus::Failed
                };
                self.child = None;
            }
            Ok(None) => {
                if self.info.status == ServerStatus::Starting {
                    self.info.status = ServerStatus::Running;
                }
            }
            Err(err) => {
                tracing::warn!("failed to poll server {}: {err}", self.info.id);
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum StopResult {
    /// The process group was terminated by this call.
    Stopped(ServerStatus),
    /// The handle was already terminal; reports the existing status.
    AlreadyStopped(ServerStatus),
    NotFound,
}

/// Tracks server-style processes beyond the tool call that started them.
/// Sole owner of every child handle: registration, status reconciliation,
/// and termination all happen under one lock so a stop in progress cannot
/// race a concurrent list into returning a handle being torn down.
#[derive(Default)]
pub struct ServerRegistry {
    servers: Mutex<HashMap<String, ManagedServer>>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a server process in its own process group and registers it.
    /// Stdout/stderr go to the null device: an unread pipe would stall the
    /// server once the kernel buffer fills.
    pub async fn start(
        &self,
        command: Vec<String>,
        cwd: PathBuf,
        extra_env: HashMap<String, String>,
        port: Option<u16>,
    ) -> Result<ServerInfo> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| RunnerErr::Spawn("command is empty".to_string()))?;

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .current_dir(&cwd)
            .envs(&extra_env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|err| RunnerErr::Spawn(err.to_string()))?;

        let info = ServerInfo {
            id: format!("server-{}", Uuid::new_v4()),
            command: command.join(" "),
            cwd,
            port,
            status: ServerStatus::Starting,
            exit_code: None,
            started_at: Utc::now(),
        };

        let mut servers = self.servers.lock().await;
        servers.insert(
            info.id.clone(),
            ManagedServer {
                info: info.clone(),
                child: Some(child),
            },
        );
        Ok(info)
    }

    pub async fn get(&self, id: &str) -> Option<ServerInfo> {
        let mut servers = self.servers.lock().await;
        let entry = servers.get_mut(id)?;
        entry.reconcile();
        Some(entry.info.clone())
    }

    /// Snapshots every tracked server, oldest first.
    pub async fn list(&self) -> Vec<ServerInfo> {
        let mut servers = self.servers.lock().await;
        let mut infos: Vec<ServerInfo> = servers
            .values_mut()
            .map(|entry| {
                entry.reconcile();
                entry.info.clone()
            })
            .collect();
        infos.sort_by_key(|info| info.started_at);
        infos
    }

    /// Terminates the server's process group and waits for the child to be
    /// reaped. Idempotent: a handle that is already terminal is left alone
    /// and its existing status reported back.
    pub async fn stop(&self, id: &str) -> StopResult {
        let mut servers = self.servers.lock().await;
        let Some(entry) = servers.get_mut(id) else {
            return StopResult::NotFound;
        };

        entry.reconcile();
        if entry.info.status.is_terminal() {
            return StopResult::AlreadyStopped(entry.info.status);
        }

        if let Some(mut child) = entry.child.take() {
            if let Err(err) = terminate_child(&mut child).await {
                tracing::warn!("failed to terminate server {id}: {err}");
            }
        }
        entry.info.status = ServerStatus::Stopped;
        StopResult::Stopped(ServerStatus::Stopped)
    }

    /// Drops a terminal entry from the mapping. Running entries are kept so
    /// the only place a live handle can be torn down remains `stop`.
    pub async fn remove(&self, id: &str) -> bool {
        let mut servers = self.servers.lock().await;
        let Some(entry) = servers.get_mut(id) else {
            return false;
        };
        entry.reconcile();
        if entry.info.status.is_terminal() {
            servers.remove(id);
            true
        } else {
            false
        }
    }
}

async fn terminate_child(child: &mut Child) -> io::Result<()> {
    kill_child_process_group(child)?;
    child.start_kill()?;
    child.wait().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_unknown_id_reports_not_found() {
        let registry = ServerRegistry::new();
        assert_eq!(registry.stop("server-unknown").await, StopResult::NotFound);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let registry = ServerRegistry::new();
        assert!(registry.get("server-unknown").await.is_none());
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let registry = ServerRegistry::new();
        let result = registry
            .start(Vec::new(), PathBuf::from("."), HashMap::new(), None)
            .await;
        assert!(matches!(result, Err(RunnerErr::Spawn(_))));
    }
}
