use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bun_runner_protocol::ReviewDecision;
use tokio::sync::oneshot;

/// Set to `true` to skip interactive prompting and auto-allow every action.
/// This is the only externally observable configuration knob of the core.
pub const DISABLE_NOTIFICATIONS_ENV_VAR: &str = "BUN_RUNNER_DISABLE_NOTIFICATIONS";

const DEFAULT_APPROVAL_WAIT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ApprovalRequest {
    pub description: String,
}

/// The interactive mechanism that presents a permission prompt. The
/// implementation must return promptly and deliver exactly one decision
/// through `decision_tx` (spawning its own task if the prompt blocks); a
/// dropped sender counts as a denial.
#[async_trait]
pub trait ApprovalNotifier: Send + Sync {
    async fn request_decision(
        &self,
        request: ApprovalRequest,
        decision_tx: oneshot::Sender<ReviewDecision>,
    );
}

/// Gates every externally-visible action behind one approval decision.
/// Exactly one boolean comes out of each call: a timeout, a closed channel,
/// or any notifier malfunction resolves to denied, never to approved and
/// never to an unresolved call.
pub struct ApprovalGate {
    notifier: Arc<dyn ApprovalNotifier>,
    bypass: bool,
    wait: Duration,
}

impl ApprovalGate {
    /// Reads the bypass switch from the environment; see
    /// [`DISABLE_NOTIFICATIONS_ENV_VAR`].
    pub fn new(notifier: Arc<dyn ApprovalNotifier>) -> Self {
        let bypass = std::env::var(DISABLE_NOTIFICATIONS_ENV_VAR)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        Self::with_options(notifier, bypass, DEFAULT_APPROVAL_WAIT)
    }

    pub fn with_options(notifier: Arc<dyn ApprovalNotifier>, bypass: bool, wait: Duration) -> Self {
        Self {
            notifier,
            bypass,
            wait,
        }
    }

    pub async fn request_approval(&self, description: &str) -> bool {
        if self.bypass {
            tracing::info!("auto-allowing action (notifications disabled): {description}");
            return true;
        }

        let (tx, rx) = oneshot::channel();
        self.notifier
            .request_decision(
                ApprovalRequest {
                    description: description.to_string(),
                },
                tx,
            )
            .await;

        match tokio::time::timeout(self.wait, rx).await {
            Ok(Ok(ReviewDecision::Approved)) => true,
            Ok(Ok(ReviewDecision::Denied)) => false,
            Ok(Err(_)) => {
                tracing::warn!("approval mechanism dropped the decision channel; denying");
                false
            }
            Err(_) => {
                tracing::warn!("approval request timed out; denying: {description}");
                false
            }
        }
    }
}

/// Prompts by running a configured command with the request description as
/// its final argument, interpreting exit status 0 as approval. The command is
/// detached from the gate's own wait: it runs on a spawned task and reports
/// through the decision channel.
pub struct CommandNotifier {
    argv: Vec<String>,
}

impl CommandNotifier {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl ApprovalNotifier for CommandNotifier {
    async fn request_decision(
        &self,
        request: ApprovalRequest,
        decision_tx: oneshot::Sender<ReviewDecision>,
    ) {
        let Some((program, args)) = self.argv.split_first() else {
            tracing::warn!("no notifier command configured; denying: {}", request.description);
            let _ = decision_tx.send(ReviewDecision::Denied);
            return;
        };

        let mut command = tokio::process::Command::new(program);
        command
            .args(args)
            .arg(&request.description)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        tokio::spawn(async move {
            let decision = match command.status().await {
                Ok(status) if status.success() => ReviewDecision::Approved,
                Ok(_) => ReviewDecision::Denied,
                Err(err) => {
                    tracing::warn!("failed to run notifier command: {err}");
                    ReviewDecision::Denied
                }
            };
            let _ = decision_tx.send(decision);
        });
    }
}
