use std::sync::Arc;

use tokio::sync::Mutex;

use crate::approval::ApprovalGate;
use crate::approval::ApprovalNotifier;
use crate::registry::ServerRegistry;
use crate::runtime::RuntimeProfile;

/// Everything a tool invocation needs that outlives a single call. The
/// selected-version preference and the runtime-availability cache live here
/// as explicit session state rather than process-wide ambient variables, so
/// concurrent sessions stay isolated.
pub(crate) struct SessionServices {
    pub(crate) runtime: RuntimeProfile,
    pub(crate) selected_version: Mutex<Option<String>>,
    pub(crate) registry: ServerRegistry,
    pub(crate) approval: ApprovalGate,
}

pub struct Session {
    pub(crate) services: SessionServices,
}

impl Session {
    /// A session with the default runtime probe and an approval gate whose
    /// bypass switch comes from the environment.
    pub fn new(notifier: Arc<dyn ApprovalNotifier>) -> Self {
        Self::with_parts(RuntimeProfile::new(), ApprovalGate::new(notifier))
    }

    pub fn with_parts(runtime: RuntimeProfile, approval: ApprovalGate) -> Self {
        Self {
            services: SessionServices {
                runtime,
                selected_version: Mutex::new(None),
                registry: ServerRegistry::new(),
                approval,
            },
        }
    }

    pub fn runtime(&self) -> &RuntimeProfile {
        &self.services.runtime
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.services.registry
    }

    /// `None` means "use whatever the resolver finds on the system path."
    pub async fn selected_version(&self) -> Option<String> {
        self.services.selected_version.lock().await.clone()
    }

    /// Accepts the literal value supplied; validating it against installed
    /// versions is the resolver's concern at translation time.
    pub async fn set_selected_version(&self, version: Option<String>) {
        *self.services.selected_version.lock().await = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::ApprovalGate;
    use crate::approval::ApprovalRequest;
    use async_trait::async_trait;
    use bun_runner_protocol::ReviewDecision;
    use std::time::Duration;
    use tokio::sync::oneshot;

    struct DenyAll;

    #[async_trait]
    impl crate::approval::ApprovalNotifier for DenyAll {
        async fn request_decision(
            &self,
            _request: ApprovalRequest,
            decision_tx: oneshot::Sender<ReviewDecision>,
        ) {
            let _ = decision_tx.send(ReviewDecision::Denied);
        }
    }

    fn test_session() -> Session {
        Session::with_parts(
            RuntimeProfile::preset(true),
            ApprovalGate::with_options(Arc::new(DenyAll), false, Duration::from_secs(1)),
        )
    }

    #[tokio::test]
    async fn version_state_starts_empty() {
        let session = test_session();
        assert_eq!(session.selected_version().await, None);
    }

    #[tokio::test]
    async fn version_state_round_trips() {
        let session = test_session();
        session
            .set_selected_version(Some("1.1.30".to_string()))
            .await;
        assert_eq!(session.selected_version().await.as_deref(), Some("1.1.30"));
        session.set_selected_version(None).await;
        assert_eq!(session.selected_version().await, None);
    }
}
