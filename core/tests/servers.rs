#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(unix)]

use std::collections::HashMap;
use std::time::Duration;

use bun_runner_core::ServerRegistry;
use bun_runner_core::ServerStatus;
use bun_runner_core::StopResult;
use pretty_assertions::assert_eq;

fn sh(script: &str) -> Vec<String> {
    vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        script.to_string(),
    ]
}

async fn start(registry: &ServerRegistry, script: &str) -> String {
    registry
        .start(sh(script), std::env::temp_dir(), HashMap::new(), None)
        .await
        .unwrap()
        .id
}

/// Polls until the entry reaches a terminal status or the deadline passes.
async fn wait_for_terminal(registry: &ServerRegistry, id: &str) -> ServerStatus {
    for _ in 0..50 {
        let info = registry.get(id).await.unwrap();
        if info.status.is_terminal() {
            return info.status;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("server {id} never reached a terminal status");
}

#[tokio::test]
async fn lifecycle_from_starting_to_stopped() {
    let registry = ServerRegistry::new();
    let id = start(&registry, "sleep 30").await;
    assert!(id.starts_with("server-"));

    // First observation of a live process promotes Starting to Running.
    let info = registry.get(&id).await.unwrap();
    assert_eq!(info.status, ServerStatus::Running);

    assert_eq!(
        registry.stop(&id).await,
        StopResult::Stopped(ServerStatus::Stopped)
    );

    // The entry survives the stop with its terminal status.
    let info = registry.get(&id).await.unwrap();
    assert_eq!(info.status, ServerStatus::Stopped);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let registry = ServerRegistry::new();
    let id = start(&registry, "sleep 30").await;

    assert_eq!(
        registry.stop(&id).await,
        StopResult::Stopped(ServerStatus::Stopped)
    );
    assert_eq!(
        registry.stop(&id).await,
        StopResult::AlreadyStopped(ServerStatus::Stopped)
    );
    assert_eq!(
        registry.stop(&id).await,
        StopResult::AlreadyStopped(ServerStatus::Stopped)
    );
}

#[tokio::test]
async fn clean_natural_exit_reconciles_to_stopped() {
    let registry = ServerRegistry::new();
    let id = start(&registry, "exit 0").await;

    assert_eq!(wait_for_terminal(&registry, &id).await, ServerStatus::Stopped);
    let info = registry.get(&id).await.unwrap();
    assert_eq!(info.exit_code, Some(0));
}

#[tokio::test]
async fn failing_natural_exit_reconciles_to_failed() {
    let registry = ServerRegistry::new();
    let id = start(&registry, "exit 7").await;

    assert_eq!(wait_for_terminal(&registry, &id).await, ServerStatus::Failed);
    let info = registry.get(&id).await.unwrap();
    assert_eq!(info.exit_code, Some(7));

    // Stopping an entry that exited on its own reports the observed status.
    assert_eq!(
        registry.stop(&id).await,
        StopResult::AlreadyStopped(ServerStatus::Failed)
    );
}

#[tokio::test]
async fn list_is_ordered_by_start_time() {
    let registry = ServerRegistry::new();
    let first = start(&registry, "sleep 30").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = start(&registry, "sleep 30").await;

    let infos = registry.list().await;
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].id, first);
    assert_eq!(infos[1].id, second);

    registry.stop(&first).await;
    registry.stop(&second).await;
}

#[tokio::test]
async fn remove_only_drops_terminal_entries() {
    let registry = ServerRegistry::new();
    let id = start(&registry, "sleep 30").await;

    assert!(!registry.remove(&id).await);
    assert!(registry.get(&id).await.is_some());

    registry.stop(&id).await;
    assert!(registry.remove(&id).await);
    assert!(registry.get(&id).await.is_none());
}
