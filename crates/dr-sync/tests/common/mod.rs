use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dr_core::{ElementDraft, LayerName};
use dr_engine::ModelManager;
use dr_sync::{ServerMessage, Subscription, SyncConfig, SyncHandle, SyncServer};
use tempfile::TempDir;

/// Config for tests that drive reloads by hand
#[allow(dead_code)]
pub fn manual_config() -> SyncConfig {
    SyncConfig::default().with_watch(false)
}

/// Server over `goal-1` (motivation) and `service-1 -> goal-1` (business)
#[allow(dead_code)]
pub fn start_server(config: SyncConfig) -> (TempDir, SyncHandle) {
    let dir = TempDir::new().unwrap();
    let mut manager =
        ModelManager::init(dir.path(), "shop", &[LayerName::Motivation, LayerName::Business])
            .unwrap();
    manager
        .add_element(
            LayerName::Motivation,
            ElementDraft::new("goal", "Goal One").with_id("goal-1"),
        )
        .unwrap();
    manager
        .add_element(
            LayerName::Business,
            ElementDraft::new("service", "Service One")
                .with_id("service-1")
                .with_link("supports-goals", ["goal-1"]),
        )
        .unwrap();
    let handle = SyncServer::start(manager, config).unwrap();
    (dir, handle)
}

/// Append a goal to the motivation layer, as an external editor would
#[allow(dead_code)]
pub fn append_goal(root: &Path, id: &str) {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(root.join("01_motivation/goals.yaml"))
        .unwrap();
    write!(file, "{}:\n  type: goal\n  name: Appended {}\n", id, id).unwrap();
}

/// Next message, failing the test if none arrives in time
#[allow(dead_code)]
pub async fn next_message(sub: &mut Subscription) -> Arc<ServerMessage> {
    tokio::time::timeout(Duration::from_secs(5), sub.messages.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("subscription closed")
}

/// Whatever arrives within `wait`; `None` if the stream stayed quiet
#[allow(dead_code)]
pub async fn message_within(sub: &mut Subscription, wait: Duration) -> Option<Arc<ServerMessage>> {
    tokio::time::timeout(wait, sub.messages.recv())
        .await
        .ok()
        .flatten()
}

/// Subscribe and consume the `subscribed` and `snapshot` messages
#[allow(dead_code)]
pub async fn join(handle: &SyncHandle, label: &str) -> Subscription {
    let mut sub = handle.subscribe(Some(label.to_string())).await.unwrap();
    let first = next_message(&mut sub).await;
    assert!(matches!(&*first, ServerMessage::Subscribed { .. }));
    let second = next_message(&mut sub).await;
    assert!(matches!(&*second, ServerMessage::Snapshot { .. }));
    sub
}
