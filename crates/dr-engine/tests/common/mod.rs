use dr_core::{ElementDraft, LayerName};
use dr_engine::ModelManager;
use tempfile::TempDir;

/// Fresh model root with motivation and business layers enabled
#[allow(dead_code)]
pub fn new_model() -> (TempDir, ModelManager) {
    let dir = TempDir::new().unwrap();
    let manager =
        ModelManager::init(dir.path(), "shop", &[LayerName::Motivation, LayerName::Business])
            .unwrap();
    (dir, manager)
}

/// `goal-1` in motivation and `service-1 -> goal-1` in business
#[allow(dead_code)]
pub fn goal_and_service() -> (TempDir, ModelManager) {
    let (dir, mut manager) = new_model();
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
    (dir, manager)
}

/// Every file under `root`, with contents, sorted by path
#[allow(dead_code)]
pub fn disk_state(root: &std::path::Path) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().display().to_string();
                out.push((rel, std::fs::read_to_string(&path).unwrap()));
            }
        }
    }
    out.sort();
    out
}
