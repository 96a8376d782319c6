use dr_core::apply::apply;
use dr_core::{Command, ElementDraft, ElementStore, LayerName, Registries};

/// Store with empty arenas for the given layers
#[allow(dead_code)]
pub fn new_store(layers: &[LayerName]) -> ElementStore {
    ElementStore::new(layers)
}

/// Add an element through the mutation pipeline, panicking on rejection
#[allow(dead_code)]
pub fn add(store: &ElementStore, layer: LayerName, draft: ElementDraft) -> ElementStore {
    let cmd = Command::AddElement { layer, draft };
    apply(store, cmd, &Registries::builtin())
        .expect("fixture element should commit")
        .store
}

/// Motivation + business model holding `goal-1` and `service-1 -> goal-1`
#[allow(dead_code)]
pub fn goal_and_service() -> ElementStore {
    let store = new_store(&[LayerName::Motivation, LayerName::Business]);
    let store = add(
        &store,
        LayerName::Motivation,
        ElementDraft::new("goal", "Goal One").with_id("goal-1"),
    );
    add(
        &store,
        LayerName::Business,
        ElementDraft::new("service", "Service One")
            .with_id("service-1")
            .with_link("supports-goals", ["goal-1"]),
    )
}
