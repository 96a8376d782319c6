// Load/save idempotence of on-disk models

mod common;

use dr_core::snapshot::digest::compute_model_digest;
use dr_core::rules::validate_model;
use dr_core::{LayerName, LinkRegistry, SchemaRegistry};
use dr_store::{load_model, save_model};

#[test]
fn test_loaded_model_keeps_file_order_and_links() {
    // Given: a model root with hand-written category files
    let dir = common::seeded_model();

    // When: we load it
    let loaded = load_model(dir.path()).unwrap();

    // Then: everything loads in file order with link declaration order kept
    assert!(loaded.is_complete());
    assert_eq!(
        loaded.store.ids(),
        vec!["goal-growth", "goal-retention", "service-checkout"]
    );
    let service = loaded.store.get("service-checkout").unwrap();
    assert_eq!(service.layer, LayerName::Business);
    assert_eq!(service.category, "services");
    assert_eq!(
        service.link_targets("supports-goals"),
        ["goal-growth", "goal-retention"]
    );
    assert_eq!(service.documentation.as_deref(), Some("Takes payment for a basket"));
}

#[test]
fn test_seeded_model_validates_clean() {
    let dir = common::seeded_model();
    let loaded = load_model(dir.path()).unwrap();

    let report = validate_model(
        &loaded.store,
        &LinkRegistry::builtin(),
        &SchemaRegistry::builtin(),
    );

    assert!(!report.has_errors(), "{:?}", report.issues);
}

#[test]
fn test_load_save_load_is_idempotent() {
    // Given: a loaded model
    let dir = common::seeded_model();
    let first = load_model(dir.path()).unwrap();
    let first_digest = compute_model_digest(&first.store).unwrap();

    // When: it is saved without mutation and loaded again
    save_model(dir.path(), &first.manifest, &first.store).unwrap();
    let second = load_model(dir.path()).unwrap();

    // Then: the element set and values are identical
    assert_eq!(second.store, first.store);
    assert_eq!(compute_model_digest(&second.store).unwrap(), first_digest);
    assert_eq!(second.manifest, first.manifest);
}

#[test]
fn test_second_save_is_byte_stable() {
    let dir = common::seeded_model();
    let loaded = load_model(dir.path()).unwrap();

    save_model(dir.path(), &loaded.manifest, &loaded.store).unwrap();
    let again = load_model(dir.path()).unwrap();
    let summary = save_model(dir.path(), &again.manifest, &again.store).unwrap();

    // Then: the canonical form is already on disk, nothing is rewritten
    assert!(summary.is_noop(), "{:?}", summary);
}
