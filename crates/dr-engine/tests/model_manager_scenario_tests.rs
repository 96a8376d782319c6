// End-to-end mutation scenarios through the Model Manager

mod common;

use dr_core::errors::ExErrorKind;
use dr_core::{ElementDraft, IssueCode, LayerName};
use dr_engine::ModelManager;

#[test]
fn test_goal_service_lifecycle() {
    // Given: an empty model with motivation and business layers
    let (dir, mut manager) = common::new_model();

    // When: goal-1 is added, then service-1 supporting it
    manager
        .add_element(
            LayerName::Motivation,
            ElementDraft::new("goal", "Goal One").with_id("goal-1"),
        )
        .unwrap();
    let receipt = manager
        .add_element(
            LayerName::Business,
            ElementDraft::new("service", "Service One")
                .with_id("service-1")
                .with_link("supports-goals", ["goal-1"]),
        )
        .unwrap();

    // Then: both commits succeed and the service traces to the goal
    assert_eq!(receipt.element_id, "service-1");
    let dependents = manager.trace_downward("goal-1", None).unwrap();
    assert!(dependents.contains(&"service-1".to_string()));

    // When: goal-1 is removed without cascade
    let err = manager.remove_element("goal-1", false).unwrap_err();

    // Then: rejected with would-dangle, nothing changed
    assert_eq!(err.kind(), ExErrorKind::MutationRejected);
    assert!(err.has_issue(IssueCode::WouldDangle));
    assert!(manager.store().contains("goal-1"));

    // When: goal-1 is removed with cascade
    let receipt = manager.remove_element("goal-1", true).unwrap();

    // Then: the service's link field is cleared and it validates clean
    assert_eq!(receipt.touched, vec!["service-1".to_string()]);
    let service = manager.store().get("service-1").unwrap();
    assert!(service.link_targets("supports-goals").is_empty());
    let report = manager.validate();
    assert_eq!(report.for_element("service-1").count(), 0, "{:?}", report.issues);

    // And: the on-disk model agrees with memory
    let reopened = ModelManager::open(dir.path()).unwrap();
    assert_eq!(reopened.store(), manager.store());
}

#[test]
fn test_rejected_mutation_leaves_disk_unchanged() {
    // Given: a committed model
    let (dir, mut manager) = common::goal_and_service();
    let before = common::disk_state(dir.path());
    let revision = manager.revision();

    // When: an add with a dangling link and a bad id is attempted
    let err = manager
        .add_element(
            LayerName::Business,
            ElementDraft::new("service", "Broken")
                .with_id("Broken_Service")
                .with_link("supports-goals", ["goal-missing"]),
        )
        .unwrap_err();

    // Then: every issue is reported and nothing is written
    assert_eq!(err.kind(), ExErrorKind::MutationRejected);
    assert!(err.has_issue(IssueCode::DanglingTarget));
    assert!(err.has_issue(IssueCode::IdFormat));
    assert_eq!(common::disk_state(dir.path()), before);
    assert_eq!(manager.revision(), revision);
}

#[test]
fn test_update_persists_in_place() {
    let (dir, mut manager) = common::goal_and_service();

    manager
        .update_element(
            "goal-1",
            ElementDraft::new("goal", "Goal One, sharpened").with_documentation("Measured yearly"),
        )
        .unwrap();

    let reopened = ModelManager::open(dir.path()).unwrap();
    let goal = reopened.store().get("goal-1").unwrap();
    assert_eq!(goal.name, "Goal One, sharpened");
    assert_eq!(goal.documentation.as_deref(), Some("Measured yearly"));
}

#[test]
fn test_generated_id_follows_type_and_name() {
    let (_dir, mut manager) = common::new_model();

    let first = manager
        .add_element(LayerName::Motivation, ElementDraft::new("goal", "Grow Revenue"))
        .unwrap();
    let second = manager
        .add_element(LayerName::Motivation, ElementDraft::new("goal", "Grow revenue"))
        .unwrap();

    assert_eq!(first.element_id, "goal-grow-revenue");
    assert_eq!(second.element_id, "goal-grow-revenue-2");
}

#[test]
fn test_add_to_disabled_layer_fails() {
    let (_dir, mut manager) = common::new_model();

    let err = manager
        .add_element(LayerName::Security, ElementDraft::new("policy", "Encrypt"))
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::LayerDisabled);
}

#[test]
fn test_enable_then_disable_layer() {
    let (dir, mut manager) = common::new_model();

    assert!(manager.enable_layer(LayerName::Security).unwrap());
    manager
        .add_element(
            LayerName::Security,
            ElementDraft::new("policy", "Encrypt at rest").with_id("policy-encrypt"),
        )
        .unwrap();
    assert!(dir.path().join("03_security/policies.yaml").is_file());

    assert!(manager.disable_layer(LayerName::Security).unwrap());
    assert!(!manager.store().contains("policy-encrypt"));
    // Files stay on disk and return with the layer
    assert!(dir.path().join("03_security/policies.yaml").is_file());

    assert!(manager.enable_layer(LayerName::Security).unwrap());
    assert!(manager.store().contains("policy-encrypt"));
}
