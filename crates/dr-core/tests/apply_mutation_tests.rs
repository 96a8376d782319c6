//! Mutation pipeline tests
//!
//! ## Scenarios Covered
//!
//! 1. Add commits and walks the full lifecycle
//! 2. Rejection leaves the caller's store untouched and reports every issue
//! 3. Update keeps slot and category, catches broken inbound links
//! 4. Remove blocks on inbound links unless cascading
//! 5. Id generation

mod common;

use dr_core::apply::{apply, generate_id, layer_removal_issues, MutationKind, MutationState};
use dr_core::{
    Command, DrError, ElementDraft, IssueCode, LayerName, PropertyValue, Registries, Severity,
};

#[test]
fn test_add_walks_full_lifecycle() {
    // GIVEN an empty two-layer store
    let store = common::new_store(&[LayerName::Motivation, LayerName::Business]);

    // WHEN a goal is added
    let outcome = apply(
        &store,
        Command::AddElement {
            layer: LayerName::Motivation,
            draft: ElementDraft::new("goal", "Goal One").with_id("goal-1"),
        },
        &Registries::builtin(),
    )
    .unwrap();

    // THEN it commits through every stage
    assert_eq!(
        outcome.states,
        vec![
            MutationState::Pending,
            MutationState::SchemaValidated,
            MutationState::ReferenceValidated,
            MutationState::Committed,
        ]
    );
    assert_eq!(outcome.kind, MutationKind::Added);
    assert!(outcome.store.contains("goal-1"));
    // AND the input store is untouched
    assert!(store.is_empty());
}

#[test]
fn test_rejection_collects_all_issues_and_changes_nothing() {
    let store = common::goal_and_service();
    let before = store.clone();

    // Bad id, bad enum value, dangling link: three independent errors
    let draft = ElementDraft::new("service", "Broken")
        .with_id("Broken_Service")
        .with_property("priority", PropertyValue::Text("urgent".into()))
        .with_link("supports-goals", ["goal-404"]);
    let result = apply(
        &store,
        Command::AddElement {
            layer: LayerName::Business,
            draft,
        },
        &Registries::builtin(),
    );

    match result {
        Err(DrError::MutationRejected { element_id, issues }) => {
            assert_eq!(element_id, "Broken_Service");
            let codes: Vec<IssueCode> = issues.iter().map(|i| i.code).collect();
            assert_eq!(
                codes,
                vec![IssueCode::EnumValue, IssueCode::IdFormat, IssueCode::DanglingTarget]
            );
            assert!(issues.iter().all(|i| i.severity == Severity::Error));
        }
        other => panic!("expected rejection, got {:?}", other.map(|o| o.element_id)),
    }
    assert_eq!(store, before);
}

#[test]
fn test_add_to_missing_layer_and_duplicate_id() {
    let store = common::goal_and_service();

    let missing = apply(
        &store,
        Command::AddElement {
            layer: LayerName::Api,
            draft: ElementDraft::new("operation", "Op"),
        },
        &Registries::builtin(),
    );
    assert!(matches!(missing, Err(DrError::LayerNotEnabled { .. })));

    let duplicate = apply(
        &store,
        Command::AddElement {
            layer: LayerName::Business,
            draft: ElementDraft::new("service", "Again").with_id("goal-1"),
        },
        &Registries::builtin(),
    );
    assert!(matches!(duplicate, Err(DrError::DuplicateElementId { .. })));
}

#[test]
fn test_update_keeps_position_and_category() {
    let store = common::goal_and_service();
    let store = common::add(
        &store,
        LayerName::Motivation,
        ElementDraft::new("goal", "Goal Two")
            .with_id("goal-2")
            .with_category("strategic"),
    );

    let outcome = apply(
        &store,
        Command::UpdateElement {
            id: "goal-2".into(),
            draft: ElementDraft::new("goal", "Goal Two, renamed"),
        },
        &Registries::builtin(),
    )
    .unwrap();

    let goals = outcome.store.elements_in(LayerName::Motivation);
    assert_eq!(goals[1].id, "goal-2");
    assert_eq!(goals[1].name, "Goal Two, renamed");
    assert_eq!(goals[1].category, "strategic");
    assert_eq!(outcome.kind, MutationKind::Updated);
}

#[test]
fn test_update_type_change_breaking_inbound_link_is_rejected() {
    // GIVEN service-1 supports goal-1
    let store = common::goal_and_service();

    // WHEN goal-1 is retyped to a driver, which supports-goals cannot target
    let result = apply(
        &store,
        Command::UpdateElement {
            id: "goal-1".into(),
            draft: ElementDraft::new("driver", "Now a driver"),
        },
        &Registries::builtin(),
    );

    // THEN the dependent's new type mismatch rejects the update
    match result {
        Err(DrError::MutationRejected { issues, .. }) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].code, IssueCode::TypeMismatch);
            assert_eq!(issues[0].element_id, "service-1");
        }
        other => panic!("expected rejection, got {:?}", other.is_ok()),
    }
}

#[test]
fn test_update_with_mismatched_draft_id() {
    let store = common::goal_and_service();
    let result = apply(
        &store,
        Command::UpdateElement {
            id: "goal-1".into(),
            draft: ElementDraft::new("goal", "G").with_id("goal-2"),
        },
        &Registries::builtin(),
    );
    assert!(matches!(result, Err(DrError::InvalidDraft { .. })));
}

#[test]
fn test_remove_without_cascade_would_dangle() {
    let store = common::goal_and_service();

    let result = apply(
        &store,
        Command::RemoveElement {
            id: "goal-1".into(),
            cascade: false,
        },
        &Registries::builtin(),
    );

    match result {
        Err(DrError::MutationRejected { element_id, issues }) => {
            assert_eq!(element_id, "goal-1");
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].code, IssueCode::WouldDangle);
            assert_eq!(issues[0].element_id, "service-1");
            assert_eq!(issues[0].field.as_deref(), Some("supports-goals"));
        }
        other => panic!("expected rejection, got {:?}", other.is_ok()),
    }
}

#[test]
fn test_remove_with_cascade_clears_dependent_fields() {
    let store = common::goal_and_service();

    let outcome = apply(
        &store,
        Command::RemoveElement {
            id: "goal-1".into(),
            cascade: true,
        },
        &Registries::builtin(),
    )
    .unwrap();

    assert_eq!(outcome.kind, MutationKind::Removed);
    assert_eq!(outcome.removed.as_ref().map(|e| e.id.as_str()), Some("goal-1"));
    assert_eq!(outcome.touched, vec!["service-1".to_string()]);

    let service = outcome.store.get("service-1").unwrap();
    assert!(service.link_targets("supports-goals").is_empty());
    assert!(service.links.is_empty());
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_remove_unknown_element() {
    let store = common::goal_and_service();
    let result = apply(
        &store,
        Command::RemoveElement {
            id: "ghost".into(),
            cascade: true,
        },
        &Registries::builtin(),
    );
    assert!(matches!(result, Err(DrError::ElementNotFound { .. })));
}

#[test]
fn test_generated_ids_are_unique() {
    let store = common::new_store(&[LayerName::Motivation, LayerName::Business]);
    let store = common::add(&store, LayerName::Motivation, ElementDraft::new("goal", "Grow Revenue"));
    assert!(store.contains("goal-grow-revenue"));

    assert_eq!(generate_id(&store, "goal", "Grow Revenue"), "goal-grow-revenue-2");

    let store = common::add(&store, LayerName::Motivation, ElementDraft::new("goal", "Grow Revenue"));
    assert!(store.contains("goal-grow-revenue-2"));
    assert_eq!(generate_id(&store, "goal", "Grow revenue!"), "goal-grow-revenue-3");
}

#[test]
fn test_warnings_do_not_block() {
    let store = common::new_store(&[LayerName::Motivation]);
    let outcome = apply(
        &store,
        Command::AddElement {
            layer: LayerName::Motivation,
            draft: ElementDraft::new("goal", " padded ").with_id("goal-1"),
        },
        &Registries::builtin(),
    )
    .unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].code, IssueCode::NameWhitespace);
}

#[test]
fn test_layer_removal_issues() {
    let store = common::goal_and_service();

    let issues = layer_removal_issues(&store, LayerName::Motivation);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code, IssueCode::WouldDangle);
    assert_eq!(issues[0].element_id, "service-1");

    assert!(layer_removal_issues(&store, LayerName::Business).is_empty());
}
