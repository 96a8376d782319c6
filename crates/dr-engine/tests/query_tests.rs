// Traceability, impact and projection queries

mod common;

use dr_core::errors::ExErrorKind;
use dr_core::ops::ProjectionFilter;
use dr_core::registry::PredicateCategory;
use dr_core::{Direction, ElementDraft, LayerName};

fn layered_model() -> (tempfile::TempDir, dr_engine::ModelManager) {
    let (dir, mut manager) = common::goal_and_service();
    manager
        .add_element(
            LayerName::Motivation,
            ElementDraft::new("goal", "Mission").with_id("goal-mission"),
        )
        .unwrap();
    manager
        .update_element(
            "goal-1",
            ElementDraft::new("goal", "Goal One").with_link("parent-goal", ["goal-mission"]),
        )
        .unwrap();
    (dir, manager)
}

#[test]
fn test_trace_upward_and_downward() {
    let (_dir, manager) = layered_model();

    assert_eq!(
        manager.trace_upward("service-1", None).unwrap(),
        vec!["goal-1", "goal-mission"]
    );
    assert_eq!(manager.trace_upward("service-1", Some(1)).unwrap(), vec!["goal-1"]);
    assert_eq!(
        manager.trace_downward("goal-mission", None).unwrap(),
        vec!["goal-1", "service-1"]
    );
}

#[test]
fn test_impact_lists_all_dependents() {
    let (_dir, manager) = layered_model();

    let impact = manager.impact("goal-mission").unwrap();

    assert_eq!(impact.len(), 2);
    assert!(impact.contains(&"service-1".to_string()));
}

#[test]
fn test_path_between_either_direction() {
    let (_dir, manager) = layered_model();

    assert_eq!(
        manager.path_between("service-1", "goal-mission").unwrap(),
        Some(vec![
            "service-1".to_string(),
            "goal-1".to_string(),
            "goal-mission".to_string()
        ])
    );
    assert_eq!(
        manager.path_between("goal-mission", "service-1").unwrap(),
        Some(vec![
            "goal-mission".to_string(),
            "goal-1".to_string(),
            "service-1".to_string()
        ])
    );
}

#[test]
fn test_unknown_id_is_not_found() {
    let (_dir, manager) = layered_model();

    let err = manager.impact("goal-nope").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_project_filters_by_layer() {
    let (_dir, manager) = layered_model();
    let filter = ProjectionFilter::default()
        .with_direction(Direction::Backward)
        .with_layers([LayerName::Business]);

    let projection = manager.project("goal-mission", &filter).unwrap();

    assert_eq!(projection.node_ids(), vec!["goal-mission", "service-1"]);
    assert!(projection.edges.is_empty());
}

#[test]
fn test_project_filters_by_category() {
    let (_dir, manager) = layered_model();
    let filter = ProjectionFilter::default().with_categories([PredicateCategory::Structural]);

    let projection = manager.project("goal-mission", &filter).unwrap();

    assert!(projection.contains("goal-mission"));
    assert!(projection
        .edges
        .iter()
        .all(|e| e.category == PredicateCategory::Structural));
}
