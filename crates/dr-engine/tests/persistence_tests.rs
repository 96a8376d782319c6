// Reload, scan and idempotence against the on-disk model

mod common;

use dr_core::errors::ExErrorKind;
use dr_core::rules::IssueCode;
use dr_core::Registries;
use dr_engine::ModelManager;

#[test]
fn test_open_save_open_is_idempotent() {
    // Given: a committed model
    let (dir, manager) = common::goal_and_service();
    let digest = manager.snapshot().unwrap().digest;

    // When: it is reopened, saved back unchanged and reopened again
    let reopened = ModelManager::open(dir.path()).unwrap();
    dr_store::save_model(dir.path(), reopened.manifest(), reopened.store()).unwrap();
    let again = ModelManager::open(dir.path()).unwrap();

    // Then: same element set, same digest
    assert_eq!(again.store(), manager.store());
    assert_eq!(again.snapshot().unwrap().digest, digest);
}

#[test]
fn test_reload_picks_up_external_edit() {
    // Given: an open model
    let (dir, mut manager) = common::goal_and_service();
    let revision = manager.revision();

    // When: another process appends an element to a category file
    let goals = dir.path().join("01_motivation/goals.yaml");
    let mut text = std::fs::read_to_string(&goals).unwrap();
    text.push_str("goal-2:\n  type: goal\n  name: Goal Two\n");
    std::fs::write(&goals, text).unwrap();
    let diff = manager.reload().unwrap();

    // Then: the diff shows exactly the new element
    assert_eq!(diff.added_ids(), vec!["goal-2"]);
    assert!(diff.removed.is_empty());
    assert!(diff.changed.is_empty());
    assert_eq!(manager.revision(), revision + 1);
}

#[test]
fn test_reload_without_changes_keeps_revision() {
    let (_dir, mut manager) = common::goal_and_service();
    let revision = manager.revision();

    let diff = manager.reload().unwrap();

    assert!(diff.is_empty());
    assert_eq!(manager.revision(), revision);
}

#[test]
fn test_failed_reload_keeps_previous_state() {
    // Given: an open model
    let (dir, mut manager) = common::goal_and_service();
    let before = manager.store().clone();

    // When: a file is corrupted and a reload is attempted
    std::fs::write(dir.path().join("01_motivation/goals.yaml"), "goal-1: [oops\n").unwrap();
    let err = manager.reload().unwrap_err();

    // Then: the parse error names the file, memory is untouched
    assert_eq!(err.kind(), ExErrorKind::Parse);
    assert!(err.file().unwrap().ends_with("goals.yaml"));
    assert_eq!(manager.store(), &before);
}

#[test]
fn test_failed_multi_layer_write_leaves_disk_unchanged() {
    // Given: goal-1 is referenced from the business layer, whose temp path is blocked
    let (dir, mut manager) = common::goal_and_service();
    let before = common::disk_state(dir.path());
    std::fs::create_dir(dir.path().join("02_business/services.tmp")).unwrap();

    // When: removing goal-1 with cascade must rewrite both layers
    let err = manager.remove_element("goal-1", true).unwrap_err();

    // Then: nothing changed on disk or in memory
    assert!(matches!(err.kind(), ExErrorKind::Io));
    assert!(manager.store().contains("goal-1"));
    assert!(!dir.path().join("01_motivation/goals.tmp").exists());
    std::fs::remove_dir(dir.path().join("02_business/services.tmp")).unwrap();
    assert_eq!(common::disk_state(dir.path()), before);
    let scan = ModelManager::scan(dir.path(), &Registries::builtin()).unwrap();
    assert!(scan.report.with_code(IssueCode::DanglingTarget).is_empty());

    // And: the same mutation succeeds once the path is free
    manager.remove_element("goal-1", true).unwrap();
    let goals = std::fs::read_to_string(dir.path().join("01_motivation/goals.yaml"));
    assert!(goals.map_or(true, |text| !text.contains("goal-1")));
}

#[test]
fn test_scan_separates_parse_failures_from_issues() {
    // Given: a model with one broken file and one dangling link
    let (dir, _manager) = common::goal_and_service();
    std::fs::write(dir.path().join("01_motivation/goals.yaml"), "goal-1: [oops\n").unwrap();

    // When
    let scan = ModelManager::scan(dir.path(), &Registries::builtin()).unwrap();

    // Then: the broken file is a failure, the dangling link a validation issue
    assert_eq!(scan.failures.len(), 1);
    assert_eq!(scan.failures[0].kind(), ExErrorKind::Parse);
    assert_eq!(scan.report.with_code(IssueCode::DanglingTarget).len(), 1);
    assert!(scan.has_errors());
    assert!(!scan.is_clean());
}

#[test]
fn test_snapshot_document_serializes() {
    let (_dir, manager) = common::goal_and_service();

    let snapshot = manager.snapshot().unwrap();
    let json = serde_json::to_value(snapshot.document()).unwrap();

    assert_eq!(json["revision"], snapshot.revision);
    assert_eq!(json["elements"].as_array().unwrap().len(), 2);
    assert_eq!(json["manifest"]["name"], "shop");
}
