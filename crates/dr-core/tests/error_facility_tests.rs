use dr_core::errors::{DrError, ExError, ExErrorKind};

#[test]
fn test_not_found_verifiable_by_kind() {
    let err = DrError::ElementNotFound {
        element_id: "unknown".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.element_id(), Some("unknown"));
}

#[test]
fn test_layer_errors_are_distinct() {
    let unknown: ExError = DrError::UnknownLayer {
        layer: "finance".to_string(),
    }
    .into();
    let disabled: ExError = DrError::LayerNotEnabled {
        layer: "api".to_string(),
    }
    .into();

    assert_eq!(unknown.kind(), ExErrorKind::UnknownLayer);
    assert_eq!(disabled.kind(), ExErrorKind::LayerDisabled);
    assert_eq!(disabled.layer(), Some("api"));
}

#[test]
fn test_concurrency_conflict_structured_fields() {
    let err: ExError = DrError::ConcurrencyConflict {
        element_id: "goal-1".to_string(),
        base_revision: 3,
        committed_revision: 5,
    }
    .into();

    assert_eq!(err.code(), "ERR_CONCURRENCY_CONFLICT");
    assert_eq!(err.element_id(), Some("goal-1"));
    assert!(err.message().contains("revision 3"));
}

#[test]
fn test_duplicate_id_reports_existing_layer() {
    let err: ExError = DrError::DuplicateElementId {
        element_id: "shared".to_string(),
        existing_layer: "motivation".to_string(),
    }
    .into();

    assert_eq!(err.kind(), ExErrorKind::DuplicateId);
    assert_eq!(err.layer(), Some("motivation"));
}

#[test]
fn test_yaml_error_maps_to_serialization() {
    let yaml_err = serde_yaml::from_str::<Vec<u32>>("{ not: [a, list").unwrap_err();
    let err: DrError = yaml_err.into();
    let ex_err: ExError = err.into();
    assert_eq!(ex_err.kind(), ExErrorKind::Serialization);
}

#[test]
fn test_display_shows_code_and_context() {
    let err = ExError::new(ExErrorKind::Persistence)
        .with_op("save_layer")
        .with_layer("business")
        .with_message("disk full");
    let text = err.to_string();
    assert!(text.starts_with("[ERR_PERSISTENCE] in operation 'save_layer'"));
    assert!(text.contains("(layer: business)"));
}
