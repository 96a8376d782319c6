use super::issue::{ValidationIssue, ValidationReport};
use super::{
    ElementValidator, NamingValidator, ReferenceValidator, SchemaValidator, SemanticValidator,
    ValidationContext,
};
use crate::model::Element;
use crate::ops::ElementStore;
use crate::registry::{LinkRegistry, SchemaRegistry};
use crate::traversal::DependencyTracker;

/// The fixed validator set, run in schema, naming, reference, semantic order
#[derive(Debug, Clone, Copy, Default)]
pub struct Validators {
    pub schema: SchemaValidator,
    pub naming: NamingValidator,
    pub reference: ReferenceValidator,
    pub semantic: SemanticValidator,
}

impl Validators {
    pub fn all(&self) -> [&dyn ElementValidator; 4] {
        [&self.schema, &self.naming, &self.reference, &self.semantic]
    }

    /// Every per-element issue for one element
    pub fn validate_element(&self, element: &Element, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        self.all()
            .iter()
            .flat_map(|v| v.validate(element, ctx))
            .collect()
    }

    /// Full pass: per-element issues in store order, then graph-level issues.
    /// Collects everything; never stops at the first finding.
    pub fn validate_model(&self, ctx: &ValidationContext<'_>, tracker: &DependencyTracker) -> ValidationReport {
        let mut issues: Vec<ValidationIssue> = ctx
            .store
            .iter()
            .flat_map(|element| self.validate_element(element, ctx))
            .collect();
        issues.extend(self.semantic.validate_graph(tracker));
        ValidationReport::new(issues)
    }
}

/// Validate a whole store, building the dependency graph on the way
pub fn validate_model(
    store: &ElementStore,
    links: &LinkRegistry,
    schemas: &SchemaRegistry,
) -> ValidationReport {
    let tracker = DependencyTracker::build(store, links);
    Validators::default().validate_model(&ValidationContext::new(store, links, schemas), &tracker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LayerName;
    use crate::rules::issue::{IssueCode, IssueKind};

    #[test]
    fn test_collects_every_issue() {
        let mut store = ElementStore::new(&[LayerName::Motivation, LayerName::Business]);
        store
            .insert(Element::new("Goal_1", LayerName::Motivation, "goal", " Padded "))
            .unwrap();
        store
            .insert(
                Element::new("service-1", LayerName::Business, "service", "S")
                    .with_link("supports-goals", ["goal-9"])
                    .with_link("befriends", ["Goal_1"]),
            )
            .unwrap();

        let report = validate_model(&store, &LinkRegistry::builtin(), &SchemaRegistry::builtin());

        let codes: Vec<IssueCode> = report.issues.iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                IssueCode::IdFormat,
                IssueCode::NameWhitespace,
                IssueCode::DanglingTarget,
                IssueCode::UnregisteredPredicate,
            ]
        );
        assert_eq!(report.error_count(), 3);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_validator_kinds_are_distinct() {
        let validators = Validators::default();
        let kinds: Vec<IssueKind> = validators.all().iter().map(|v| v.kind()).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::Schema, IssueKind::Naming, IssueKind::Reference, IssueKind::Semantic]
        );
    }
}
