use super::issue::{IssueCode, IssueKind, Severity, ValidationIssue};
use super::{ElementValidator, ValidationContext};
use crate::model::Element;
use crate::traversal::DependencyTracker;

/// Cross-cutting model rules. Findings are warnings: they describe smells,
/// not broken references.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticValidator;

impl SemanticValidator {
    /// One `semantic/cycle` warning per cycle, raised on the element where
    /// the search entered it.
    pub fn validate_graph(&self, tracker: &DependencyTracker) -> Vec<ValidationIssue> {
        tracker
            .cycles()
            .into_iter()
            .filter_map(|cycle| {
                let first = cycle.nodes.first()?.clone();
                let mut path = cycle.nodes.join(" -> ");
                path.push_str(" -> ");
                path.push_str(&first);
                let (predicate, strength) = cycle.strongest;
                Some(ValidationIssue::new(
                    IssueCode::Cycle,
                    Severity::Warning,
                    first,
                    format!("cycle {} (strongest link: {} {})", path, predicate, strength),
                ))
            })
            .collect()
    }
}

impl ElementValidator for SemanticValidator {
    fn kind(&self) -> IssueKind {
        IssueKind::Semantic
    }

    /// Upward traceability: a type declaring trace fields needs at least one
    /// of them populated. Fields pointing into layers absent from the model
    /// do not count against it.
    fn validate(&self, element: &Element, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let Some(schema) = ctx.schemas.type_schema(element.layer, &element.element_type) else {
            return Vec::new();
        };

        let applicable: Vec<&str> = schema
            .trace_fields
            .iter()
            .filter(|field| {
                ctx.links
                    .field_rule(element.layer, &element.element_type, field)
                    .is_some_and(|rule| ctx.store.has_layer(rule.target_layer))
            })
            .map(String::as_str)
            .collect();

        if applicable.is_empty() || applicable.iter().any(|f| !element.link_targets(f).is_empty()) {
            return Vec::new();
        }

        vec![ValidationIssue::new(
            IssueCode::MissingTraceability,
            Severity::Warning,
            &element.id,
            format!(
                "{} {} does not trace upward through any of [{}]",
                element.layer,
                element.element_type,
                applicable.join(", ")
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LayerName;
    use crate::ops::ElementStore;
    use crate::registry::{LinkRegistry, SchemaRegistry};

    #[test]
    fn test_missing_traceability_only_when_target_layer_present() {
        let links = LinkRegistry::builtin();
        let schemas = SchemaRegistry::builtin();
        let component = Element::new("comp-1", LayerName::Application, "component", "C");

        let mut isolated = ElementStore::new(&[LayerName::Application]);
        isolated.insert(component.clone()).unwrap();
        let ctx = ValidationContext::new(&isolated, &links, &schemas);
        assert!(SemanticValidator.validate(&component, &ctx).is_empty());

        let mut layered = ElementStore::new(&[LayerName::Business, LayerName::Application]);
        layered.insert(component.clone()).unwrap();
        let ctx = ValidationContext::new(&layered, &links, &schemas);
        let issues = SemanticValidator.validate(&component, &ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::MissingTraceability);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_cycle_warning_names_path() {
        let links = LinkRegistry::builtin();
        let mut store = ElementStore::new(&[LayerName::Application]);
        store
            .insert(Element::new("a", LayerName::Application, "component", "A").with_link("depends-on", ["b"]))
            .unwrap();
        store
            .insert(Element::new("b", LayerName::Application, "component", "B").with_link("depends-on", ["a"]))
            .unwrap();

        let tracker = DependencyTracker::build(&store, &links);
        let issues = SemanticValidator.validate_graph(&tracker);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].element_id, "a");
        assert!(issues[0].message.contains("a -> b -> a"));
        assert!(issues[0].message.contains("depends-on medium"));
    }
}
