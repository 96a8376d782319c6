use super::issue::{IssueCode, IssueKind, Severity, ValidationIssue};
use super::{ElementValidator, ValidationContext};
use crate::model::Element;
use crate::registry::Cardinality;

/// Resolves every link field of an element through the link registry and
/// the element store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceValidator;

impl ElementValidator for ReferenceValidator {
    fn kind(&self) -> IssueKind {
        IssueKind::Reference
    }

    fn validate(&self, element: &Element, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for link in &element.links {
            let issue = |code, message: String| {
                ValidationIssue::new(code, Severity::Error, &element.id, message).with_field(&link.field)
            };

            let rule = match ctx
                .links
                .field_rule(element.layer, &element.element_type, &link.field)
            {
                Some(rule) if ctx.links.predicate(&rule.predicate).is_ok() => rule,
                _ => {
                    issues.push(issue(
                        IssueCode::UnregisteredPredicate,
                        format!(
                            "'{}' is not a registered link field for {} {}",
                            link.field, element.layer, element.element_type
                        ),
                    ));
                    continue;
                }
            };

            if rule.cardinality == Cardinality::One && link.targets.len() > 1 {
                issues.push(issue(
                    IssueCode::CardinalityViolation,
                    format!(
                        "'{}' takes one target, found {}",
                        link.field,
                        link.targets.len()
                    ),
                ));
            }

            for target_id in &link.targets {
                match ctx.store.get(target_id) {
                    None => issues.push(issue(
                        IssueCode::DanglingTarget,
                        format!("target '{}' does not exist", target_id),
                    )),
                    Some(target) if !rule.accepts_target(target.layer, &target.element_type) => {
                        issues.push(issue(
                            IssueCode::TypeMismatch,
                            format!(
                                "target '{}' is a {} {}, expected {} {}",
                                target_id,
                                target.layer,
                                target.element_type,
                                rule.target_layer,
                                if rule.target_types.is_empty() {
                                    "element".to_string()
                                } else {
                                    rule.target_types.join("|")
                                }
                            ),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        issues
    }
}
