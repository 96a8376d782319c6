use super::issue::{IssueCode, IssueKind, Severity, ValidationIssue};
use super::{ElementValidator, ValidationContext};
use crate::model::Element;

/// Naming conventions: kebab-case ids, trimmed names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingValidator;

/// True for lowercase kebab-case: `[a-z0-9]+(-[a-z0-9]+)*`
pub fn is_kebab_case(id: &str) -> bool {
    !id.is_empty()
        && id
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

/// Kebab-case slug of a display name; empty when nothing usable remains
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

impl ElementValidator for NamingValidator {
    fn kind(&self) -> IssueKind {
        IssueKind::Naming
    }

    fn validate(&self, element: &Element, _ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !is_kebab_case(&element.id) {
            issues.push(ValidationIssue::new(
                IssueCode::IdFormat,
                Severity::Error,
                &element.id,
                format!("id '{}' must be lowercase kebab-case", element.id),
            ));
        }
        if element.name != element.name.trim() {
            issues.push(
                ValidationIssue::new(
                    IssueCode::NameWhitespace,
                    Severity::Warning,
                    &element.id,
                    "name has leading or trailing whitespace",
                )
                .with_field("name"),
            );
        }
        issues
    }
}
