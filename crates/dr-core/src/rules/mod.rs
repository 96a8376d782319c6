//! Validators.
//!
//! A closed set of four element validators (schema, naming, reference,
//! semantic) share the [`ElementValidator`] interface. The semantic
//! validator additionally runs once per model over the dependency graph.

pub mod issue;
pub mod naming;
pub mod reference;
pub mod schema;
pub mod semantic;
pub mod validation;

use crate::model::Element;
use crate::ops::ElementStore;
use crate::registry::{LinkRegistry, SchemaRegistry};

pub use issue::{IssueCode, IssueKind, Severity, ValidationIssue, ValidationReport};
pub use naming::NamingValidator;
pub use reference::ReferenceValidator;
pub use schema::{SchemaValidator, TypedElement, TypedValue};
pub use semantic::SemanticValidator;
pub use validation::{validate_model, Validators};

/// Read-only inputs shared by every validator
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub store: &'a ElementStore,
    pub links: &'a LinkRegistry,
    pub schemas: &'a SchemaRegistry,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        store: &'a ElementStore,
        links: &'a LinkRegistry,
        schemas: &'a SchemaRegistry,
    ) -> Self {
        Self {
            store,
            links,
            schemas,
        }
    }
}

/// Per-element check. Deterministic: same input, same issues, same order.
pub trait ElementValidator {
    fn kind(&self) -> IssueKind;

    fn validate(&self, element: &Element, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue>;
}
