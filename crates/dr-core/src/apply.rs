//! Functional-boundary apply function
//!
//! `apply()` is the single entry point for element mutations. It never
//! touches the caller's store: it builds the proposed post-mutation store on
//! the side, validates it, and hands it back only if the mutation commits.
//!
//! ## Mutation lifecycle
//!
//! ```text
//! Pending -> SchemaValidated -> ReferenceValidated -> Committed
//!    \______________\____________________\__________> Rejected
//! ```
//!
//! Schema and naming checks run on the element alone. Reference checks run
//! against the proposed store, so a link to an element removed in the same
//! mutation is caught. Every issue is collected before deciding; a single
//! error-severity issue rejects the whole mutation.
//!
//! ## Example
//!
//! ```
//! use dr_core::apply::apply;
//! use dr_core::commands::{Command, ElementDraft};
//! use dr_core::model::LayerName;
//! use dr_core::ops::ElementStore;
//! use dr_core::registry::Registries;
//!
//! let store = ElementStore::new(&[LayerName::Motivation]);
//! let cmd = Command::AddElement {
//!     layer: LayerName::Motivation,
//!     draft: ElementDraft::new("goal", "Grow revenue"),
//! };
//!
//! let outcome = apply(&store, cmd, &Registries::builtin()).unwrap();
//! assert_eq!(outcome.element_id, "goal-grow-revenue");
//! assert_eq!(outcome.store.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::commands::{Command, ElementDraft};
use crate::errors::{DrError, Result};
use crate::model::{Element, LayerName};
use crate::ops::ElementStore;
use crate::registry::Registries;
use crate::rules::naming::slugify;
use crate::rules::{
    ElementValidator, IssueCode, Severity, ValidationContext, ValidationIssue, Validators,
};

/// Position of a mutation in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    Pending,
    SchemaValidated,
    ReferenceValidated,
    Committed,
    Rejected,
}

impl MutationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MutationState::Committed | MutationState::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Added,
    Updated,
    Removed,
}

/// Result of a committed mutation
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub kind: MutationKind,
    pub element_id: String,
    /// The committed post-mutation store
    pub store: ElementStore,
    /// Ids whose stored content changed: the target (unless removed) and any
    /// cascade-cleared dependents, in that order
    pub touched: Vec<String>,
    /// The removed element, for removals
    pub removed: Option<Element>,
    /// Non-blocking findings on the affected elements
    pub warnings: Vec<ValidationIssue>,
    /// Lifecycle states passed through, ending in `Committed`
    pub states: Vec<MutationState>,
}

/// Apply a command to a store, returning the proposed store if it commits.
///
/// # Errors
///
/// * `LayerNotEnabled` - adding to a layer the store does not hold
/// * `DuplicateElementId` - an explicit id is already taken
/// * `ElementNotFound` - update/remove of an unknown id
/// * `InvalidDraft` - an update draft names a different id
/// * `MutationRejected` - any error-severity issue, with every issue found
pub fn apply(state: &ElementStore, cmd: Command, registries: &Registries) -> Result<MutationOutcome> {
    match cmd {
        Command::AddElement { layer, draft } => add_element(state, layer, draft, registries),
        Command::UpdateElement { id, draft } => update_element(state, &id, draft, registries),
        Command::RemoveElement { id, cascade } => remove_element(state, &id, cascade, registries),
    }
}

/// Derive `<type>-<slug>` from a draft, suffixing `-2`, `-3`, ... until the
/// id is unused anywhere in the store.
pub fn generate_id(store: &ElementStore, element_type: &str, name: &str) -> String {
    let slug = slugify(name);
    let type_slug = slugify(element_type);
    let base = match (type_slug.is_empty(), slug.is_empty()) {
        (true, true) => "element".to_string(),
        (true, false) => slug,
        (false, true) => type_slug,
        (false, false) => format!("{}-{}", type_slug, slug),
    };
    if !store.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !store.contains(candidate))
        .unwrap_or(base)
}

/// Issues that would block dropping `layer`: one `reference/would-dangle`
/// per link field in another layer that still targets one of its elements.
pub fn layer_removal_issues(store: &ElementStore, layer: LayerName) -> Vec<ValidationIssue> {
    let doomed: Vec<&str> = store
        .elements_in(layer)
        .iter()
        .map(|e| e.id.as_str())
        .collect();

    store
        .iter()
        .filter(|e| e.layer != layer)
        .flat_map(|e| {
            let doomed = &doomed;
            e.links.iter().filter_map(move |link| {
                let hit = link.targets.iter().find(|t| doomed.contains(&t.as_str()))?;
                Some(
                    ValidationIssue::new(
                        IssueCode::WouldDangle,
                        Severity::Error,
                        &e.id,
                        format!("still links to '{}' in layer {}", hit, layer),
                    )
                    .with_field(&link.field),
                )
            })
        })
        .collect()
}

/// Tracks lifecycle transitions for one mutation
struct Lifecycle {
    states: Vec<MutationState>,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            states: vec![MutationState::Pending],
        }
    }

    fn advance(&mut self, state: MutationState) {
        self.states.push(state);
    }

    /// Decide the mutation: reject with every blocking issue, or pass the
    /// non-blocking ones through as warnings.
    fn settle(
        mut self,
        element_id: &str,
        schema_issues: Vec<ValidationIssue>,
        reference_issues: Vec<ValidationIssue>,
    ) -> Result<(Vec<MutationState>, Vec<ValidationIssue>)> {
        let schema_ok = !schema_issues.iter().any(ValidationIssue::is_error);
        let reference_ok = !reference_issues.iter().any(ValidationIssue::is_error);

        if schema_ok {
            self.advance(MutationState::SchemaValidated);
            if reference_ok {
                self.advance(MutationState::ReferenceValidated);
            }
        }

        let (errors, warnings): (Vec<_>, Vec<_>) = schema_issues
            .into_iter()
            .chain(reference_issues)
            .partition(ValidationIssue::is_error);

        if !errors.is_empty() {
            return Err(self.reject(element_id, errors));
        }

        self.advance(MutationState::Committed);
        Ok((self.states, warnings))
    }

    fn reject(mut self, element_id: &str, issues: Vec<ValidationIssue>) -> DrError {
        self.advance(MutationState::Rejected);
        tracing::debug!(
            element_id,
            states = ?self.states,
            issue_count = issues.len(),
            "mutation rejected"
        );
        DrError::MutationRejected {
            element_id: element_id.to_string(),
            issues,
        }
    }
}

/// Schema and naming issues for an element in isolation
fn local_issues(validators: &Validators, element: &Element, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
    let mut issues = validators.schema.validate(element, ctx);
    issues.extend(validators.naming.validate(element, ctx));
    issues
}

/// Reference and semantic issues for an element against a store
fn graph_issues(validators: &Validators, element: &Element, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
    let mut issues = validators.reference.validate(element, ctx);
    issues.extend(validators.semantic.validate(element, ctx));
    issues
}

/// Errors on `id` in `proposed` that were not already present in `current`.
/// Dependents only block a mutation for problems the mutation introduced.
fn introduced_issues(
    validators: &Validators,
    id: &str,
    current: &ValidationContext<'_>,
    proposed: &ValidationContext<'_>,
) -> Vec<ValidationIssue> {
    let Some(after) = proposed.store.get(id) else {
        return Vec::new();
    };
    let before = current
        .store
        .get(id)
        .map(|e| validators.validate_element(e, current))
        .unwrap_or_default();

    validators
        .validate_element(after, proposed)
        .into_iter()
        .filter(|issue| !before.contains(issue))
        .collect()
}

fn add_element(
    state: &ElementStore,
    layer: LayerName,
    draft: ElementDraft,
    registries: &Registries,
) -> Result<MutationOutcome> {
    if !state.has_layer(layer) {
        return Err(DrError::LayerNotEnabled {
            layer: layer.to_string(),
        });
    }
    let id = match draft.id.clone() {
        Some(id) => {
            if let Some(existing) = state.layer_of(&id) {
                return Err(DrError::DuplicateElementId {
                    element_id: id,
                    existing_layer: existing.to_string(),
                });
            }
            id
        }
        None => generate_id(state, &draft.element_type, &draft.name),
    };
    let element = draft.into_element(id.clone(), layer);
    let lifecycle = Lifecycle::new();
    let validators = Validators::default();

    let mut proposed = state.clone();
    proposed.insert(element)?;
    let ctx = ValidationContext::new(&proposed, &registries.links, &registries.schemas);
    let element = proposed.require(&id)?;

    let schema_issues = local_issues(&validators, element, &ctx);
    let reference_issues = graph_issues(&validators, element, &ctx);
    let (states, warnings) = lifecycle.settle(&id, schema_issues, reference_issues)?;

    Ok(MutationOutcome {
        kind: MutationKind::Added,
        element_id: id.clone(),
        store: proposed,
        touched: vec![id],
        removed: None,
        warnings,
        states,
    })
}

fn update_element(
    state: &ElementStore,
    id: &str,
    draft: ElementDraft,
    registries: &Registries,
) -> Result<MutationOutcome> {
    let existing = state.require(id)?;
    if let Some(draft_id) = draft.id.as_deref() {
        if draft_id != id {
            return Err(DrError::InvalidDraft {
                reason: format!("draft id '{}' does not match target '{}'", draft_id, id),
            });
        }
    }
    let mut draft = draft;
    if draft.category.is_none() {
        draft.category = Some(existing.category.clone());
    }
    let element = draft.into_element(id.to_string(), existing.layer);
    let lifecycle = Lifecycle::new();
    let validators = Validators::default();

    let mut proposed = state.clone();
    proposed.replace(element)?;
    let current_ctx = ValidationContext::new(state, &registries.links, &registries.schemas);
    let ctx = ValidationContext::new(&proposed, &registries.links, &registries.schemas);
    let element = proposed.require(id)?;

    let schema_issues = local_issues(&validators, element, &ctx);
    let mut reference_issues = graph_issues(&validators, element, &ctx);
    // a type change can break links that point at this element
    for referrer in proposed.referrers(id) {
        reference_issues.extend(introduced_issues(&validators, &referrer.id, &current_ctx, &ctx));
    }
    let (states, warnings) = lifecycle.settle(id, schema_issues, reference_issues)?;

    Ok(MutationOutcome {
        kind: MutationKind::Updated,
        element_id: id.to_string(),
        store: proposed,
        touched: vec![id.to_string()],
        removed: None,
        warnings,
        states,
    })
}

fn remove_element(
    state: &ElementStore,
    id: &str,
    cascade: bool,
    registries: &Registries,
) -> Result<MutationOutcome> {
    state.require(id)?;
    let lifecycle = Lifecycle::new();
    let validators = Validators::default();
    let dependents: Vec<String> = state.referrers(id).iter().map(|e| e.id.clone()).collect();

    if !cascade && !dependents.is_empty() {
        let issues = dependents
            .iter()
            .filter_map(|d| state.get(d))
            .flat_map(|dependent| {
                dependent
                    .links
                    .iter()
                    .filter(|l| l.targets.iter().any(|t| t == id))
                    .map(move |l| {
                        ValidationIssue::new(
                            IssueCode::WouldDangle,
                            Severity::Error,
                            &dependent.id,
                            format!("'{}' still targets '{}'", l.field, id),
                        )
                        .with_field(&l.field)
                    })
            })
            .collect();
        return Err(lifecycle.reject(id, issues));
    }

    let mut proposed = state.clone();
    let removed = proposed.remove(id)?;
    for dependent_id in &dependents {
        let mut dependent = proposed.require(dependent_id)?.clone();
        dependent.clear_target(id);
        proposed.replace(dependent)?;
    }

    let current_ctx = ValidationContext::new(state, &registries.links, &registries.schemas);
    let ctx = ValidationContext::new(&proposed, &registries.links, &registries.schemas);
    let mut reference_issues = Vec::new();
    for dependent_id in &dependents {
        reference_issues.extend(introduced_issues(&validators, dependent_id, &current_ctx, &ctx));
    }
    let (states, warnings) = lifecycle.settle(id, Vec::new(), reference_issues)?;

    Ok(MutationOutcome {
        kind: MutationKind::Removed,
        element_id: id.to_string(),
        store: proposed,
        touched: dependents,
        removed: Some(removed),
        warnings,
        states,
    })
}
