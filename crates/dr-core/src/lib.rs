//! dr-core - In-memory kernel of the architecture model
//!
//! This crate holds everything about the model that needs no I/O:
//! - Layer catalog, elements and the manifest
//! - Link and schema registries
//! - Element store (arena per layer)
//! - Schema, naming, reference and semantic validators
//! - Dependency tracker (cycles, reachability, shortest paths)
//! - Projection engine
//! - Mutation pipeline (`apply`) and model diffs
//! - Snapshots with content digests
//!
//! Persistence lives in `dr-store`; orchestration in `dr-engine`.

pub mod apply;
pub mod commands;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod registry;
pub mod rules;
pub mod snapshot;
pub mod traversal;

// Re-export commonly used types
pub use apply::{apply, MutationOutcome, MutationState};
pub use commands::{Command, ElementDraft};
pub use errors::{DrError, ExError, ExErrorKind, Result};
pub use model::{Element, LayerName, LinkField, Manifest, PropertyValue};
pub use ops::ElementStore;
pub use registry::{LinkRegistry, Registries, SchemaRegistry};
pub use rules::{IssueCode, Severity, ValidationIssue, ValidationReport};
pub use snapshot::ModelSnapshot;
pub use traversal::{DependencyTracker, Direction};
