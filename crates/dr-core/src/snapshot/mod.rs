//! Committed model snapshots.
//!
//! A snapshot is an immutable view of one committed revision: manifest,
//! elements, the validation report for that state, and a content digest.
//! Exporters and observers only ever see snapshots.

pub mod digest;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::{Element, Manifest};
use crate::ops::ElementStore;
use crate::rules::{ValidationIssue, ValidationReport};

pub use digest::compute_model_digest;

#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub revision: u64,
    pub manifest: Manifest,
    pub store: ElementStore,
    pub report: ValidationReport,
    /// SHA-256 of the ordered element set
    pub digest: String,
}

impl ModelSnapshot {
    /// Capture a snapshot, computing its digest.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if an element cannot be encoded.
    pub fn capture(
        revision: u64,
        manifest: Manifest,
        store: ElementStore,
        report: ValidationReport,
    ) -> Result<Self> {
        let digest = compute_model_digest(&store)?;
        Ok(Self {
            revision,
            manifest,
            store,
            report,
            digest,
        })
    }

    pub fn element_count(&self) -> usize {
        self.store.len()
    }

    /// Serializable form for observers and exporters
    pub fn document(&self) -> SnapshotDocument {
        SnapshotDocument {
            revision: self.revision,
            digest: self.digest.clone(),
            manifest: self.manifest.clone(),
            elements: self.store.iter().cloned().collect(),
            issues: self.report.issues.clone(),
        }
    }
}

/// Wire/export form of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub revision: u64,
    pub digest: String,
    pub manifest: Manifest,
    /// Store order
    pub elements: Vec<Element>,
    pub issues: Vec<ValidationIssue>,
}
