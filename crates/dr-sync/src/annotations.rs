//! Session-scoped annotations
//!
//! Annotations are notes observers attach to elements. They live only in
//! the running server, are never written to the model files, and outlive
//! the element they point at until the server stops.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    pub element_id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    pub fn new(
        element_id: impl Into<String>,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            element_id: element_id.into(),
            author: author.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Annotations grouped by element id, each list in insertion order
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    by_element: BTreeMap<String, Vec<Annotation>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, annotation: Annotation) {
        self.by_element
            .entry(annotation.element_id.clone())
            .or_default()
            .push(annotation);
    }

    pub fn for_element(&self, element_id: &str) -> &[Annotation] {
        self.by_element
            .get(element_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every annotation, grouped by element id
    pub fn all(&self) -> Vec<Annotation> {
        self.by_element.values().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_element.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }
}
