use serde::{Deserialize, Serialize};

use crate::model::Element;

/// Difference between two committed model states
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDiff {
    /// Revision of the state this diff applies to
    pub from_revision: u64,
    /// Revision after applying it
    pub to_revision: u64,
    /// New elements, with their values
    pub added: Vec<Element>,
    /// Ids no longer present
    pub removed: Vec<String>,
    /// Elements whose content changed, with their new values
    pub changed: Vec<Element>,
}

impl ModelDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    pub fn added_ids(&self) -> Vec<&str> {
        self.added.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn changed_ids(&self) -> Vec<&str> {
        self.changed.iter().map(|e| e.id.as_str()).collect()
    }

    /// Total number of touched ids
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}
