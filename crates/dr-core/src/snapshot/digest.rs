//! Digest computation for model snapshots.
//!
//! ## Determinism Guarantees
//!
//! - Same element set, same order → same digest (canonical JSON)
//! - Attribute maps are ordered, so key order in source files is irrelevant
//! - Element order matters: reordering elements within a layer changes it

use crate::errors::Result;
use crate::model::Element;
use crate::ops::ElementStore;
use sha2::{Digest, Sha256};

/// Compute digest of the ordered element set.
///
/// ## Returns
///
/// Hex-encoded SHA256 digest (64 characters)
///
/// ## Errors
///
/// Returns `DrError::Serialization` if JSON serialization fails.
pub fn compute_model_digest(store: &ElementStore) -> Result<String> {
    let elements: Vec<&Element> = store.iter().collect();
    let canonical = serde_json::to_string(&elements)?;
    Ok(hash_string(&canonical))
}

/// Hash a string using SHA256.
fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
