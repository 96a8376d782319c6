//! dr-store - On-disk persistence for architecture models
//!
//! Provides:
//! - `manifest.yaml` reading and writing
//! - Per-layer category documents (YAML, keyed by element id)
//! - Atomic temp→rename writes, batched so a save changes all its files or none
//! - Parse errors with file and line

pub mod atomic;
pub mod errors;
pub mod format;
pub mod layer_file;
pub mod manifest;
pub mod model;

// Re-export key types
pub use atomic::WriteBatch;
pub use errors::Result;
pub use layer_file::{load_layer, save_layer, stage_layer, SaveSummary};
pub use manifest::{read_manifest, write_manifest, MANIFEST_FILE};
pub use model::{init_model, load_model, save_layers, save_model, update_manifest, LoadedModel};
