//! Error handling for dr-store
//!
//! Wraps dr-core ExError with store-specific helpers

use dr_core::errors::{ExError, ExErrorKind};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error for a store operation
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an IO error that names the file involved
pub fn io_error_at(operation: &str, path: &Path, err: std::io::Error) -> ExError {
    io_error(operation, err).with_location(path.display().to_string(), None)
}

/// Create a parse error from a YAML failure
///
/// serde_yaml reports 1-based lines; the location is kept when available.
pub fn parse_error(path: &Path, err: &serde_yaml::Error) -> ExError {
    let line = err.location().map(|loc| loc.line());
    ExError::new(ExErrorKind::Parse)
        .with_op("load_document")
        .with_location(path.display().to_string(), line)
        .with_message(err.to_string())
}

/// Create a serialization error for a document that could not be written
pub fn serialize_error(path: &Path, err: &serde_yaml::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("save_document")
        .with_location(path.display().to_string(), None)
        .with_message(err.to_string())
}

/// Create a persistence error for a model root that cannot be used
pub fn model_root_error(root: &Path, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("model_root")
        .with_location(root.display().to_string(), None)
        .with_message(reason.to_string())
}
