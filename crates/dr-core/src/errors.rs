use dr_core_types::RequestId;
use thiserror::Error;

use crate::rules::issue::ValidationIssue;

/// Result type alias using DrError
pub type Result<T> = std::result::Result<T, DrError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised outside the validation pipeline. Each kind maps to a stable error
/// code that can be used for programmatic error handling, testing, and
/// observer-facing error events.
///
/// Validation findings are not errors: they are collected as
/// [`ValidationIssue`]s and only surface here wrapped in `MutationRejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Lookup
    InvalidInput,
    NotFound,
    UnknownLayer,
    LayerDisabled,
    UnknownPredicate,
    DuplicateId,

    // Documents
    /// Malformed on-disk document; fatal to that file's load
    Parse,

    // Mutation
    /// The validate chain reported error-severity issues; nothing changed
    MutationRejected,
    /// The request was prepared against a revision the target has since moved past
    ConcurrencyConflict,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    /// The sync server is not running (request queue closed)
    ServerUnavailable,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::UnknownLayer => "ERR_UNKNOWN_LAYER",
            ExErrorKind::LayerDisabled => "ERR_LAYER_DISABLED",
            ExErrorKind::UnknownPredicate => "ERR_UNKNOWN_PREDICATE",
            ExErrorKind::DuplicateId => "ERR_DUPLICATE_ID",
            ExErrorKind::Parse => "ERR_PARSE",
            ExErrorKind::MutationRejected => "ERR_MUTATION_REJECTED",
            ExErrorKind::ConcurrencyConflict => "ERR_CONCURRENCY_CONFLICT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ServerUnavailable => "ERR_SERVER_UNAVAILABLE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// This error type provides a structured representation of errors with
/// classification fields for programmatic handling and rich context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    element_id: Option<String>,
    layer: Option<String>,
    file: Option<String>,
    line: Option<usize>,
    request_id: Option<RequestId>,
    message: String,
    issues: Vec<ValidationIssue>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            element_id: None,
            layer: None,
            file: None,
            line: None,
            request_id: None,
            message: String::new(),
            issues: Vec::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add element ID context
    pub fn with_element_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Add layer context
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Add source document location; `line` is 1-based when known
    pub fn with_location(mut self, file: impl Into<String>, line: Option<usize>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the validation issues behind a rejection
    pub fn with_issues(mut self, issues: Vec<ValidationIssue>) -> Self {
        self.issues = issues;
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the element ID context, if any
    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// Get the layer context, if any
    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    /// Get the source file, if any
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Get the 1-based source line, if determinable
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Issues carried by a `MutationRejected` error (empty otherwise)
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// True when any carried issue has the given code
    pub fn has_issue(&self, code: crate::rules::issue::IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(element_id) = &self.element_id {
            write!(f, " (element_id: {})", element_id)?;
        }
        if let Some(layer) = &self.layer {
            write!(f, " (layer: {})", layer)?;
        }
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, " at {}:{}", file, line)?,
            (Some(file), None) => write!(f, " in {}", file)?,
            _ => {}
        }
        if !self.issues.is_empty() {
            write!(f, " ({} issue(s))", self.issues.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for the in-memory model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrError {
    /// Layer name is not part of the catalog
    #[error("Unknown layer: {layer}")]
    UnknownLayer { layer: String },

    /// Layer exists in the catalog but is not enabled in the manifest
    #[error("Layer is not enabled: {layer}")]
    LayerNotEnabled { layer: String },

    /// Element not found in any layer
    #[error("Element not found: {element_id}")]
    ElementNotFound { element_id: String },

    /// Element id already taken (ids are unique across all layers)
    #[error("Duplicate element id {element_id}: already present in layer {existing_layer}")]
    DuplicateElementId {
        element_id: String,
        existing_layer: String,
    },

    /// Predicate absent from the link catalog
    #[error("Unknown predicate: {predicate}")]
    UnknownPredicate { predicate: String },

    /// A draft could not be turned into a mutation
    #[error("Invalid draft: {reason}")]
    InvalidDraft { reason: String },

    /// The validate chain produced error-severity issues
    #[error("Mutation of {element_id} rejected with {} issue(s)", issues.len())]
    MutationRejected {
        element_id: String,
        issues: Vec<ValidationIssue>,
    },

    /// The target element was committed after the request's base revision
    #[error("Concurrent modification of {element_id}: request based on revision {base_revision}, element committed at {committed_revision}")]
    ConcurrencyConflict {
        element_id: String,
        base_revision: u64,
        committed_revision: u64,
    },

    /// Serialization error (JSON/YAML encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from DrError to ExError
impl From<DrError> for ExError {
    fn from(err: DrError) -> Self {
        match err {
            DrError::UnknownLayer { layer } => ExError::new(ExErrorKind::UnknownLayer)
                .with_layer(layer)
                .with_message("Layer is not part of the catalog"),

            DrError::LayerNotEnabled { layer } => ExError::new(ExErrorKind::LayerDisabled)
                .with_layer(layer)
                .with_message("Layer is not enabled in the manifest"),

            DrError::ElementNotFound { element_id } => ExError::new(ExErrorKind::NotFound)
                .with_element_id(element_id)
                .with_message("Element not found"),

            DrError::DuplicateElementId {
                element_id,
                existing_layer,
            } => ExError::new(ExErrorKind::DuplicateId)
                .with_element_id(element_id)
                .with_layer(existing_layer)
                .with_message("Element id already present"),

            DrError::UnknownPredicate { predicate } => ExError::new(ExErrorKind::UnknownPredicate)
                .with_message(format!("Unknown predicate: {}", predicate)),

            DrError::InvalidDraft { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }

            DrError::MutationRejected { element_id, issues } => {
                ExError::new(ExErrorKind::MutationRejected)
                    .with_element_id(element_id)
                    .with_message("Edit rejected; nothing changed")
                    .with_issues(issues)
            }

            DrError::ConcurrencyConflict {
                element_id,
                base_revision,
                committed_revision,
            } => ExError::new(ExErrorKind::ConcurrencyConflict)
                .with_element_id(element_id)
                .with_message(format!(
                    "Request based on revision {} but element committed at {}",
                    base_revision, committed_revision
                )),

            DrError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            DrError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to DrError
impl From<serde_json::Error> for DrError {
    fn from(err: serde_json::Error) -> Self {
        DrError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from serde_yaml::Error to DrError
impl From<serde_yaml::Error> for DrError {
    fn from(err: serde_yaml::Error) -> Self {
        DrError::Serialization {
            message: err.to_string(),
        }
    }
}
