//! Live-sync protocol messages
//!
//! Messages are JSON objects tagged by `type`. An observer always receives
//! `subscribed` then `snapshot` before any `diff`.

use dr_core::commands::Command;
use dr_core::diff::model::ModelDiff;
use dr_core::errors::ExError;
use dr_core::rules::ValidationIssue;
use dr_core::snapshot::SnapshotDocument;
use dr_core_types::ObserverId;
use serde::{Deserialize, Serialize};

use crate::annotations::Annotation;

/// Server to observer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message of every session
    Subscribed { observer: ObserverId, revision: u64 },

    /// Full model state; sent once per session
    Snapshot {
        snapshot: SnapshotDocument,
        annotations: Vec<Annotation>,
    },

    /// Change since the previous snapshot or diff
    Diff {
        diff: ModelDiff,
        /// Digest of the model after applying the diff
        digest: String,
        /// Validation issues of the new state
        issues: Vec<ValidationIssue>,
        /// Observer whose mutation produced the diff; `None` for file changes
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<ObserverId>,
    },

    #[serde(rename = "annotation.added")]
    AnnotationAdded {
        annotation: Annotation,
        /// True when delivered back to the observer that added it
        #[serde(default)]
        echo: bool,
    },

    /// Reply to the observer whose mutation committed
    #[serde(rename = "mutation.committed")]
    MutationCommitted {
        revision: u64,
        element_id: String,
        warnings: Vec<ValidationIssue>,
    },

    /// Server-level failure, such as a reload that could not parse a file
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<usize>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        issues: Vec<ValidationIssue>,
    },
}

impl ServerMessage {
    pub fn from_error(err: &ExError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            message: err.message().to_string(),
            element_id: err.element_id().map(str::to_string),
            file: err.file().map(str::to_string),
            line: err.line(),
            issues: err.issues().to_vec(),
        }
    }

    /// Wire name of the message, as found in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Subscribed { .. } => "subscribed",
            ServerMessage::Snapshot { .. } => "snapshot",
            ServerMessage::Diff { .. } => "diff",
            ServerMessage::AnnotationAdded { .. } => "annotation.added",
            ServerMessage::MutationCommitted { .. } => "mutation.committed",
            ServerMessage::Error { .. } => "error",
        }
    }
}

/// Observer to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        #[serde(default)]
        label: Option<String>,
    },

    Unsubscribe,

    #[serde(rename = "annotation.add")]
    AddAnnotation {
        element_id: String,
        author: String,
        text: String,
    },

    Mutate {
        command: Command,
        /// Revision the observer last saw; enables conflict detection.
        /// When absent the mutation is applied unconditionally and the
        /// last write to an element wins.
        #[serde(default)]
        base_revision: Option<u64>,
    },
}
