//! Validation findings.
//!
//! Issues are collected, never raised: every validator returns the full list
//! it found for its input, in rule declaration order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which validator produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Schema,
    Reference,
    Semantic,
    Naming,
}

/// Issue severity. Ordered: `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Stable issue code, serialized as `<kind>/<rule>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCode {
    #[serde(rename = "schema/unknown-type")]
    UnknownType,
    #[serde(rename = "schema/missing-attribute")]
    MissingAttribute,
    #[serde(rename = "schema/attribute-type")]
    AttributeType,
    #[serde(rename = "schema/enum-value")]
    EnumValue,
    #[serde(rename = "schema/string-length")]
    StringLength,
    #[serde(rename = "schema/empty-name")]
    EmptyName,

    #[serde(rename = "reference/unregistered-predicate")]
    UnregisteredPredicate,
    #[serde(rename = "reference/dangling-target")]
    DanglingTarget,
    #[serde(rename = "reference/type-mismatch")]
    TypeMismatch,
    #[serde(rename = "reference/cardinality-violation")]
    CardinalityViolation,
    #[serde(rename = "reference/would-dangle")]
    WouldDangle,

    #[serde(rename = "semantic/cycle")]
    Cycle,
    #[serde(rename = "semantic/missing-traceability")]
    MissingTraceability,

    #[serde(rename = "naming/id-format")]
    IdFormat,
    #[serde(rename = "naming/name-whitespace")]
    NameWhitespace,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::UnknownType => "schema/unknown-type",
            IssueCode::MissingAttribute => "schema/missing-attribute",
            IssueCode::AttributeType => "schema/attribute-type",
            IssueCode::EnumValue => "schema/enum-value",
            IssueCode::StringLength => "schema/string-length",
            IssueCode::EmptyName => "schema/empty-name",
            IssueCode::UnregisteredPredicate => "reference/unregistered-predicate",
            IssueCode::DanglingTarget => "reference/dangling-target",
            IssueCode::TypeMismatch => "reference/type-mismatch",
            IssueCode::CardinalityViolation => "reference/cardinality-violation",
            IssueCode::WouldDangle => "reference/would-dangle",
            IssueCode::Cycle => "semantic/cycle",
            IssueCode::MissingTraceability => "semantic/missing-traceability",
            IssueCode::IdFormat => "naming/id-format",
            IssueCode::NameWhitespace => "naming/name-whitespace",
        }
    }

    pub fn kind(&self) -> IssueKind {
        match self {
            IssueCode::UnknownType
            | IssueCode::MissingAttribute
            | IssueCode::AttributeType
            | IssueCode::EnumValue
            | IssueCode::StringLength
            | IssueCode::EmptyName => IssueKind::Schema,
            IssueCode::UnregisteredPredicate
            | IssueCode::DanglingTarget
            | IssueCode::TypeMismatch
            | IssueCode::CardinalityViolation
            | IssueCode::WouldDangle => IssueKind::Reference,
            IssueCode::Cycle | IssueCode::MissingTraceability => IssueKind::Semantic,
            IssueCode::IdFormat | IssueCode::NameWhitespace => IssueKind::Naming,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reported problem with one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub code: IssueCode,
    pub severity: Severity,
    pub element_id: String,
    /// Offending attribute or link field, when the issue concerns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        code: IssueCode,
        severity: Severity,
        element_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: code.kind(),
            code,
            severity,
            element_id: element_id.into(),
            field: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{} [{}] {}", severity, self.code, self.element_id)?;
        if let Some(field) = &self.field {
            write!(f, ".{}", field)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered result of a full validation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Issues raised against one element
    pub fn for_element<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.element_id == id)
    }

    pub fn with_code(&self, code: IssueCode) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.code == code).collect()
    }
}
