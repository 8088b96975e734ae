//! Row-scoped issues found during field validation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of problem a field has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// A required field is missing or blank.
    Required,
    /// Value is not a number.
    InvalidNumber,
    /// Numeric value outside its absolute range.
    OutOfRange,
    /// Coordinates valid on the globe but outside the configured region.
    OutsideRegion,
    /// Value is not a recognizable calendar date.
    InvalidDate,
    /// Date lies after today.
    FutureDate,
    /// Date is implausibly old.
    AncientDate,
    /// Value is not one of the allowed enum members.
    InvalidEnum,
    /// Identifier is not in canonical UUID form.
    InvalidIdentifier,
    /// An optional field was left empty.
    MissingOptional,
    /// Notes are present but too short to be useful.
    ShortNotes,
}

impl IssueCode {
    /// Get a human-readable label for the issue code.
    pub fn label(&self) -> &'static str {
        match self {
            IssueCode::Required => "Required",
            IssueCode::InvalidNumber => "Invalid Number",
            IssueCode::OutOfRange => "Out Of Range",
            IssueCode::OutsideRegion => "Outside Region",
            IssueCode::InvalidDate => "Invalid Date",
            IssueCode::FutureDate => "Future Date",
            IssueCode::AncientDate => "Ancient Date",
            IssueCode::InvalidEnum => "Invalid Value",
            IssueCode::InvalidIdentifier => "Invalid Identifier",
            IssueCode::MissingOptional => "Missing Optional Field",
            IssueCode::ShortNotes => "Short Notes",
        }
    }
}

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; never excludes a row.
    Warning,
    /// Excludes the row from the valid set.
    Error,
}

/// One problem with one field of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// Affected column, when the issue belongs to a single column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: IssueCode,
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl FieldIssue {
    /// Create an error-level issue.
    pub fn error(code: IssueCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            code,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    pub fn warning(code: IssueCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            code,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Drop the field attribution (for issues spanning several columns).
    pub fn without_field(mut self) -> Self {
        self.field = None;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
