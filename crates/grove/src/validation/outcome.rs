//! Per-row validation outcomes.

use serde::{Deserialize, Serialize};

use crate::input::RawRow;
use crate::record::NormalizedRecord;

use super::issue::FieldIssue;

/// A row that failed field validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRow {
    /// Source line number (1-based, counting the header line).
    pub row_number: usize,
    /// The row exactly as submitted.
    pub raw: RawRow,
    pub errors: Vec<FieldIssue>,
}

/// Result of validating one row: either a normalized record or its errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Valid {
        record: NormalizedRecord,
        warnings: Vec<FieldIssue>,
    },
    Invalid(InvalidRow),
}

impl RowOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, RowOutcome::Valid { .. })
    }

    /// Errors attached to the outcome (empty for valid rows).
    pub fn errors(&self) -> &[FieldIssue] {
        match self {
            RowOutcome::Valid { .. } => &[],
            RowOutcome::Invalid(invalid) => &invalid.errors,
        }
    }

    /// Warnings attached to the outcome (empty for invalid rows).
    pub fn warnings(&self) -> &[FieldIssue] {
        match self {
            RowOutcome::Valid { warnings, .. } => warnings,
            RowOutcome::Invalid(_) => &[],
        }
    }
}
