//! Field validation: rules, issues and per-row outcomes.

mod field;
mod issue;
mod outcome;

pub use field::FieldValidator;
pub use issue::{FieldIssue, IssueCode, Severity};
pub use outcome::{InvalidRow, RowOutcome};
