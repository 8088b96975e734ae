//! Fast structural precheck of a submission.
//!
//! Looks only at the header row and the number of data rows, so it can give
//! feedback before any row is parsed.

use serde::{Deserialize, Serialize};

use crate::error::{GroveError, Result};
use crate::input::{columns, normalize_header};

/// Outcome of a structural precheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecheckReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub row_count: usize,
}

impl PrecheckReport {
    /// Turn a failed report into a batch-level structure error.
    pub fn into_result(self) -> Result<usize> {
        if self.is_valid {
            Ok(self.row_count)
        } else {
            Err(GroveError::Structure(self.errors))
        }
    }
}

/// Check that all required columns are present and there is at least one data row.
pub fn precheck<S: AsRef<str>>(headers: &[S], total_data_rows: usize) -> PrecheckReport {
    let present: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();

    let mut errors: Vec<String> = columns::REQUIRED
        .iter()
        .filter(|required| !present.iter().any(|h| h == *required))
        .map(|required| format!("missing required column: {required}"))
        .collect();

    if total_data_rows == 0 {
        errors.push("file contains no data rows".to_string());
    }

    PrecheckReport {
        is_valid: errors.is_empty(),
        errors,
        row_count: total_data_rows,
    }
}
