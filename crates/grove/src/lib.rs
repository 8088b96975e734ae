//! Grove: validation pipeline for bulk imports of geolocated green-space records.
//!
//! Grove decides, before anything is persisted, which submitted rows (trees,
//! parks, alleys, gardens) are valid, how complete each valid row is, and
//! which rows are near-duplicates of each other or of records already on file.
//!
//! # Pipeline
//!
//! - **Precheck**: header and row-count check for instant feedback
//! - **Field validation**: per-row rules producing a normalized record or errors
//! - **Quality scoring**: a 0-100 completeness heuristic per valid row
//! - **Duplicate detection**: proximity + species matching, in-batch and against the store
//!
//! # Example
//!
//! ```no_run
//! use grove::{BatchOptions, BatchOrchestrator, RawRow, ValidationConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> grove::Result<()> {
//! let orchestrator = BatchOrchestrator::new(ValidationConfig::default())?;
//! let rows = vec![RawRow::new()
//!     .with("latitude", "43.2220")
//!     .with("longitude", "76.8512")
//!     .with("species_ru", "Береза")
//!     .with("city_id", "3f2504e0-4f89-11d3-9a0c-0305e82c3301")
//!     .with("planting_date", "2024-01-15")];
//!
//! let result = orchestrator
//!     .run(rows, &BatchOptions::preview(), &CancellationToken::new())
//!     .await?;
//! println!("valid: {}, average score: {}", result.valid.len(), result.stats.average_score);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod duplicates;
pub mod error;
pub mod input;
pub mod precheck;
pub mod quality;
pub mod record;
pub mod validation;

mod batch;

pub use crate::batch::{BatchOptions, BatchOrchestrator, BatchSummary, ValidRow, ValidationResult};
pub use config::{
    ConcurrencyConfig, DuplicateConfig, FieldRules, RegionBounds, ScoringWeights, ValidationConfig,
};
pub use duplicates::{
    DuplicateDetector, DuplicateMatch, DuplicateOf, ExistingRecordRef, InMemoryLookup, NoLookup,
    RecordLookup,
};
pub use error::{GroveError, Result};
pub use input::{RawRow, normalize_header};
pub use precheck::{PrecheckReport, precheck};
pub use quality::{QualityScorer, QualityStats};
pub use record::{NormalizedRecord, RecordStatus, RecordType};
pub use validation::{FieldIssue, FieldValidator, InvalidRow, IssueCode, RowOutcome, Severity};
