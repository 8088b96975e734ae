//! Batch orchestration: validate, score, detect duplicates, filter.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ValidationConfig;
use crate::duplicates::{DuplicateDetector, DuplicateMatch, NoLookup, RecordLookup};
use crate::error::{GroveError, Result};
use crate::input::RawRow;
use crate::precheck::{PrecheckReport, precheck};
use crate::quality::{QualityScorer, QualityStats};
use crate::record::NormalizedRecord;
use crate::validation::{FieldIssue, FieldValidator, InvalidRow, RowOutcome};

/// Per-run switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOptions {
    /// Query the store for existing near-duplicates.
    pub check_against_store: bool,
    /// Drop rows reported as duplicates from the emitted valid set.
    pub skip_duplicates: bool,
    /// Move valid rows scoring below this into `filtered_out`.
    pub min_quality_score: Option<u8>,
}

impl BatchOptions {
    /// Cheap preview: no store pass, no post-filters.
    pub fn preview() -> Self {
        Self::default()
    }

    /// Full validation including the store pass.
    pub fn full() -> Self {
        Self {
            check_against_store: true,
            ..Self::default()
        }
    }

    pub fn with_skip_duplicates(mut self, skip: bool) -> Self {
        self.skip_duplicates = skip;
        self
    }

    pub fn with_min_quality_score(mut self, score: Option<u8>) -> Self {
        self.min_quality_score = score;
        self
    }
}

/// A valid row with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidRow {
    /// Position in the duplicate-detection batch; what
    /// [`DuplicateMatch::row`] and intra-batch indices refer to.
    pub index: usize,
    /// Source line number (1-based, counting the header line).
    pub row_number: usize,
    pub record: NormalizedRecord,
    pub warnings: Vec<FieldIssue>,
    pub quality_score: u8,
}

/// Row accounting for one run.
///
/// `valid + filtered_out + skipped_duplicates + invalid + blank_rows == total_rows`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_rows: usize,
    pub blank_rows: usize,
    pub valid: usize,
    pub invalid: usize,
    pub filtered_out: usize,
    pub skipped_duplicates: usize,
    pub duplicates: usize,
}

/// Everything a run produces. Owns no external resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: Vec<ValidRow>,
    pub invalid: Vec<InvalidRow>,
    pub duplicates: Vec<DuplicateMatch>,
    /// Valid rows below the minimum quality score. Not errors.
    pub filtered_out: Vec<ValidRow>,
    /// Valid rows removed because they duplicate another row or a stored record.
    pub skipped_duplicates: Vec<ValidRow>,
    /// Scores over every valid row, before post-filters.
    pub stats: QualityStats,
    pub summary: BatchSummary,
}

/// Outcome of validating and scoring one row on a worker.
enum Checked {
    Blank,
    Valid(ValidRow),
    Invalid(InvalidRow),
}

/// Runs the whole validation pipeline over a batch of rows.
pub struct BatchOrchestrator<L = NoLookup> {
    config: ValidationConfig,
    validator: Arc<FieldValidator>,
    scorer: Arc<QualityScorer>,
    detector: DuplicateDetector,
    lookup: L,
}

impl BatchOrchestrator<NoLookup> {
    /// Create an orchestrator with no store behind it.
    pub fn new(config: ValidationConfig) -> Result<Self> {
        Self::with_lookup(config, NoLookup)
    }
}

impl<L: RecordLookup> BatchOrchestrator<L> {
    /// Create an orchestrator that checks the given store for duplicates.
    pub fn with_lookup(config: ValidationConfig, lookup: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            validator: Arc::new(FieldValidator::new(&config)),
            scorer: Arc::new(QualityScorer::new(&config)),
            detector: DuplicateDetector::new(&config.duplicates),
            lookup,
            config,
        })
    }

    /// Pin the date planting dates are compared against.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.validator = Arc::new(FieldValidator::new(&self.config).with_today(today));
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Structural precheck of the header row and row count.
    pub fn precheck<S: AsRef<str>>(&self, headers: &[S], total_data_rows: usize) -> PrecheckReport {
        precheck(headers, total_data_rows)
    }

    /// Cheap validation without the store pass or post-filters.
    pub async fn preview(
        &self,
        rows: Vec<RawRow>,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult> {
        self.run(rows, &BatchOptions::preview(), cancel).await
    }

    /// Validate a batch.
    ///
    /// Returns either a complete result or a single batch-level error. When
    /// `cancel` fires or the configured timeout elapses, all work done so far
    /// is discarded.
    #[instrument(skip_all, fields(rows = rows.len(), store = options.check_against_store))]
    pub async fn run(
        &self,
        rows: Vec<RawRow>,
        options: &BatchOptions,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult> {
        let work = self.execute(rows, options);
        let bounded = async {
            match self.config.timeout() {
                Some(limit) => match tokio::time::timeout(limit, work).await {
                    Ok(result) => result,
                    Err(_) => Err(GroveError::TimedOut(limit)),
                },
                None => work.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Batch validation cancelled");
                Err(GroveError::Cancelled)
            }
            result = bounded => result,
        }
    }

    async fn execute(&self, rows: Vec<RawRow>, options: &BatchOptions) -> Result<ValidationResult> {
        let total_rows = rows.len();

        let checked = self.validate_rows(rows).await?;

        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        let mut blank_rows = 0;
        for outcome in checked {
            match outcome {
                Checked::Blank => blank_rows += 1,
                Checked::Invalid(row) => invalid.push(row),
                Checked::Valid(mut row) => {
                    row.index = valid.len();
                    valid.push(row);
                }
            }
        }
        debug!(valid = valid.len(), invalid = invalid.len(), blank_rows, "Fields validated");

        let scores: Vec<u8> = valid.iter().map(|row| row.quality_score).collect();
        let stats = QualityStats::from_scores(&scores);

        let records: Vec<NormalizedRecord> = valid.iter().map(|row| row.record.clone()).collect();
        let lookup = options.check_against_store.then_some(&self.lookup);
        let duplicates = self.detector.detect(&records, lookup).await;
        debug!(duplicates = duplicates.len(), "Duplicate detection finished");

        let duplicate_rows: HashSet<usize> = if options.skip_duplicates {
            duplicates.iter().map(|m| m.row).collect()
        } else {
            HashSet::new()
        };

        let mut emitted = Vec::with_capacity(valid.len());
        let mut filtered_out = Vec::new();
        let mut skipped_duplicates = Vec::new();
        for row in valid {
            if options
                .min_quality_score
                .is_some_and(|min| row.quality_score < min)
            {
                filtered_out.push(row);
            } else if duplicate_rows.contains(&row.index) {
                skipped_duplicates.push(row);
            } else {
                emitted.push(row);
            }
        }

        let summary = BatchSummary {
            total_rows,
            blank_rows,
            valid: emitted.len(),
            invalid: invalid.len(),
            filtered_out: filtered_out.len(),
            skipped_duplicates: skipped_duplicates.len(),
            duplicates: duplicates.len(),
        };

        info!(
            total = summary.total_rows,
            valid = summary.valid,
            invalid = summary.invalid,
            duplicates = summary.duplicates,
            average_score = stats.average_score,
            "Batch validated"
        );

        Ok(ValidationResult {
            valid: emitted,
            invalid,
            duplicates,
            filtered_out,
            skipped_duplicates,
            stats,
            summary,
        })
    }

    /// Validate and score rows on blocking workers, preserving input order.
    async fn validate_rows(&self, rows: Vec<RawRow>) -> Result<Vec<Checked>> {
        let chunk_size = self.config.concurrency.row_chunk_size.max(1);
        let mut workers = JoinSet::new();
        let mut rows = rows.into_iter();
        let mut chunk_count = 0;
        let mut offset = 0;

        loop {
            let chunk: Vec<RawRow> = rows.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            let validator = Arc::clone(&self.validator);
            let scorer = Arc::clone(&self.scorer);
            let chunk_index = chunk_count;
            let first_row_number = offset + 2;
            offset += chunk.len();
            chunk_count += 1;

            workers.spawn_blocking(move || {
                let checked: Vec<Checked> = chunk
                    .iter()
                    .enumerate()
                    .map(|(i, raw)| check_row(&validator, &scorer, first_row_number + i, raw))
                    .collect();
                (chunk_index, checked)
            });
        }

        let mut chunks = Vec::with_capacity(chunk_count);
        while let Some(joined) = workers.join_next().await {
            chunks.push(joined?);
        }
        chunks.sort_by_key(|(index, _)| *index);

        Ok(chunks.into_iter().flat_map(|(_, checked)| checked).collect())
    }
}

fn check_row(
    validator: &FieldValidator,
    scorer: &QualityScorer,
    row_number: usize,
    raw: &RawRow,
) -> Checked {
    match validator.validate(row_number, raw) {
        None => Checked::Blank,
        Some(RowOutcome::Invalid(row)) => Checked::Invalid(row),
        Some(RowOutcome::Valid { record, warnings }) => Checked::Valid(ValidRow {
            index: 0,
            row_number,
            quality_score: scorer.score(&record, 0),
            record,
            warnings,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{DuplicateOf, ExistingRecordRef, InMemoryLookup};
    use uuid::Uuid;

    const CITY: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn row(species: &str, lat: &str, lon: &str) -> RawRow {
        RawRow::new()
            .with("latitude", lat)
            .with("longitude", lon)
            .with("species_ru", species)
            .with("city_id", CITY)
            .with("planting_date", "2024-01-15")
    }

    fn orchestrator() -> BatchOrchestrator {
        BatchOrchestrator::new(ValidationConfig::default())
            .unwrap()
            .with_today(today())
    }

    #[tokio::test]
    async fn test_row_numbers_and_order_across_chunks() {
        let mut config = ValidationConfig::default();
        config.concurrency.row_chunk_size = 2;
        let orchestrator = BatchOrchestrator::new(config).unwrap().with_today(today());

        let rows = vec![
            row("Береза", "43.10", "76.10"),
            row("Береза", "bad", "76.10"),
            RawRow::from_pairs(&["latitude"], &[""]),
            row("Клен", "43.30", "76.30"),
            row("Дуб", "43.40", "76.40"),
        ];
        let result = orchestrator
            .run(rows, &BatchOptions::preview(), &CancellationToken::new())
            .await
            .unwrap();

        let numbers: Vec<usize> = result.valid.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![2, 5, 6]);
        let indices: Vec<usize> = result.valid.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(result.invalid.len(), 1);
        assert_eq!(result.invalid[0].row_number, 3);
        assert_eq!(result.summary.blank_rows, 1);
        assert_eq!(result.summary.total_rows, 5);
    }

    #[tokio::test]
    async fn test_min_quality_filter() {
        let complete = row("Береза", "43.10", "76.10")
            .with("species_kz", "Қайың")
            .with("species_en", "Birch")
            .with("species_latin", "Betula pendula")
            .with("notes", "Healthy young tree")
            .with("responsible_org", "Greenbuild");
        let bare = row("Клен", "43.20", "76.20");

        let options = BatchOptions::preview().with_min_quality_score(Some(80));
        let result = orchestrator()
            .run(vec![complete, bare], &options, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.valid.len(), 1);
        assert_eq!(result.valid[0].record.species_primary, "Береза");
        assert_eq!(result.filtered_out.len(), 1);
        assert_eq!(result.filtered_out[0].quality_score, 67);
        // Stats still cover both rows.
        assert_eq!(result.stats.total_rows, 2);
        assert!(result.invalid.is_empty());
    }

    #[tokio::test]
    async fn test_skip_duplicates_removes_later_row() {
        let rows = vec![
            row("Тополь", "43.2389", "76.8897"),
            row("Тополь", "43.23891", "76.88971"),
            row("Береза", "43.2389", "76.8897"),
        ];
        let options = BatchOptions::preview().with_skip_duplicates(true);
        let result = orchestrator()
            .run(rows, &options, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(result.skipped_duplicates.len(), 1);
        assert_eq!(result.skipped_duplicates[0].index, 1);
        let kept: Vec<usize> = result.valid.iter().map(|r| r.index).collect();
        assert_eq!(kept, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_store_pass_only_when_requested() {
        let on_file = ExistingRecordRef {
            id: Uuid::new_v4(),
            latitude: 43.2389,
            longitude: 76.8897,
            primary_species: "тополь".to_string(),
        };
        let orchestrator = BatchOrchestrator::with_lookup(
            ValidationConfig::default(),
            InMemoryLookup::new(vec![on_file.clone()]),
        )
        .unwrap()
        .with_today(today());
        let rows = vec![row("Тополь", "43.2389", "76.8897")];

        let preview = orchestrator
            .preview(rows.clone(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(preview.duplicates.is_empty());

        let options = BatchOptions::full().with_skip_duplicates(true);
        let full = orchestrator
            .run(rows, &options, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(full.duplicates.len(), 1);
        assert_eq!(
            full.duplicates[0].duplicate_of,
            DuplicateOf::ExternalStore { record: on_file }
        );
        assert!(full.valid.is_empty());
        assert_eq!(full.summary.skipped_duplicates, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = orchestrator()
            .run(vec![row("Дуб", "43.1", "76.1")], &BatchOptions::preview(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, GroveError::Cancelled));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ValidationConfig::default();
        config.duplicates.lookup_concurrency = 0;
        assert!(BatchOrchestrator::new(config).is_err());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ValidationResult {
            valid: Vec::new(),
            invalid: Vec::new(),
            duplicates: Vec::new(),
            filtered_out: Vec::new(),
            skipped_duplicates: Vec::new(),
            stats: QualityStats::empty(),
            summary: BatchSummary::default(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("filteredOut").is_some());
        assert_eq!(json["stats"]["maxScore"], 100);
        assert_eq!(json["summary"]["totalRows"], 0);
    }
}
