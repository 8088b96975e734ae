//! Heuristic quality scoring for validated records.

use serde::{Deserialize, Serialize};

use crate::config::{FieldRules, ScoringWeights, ValidationConfig};
use crate::record::NormalizedRecord;

/// Scores a record's completeness on a 0-100 scale.
///
/// Pure and deterministic: the same record and error count always produce
/// the same score.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    weights: ScoringWeights,
    rules: FieldRules,
}

impl QualityScorer {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            weights: config.scoring.clone(),
            rules: config.fields.clone(),
        }
    }

    /// Score a record.
    ///
    /// `error_count` is the number of validation errors already found for the
    /// row; it is zero for every row the pipeline actually scores.
    pub fn score(&self, record: &NormalizedRecord, error_count: usize) -> u8 {
        let w = &self.weights;
        let mut score = 100.0 - w.per_error * error_count as f64;

        if record.species_alt1.is_none() {
            score -= w.missing_secondary_name;
        }
        if record.species_alt2.is_none() {
            score -= w.missing_secondary_name;
        }
        if record.scientific_name.is_none() {
            score -= w.missing_scientific_name;
        }
        if record.district_id.is_none() {
            score -= w.missing_district;
        }
        if record.responsible_org.is_none() {
            score -= w.missing_responsible_org;
        }

        match &record.notes {
            None => score -= w.missing_notes,
            Some(notes) if notes.chars().count() < self.rules.min_notes_len => {
                score -= w.short_notes;
            }
            Some(_) => {}
        }

        if record.species_primary.chars().count() < self.rules.min_species_len {
            score -= w.short_species_name;
        }

        // "Genus species" looks complete.
        if record
            .scientific_name
            .as_deref()
            .is_some_and(|name| name.trim().contains(' '))
        {
            score += w.binomial_bonus;
        }

        score.clamp(0.0, 100.0).round() as u8
    }
}

/// Aggregate scores for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityStats {
    pub average_score: u8,
    pub min_score: u8,
    pub max_score: u8,
    /// Number of rows scored.
    pub total_rows: usize,
}

impl QualityStats {
    /// Compute stats over a set of scores.
    ///
    /// An empty set yields `{ average: 0, min: 0, max: 100, total: 0 }`.
    pub fn from_scores(scores: &[u8]) -> Self {
        let (Some(&min_score), Some(&max_score)) = (scores.iter().min(), scores.iter().max())
        else {
            return Self::empty();
        };

        let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
        let average = (sum as f64 / scores.len() as f64).round() as u8;

        Self {
            average_score: average,
            min_score,
            max_score,
            total_rows: scores.len(),
        }
    }

    pub fn empty() -> Self {
        Self {
            average_score: 0,
            min_score: 0,
            max_score: 100,
            total_rows: 0,
        }
    }
}
