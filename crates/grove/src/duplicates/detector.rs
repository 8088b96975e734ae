//! Near-duplicate detection within a batch and against the store.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DuplicateConfig;
use crate::record::NormalizedRecord;

use super::grid::SpatialGrid;
use super::lookup::{ExistingRecordRef, RecordLookup};

/// Scale used to group batch coordinates before querying the store (6 decimals).
const COORDINATE_SCALE: f64 = 1e6;

/// What a reported row duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DuplicateOf {
    /// An earlier row of the same batch (always the lower index of the pair).
    IntraBatch { index: usize },
    /// A record already on file.
    ExternalStore { record: ExistingRecordRef },
}

/// A row that looks like a near-duplicate of something else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMatch {
    /// Index of the duplicate row in the detection batch.
    pub row: usize,
    pub duplicate_of: DuplicateOf,
    /// 100 for identical coordinates, falling to 0 at the threshold.
    pub similarity_percent: f64,
    pub reason: String,
}

impl DuplicateMatch {
    pub fn is_intra_batch(&self) -> bool {
        matches!(self.duplicate_of, DuplicateOf::IntraBatch { .. })
    }
}

/// Finds near-duplicate records.
///
/// Two points are "near" when the planar distance between their
/// `(latitude, longitude)` pairs is strictly below the configured threshold
/// and their primary species names match case-insensitively. Distance is
/// measured in raw degrees; it approximates meters only over short spans.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    config: DuplicateConfig,
}

impl DuplicateDetector {
    pub fn new(config: &DuplicateConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold_degrees
    }

    /// Run the intra-batch pass and, when a lookup is given, the store pass.
    pub async fn detect<L: RecordLookup>(
        &self,
        batch: &[NormalizedRecord],
        lookup: Option<&L>,
    ) -> Vec<DuplicateMatch> {
        let mut matches = self.intra_batch(batch);
        if let Some(lookup) = lookup {
            matches.extend(self.against_store(batch, lookup).await);
        }
        matches
    }

    /// Find near-duplicate pairs inside the batch using a spatial grid.
    ///
    /// Produces exactly the matches of [`naive_intra_batch`](Self::naive_intra_batch),
    /// sorted by `(row, duplicate index)`.
    pub fn intra_batch(&self, batch: &[NormalizedRecord]) -> Vec<DuplicateMatch> {
        let grid = SpatialGrid::build(
            self.threshold(),
            batch.iter().map(|r| (r.latitude, r.longitude)),
        );

        let mut matches = Vec::new();
        for (j, later) in batch.iter().enumerate() {
            for i in grid.neighbours(later.latitude, later.longitude) {
                if i >= j {
                    continue;
                }
                if let Some(m) = self.match_pair(batch, i, j) {
                    matches.push(m);
                }
            }
        }
        sort_intra(&mut matches);
        matches
    }

    /// Reference O(n²) scan over every unordered pair.
    pub fn naive_intra_batch(&self, batch: &[NormalizedRecord]) -> Vec<DuplicateMatch> {
        let mut matches = Vec::new();
        for i in 0..batch.len() {
            for j in (i + 1)..batch.len() {
                if let Some(m) = self.match_pair(batch, i, j) {
                    matches.push(m);
                }
            }
        }
        sort_intra(&mut matches);
        matches
    }

    /// Compare the batch against records already on file.
    ///
    /// Issues one lookup per distinct coordinate (rounded to 6 decimals), at
    /// most `lookup_concurrency` at a time. A failed lookup is logged and its
    /// coordinate contributes no matches.
    pub async fn against_store<L: RecordLookup>(
        &self,
        batch: &[NormalizedRecord],
        lookup: &L,
    ) -> Vec<DuplicateMatch> {
        let mut groups: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
        for (index, record) in batch.iter().enumerate() {
            groups
                .entry(rounded_key(record.latitude, record.longitude))
                .or_default()
                .push(index);
        }

        debug!(
            coordinates = groups.len(),
            concurrency = self.config.lookup_concurrency,
            "Querying store for existing records"
        );

        let threshold = self.threshold();
        // Half a rounding unit wider, so the box around the rounded point still
        // covers everything within `threshold` of the unrounded one.
        let radius = threshold + 0.5 / COORDINATE_SCALE;
        let per_coordinate: Vec<Vec<DuplicateMatch>> = stream::iter(groups)
            .map(|((lat_key, lon_key), rows)| async move {
                let latitude = lat_key as f64 / COORDINATE_SCALE;
                let longitude = lon_key as f64 / COORDINATE_SCALE;
                match lookup.find_near(latitude, longitude, radius).await {
                    Ok(existing) => rows
                        .iter()
                        .flat_map(|&row| {
                            existing
                                .iter()
                                .filter_map(move |candidate| self.match_existing(batch, row, candidate))
                        })
                        .collect::<Vec<_>>(),
                    Err(e) => {
                        warn!(latitude, longitude, error = %e, "Store lookup failed; skipping coordinate");
                        Vec::new()
                    }
                }
            })
            .buffer_unordered(self.config.lookup_concurrency.max(1))
            .collect()
            .await;

        let mut matches: Vec<DuplicateMatch> = per_coordinate.into_iter().flatten().collect();
        matches.sort_by(|a, b| a.row.cmp(&b.row).then_with(|| store_id(a).cmp(&store_id(b))));
        matches
    }

    fn match_pair(&self, batch: &[NormalizedRecord], i: usize, j: usize) -> Option<DuplicateMatch> {
        let (first, second) = (&batch[i], &batch[j]);
        let distance = self.near(first, second.latitude, second.longitude, &second.species_primary)?;

        Some(DuplicateMatch {
            row: j,
            duplicate_of: DuplicateOf::IntraBatch { index: i },
            similarity_percent: self.similarity(distance),
            reason: format!(
                "same species '{}' as valid row #{} about {:.1} m away",
                second.species_primary,
                i,
                self.meters(distance)
            ),
        })
    }

    fn match_existing(
        &self,
        batch: &[NormalizedRecord],
        row: usize,
        existing: &ExistingRecordRef,
    ) -> Option<DuplicateMatch> {
        let record = &batch[row];
        let distance = self.near(
            record,
            existing.latitude,
            existing.longitude,
            &existing.primary_species,
        )?;

        Some(DuplicateMatch {
            row,
            duplicate_of: DuplicateOf::ExternalStore {
                record: existing.clone(),
            },
            similarity_percent: self.similarity(distance),
            reason: format!(
                "same species '{}' as existing record {} about {:.1} m away",
                record.species_primary,
                existing.id,
                self.meters(distance)
            ),
        })
    }

    /// Distance to the other point if the pair satisfies the match predicate.
    fn near(
        &self,
        record: &NormalizedRecord,
        latitude: f64,
        longitude: f64,
        species: &str,
    ) -> Option<f64> {
        let distance = planar_distance(record.latitude, record.longitude, latitude, longitude);
        (distance < self.threshold() && record.same_species(species)).then_some(distance)
    }

    fn similarity(&self, distance: f64) -> f64 {
        ((1.0 - distance / self.threshold()) * 100.0).clamp(0.0, 100.0)
    }

    fn meters(&self, distance: f64) -> f64 {
        distance * self.config.meters_per_degree
    }
}

/// Euclidean distance over raw degrees.
pub fn planar_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    (lat1 - lat2).hypot(lon1 - lon2)
}

fn rounded_key(latitude: f64, longitude: f64) -> (i64, i64) {
    (
        (latitude * COORDINATE_SCALE).round() as i64,
        (longitude * COORDINATE_SCALE).round() as i64,
    )
}

fn sort_intra(matches: &mut [DuplicateMatch]) {
    matches.sort_by_key(|m| match m.duplicate_of {
        DuplicateOf::IntraBatch { index } => (m.row, index),
        DuplicateOf::ExternalStore { .. } => (m.row, usize::MAX),
    });
}

fn store_id(m: &DuplicateMatch) -> Option<uuid::Uuid> {
    match &m.duplicate_of {
        DuplicateOf::ExternalStore { record } => Some(record.id),
        DuplicateOf::IntraBatch { .. } => None,
    }
}
