//! Read-only lookup into the store of already persisted records.
//!
//! The detector only needs one query: "what is on file near this point?".
//! Production code answers it with a bounding-box query against the database;
//! [`InMemoryLookup`] answers it from a list, for tests and offline runs.

use std::fs::File;
use std::future::Future;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GroveError, Result};

/// A persisted record as seen by duplicate detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingRecordRef {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub primary_species: String,
}

/// Query capability over the persisted store.
pub trait RecordLookup: Send + Sync {
    /// Records whose coordinates lie inside
    /// `[latitude ± radius] × [longitude ± radius]`.
    fn find_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> impl Future<Output = Result<Vec<ExistingRecordRef>>> + Send;
}

impl<L: RecordLookup> RecordLookup for Arc<L> {
    fn find_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> impl Future<Output = Result<Vec<ExistingRecordRef>>> + Send {
        self.as_ref().find_near(latitude, longitude, radius)
    }
}

/// A lookup with nothing on file.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl RecordLookup for NoLookup {
    async fn find_near(&self, _: f64, _: f64, _: f64) -> Result<Vec<ExistingRecordRef>> {
        Ok(Vec::new())
    }
}

/// Lookup over an in-memory list of records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLookup {
    records: Vec<ExistingRecordRef>,
}

impl InMemoryLookup {
    pub fn new(records: Vec<ExistingRecordRef>) -> Self {
        Self { records }
    }

    /// Load records from a JSON array of [`ExistingRecordRef`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GroveError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let records: Vec<ExistingRecordRef> = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn within_box(&self, latitude: f64, longitude: f64, radius: f64) -> Vec<ExistingRecordRef> {
        self.records
            .iter()
            .filter(|r| {
                (r.latitude - latitude).abs() <= radius && (r.longitude - longitude).abs() <= radius
            })
            .cloned()
            .collect()
    }
}

impl RecordLookup for InMemoryLookup {
    async fn find_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> Result<Vec<ExistingRecordRef>> {
        Ok(self.within_box(latitude, longitude, radius))
    }
}
