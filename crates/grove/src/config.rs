//! Configuration for the validation pipeline.
//!
//! Every threshold the pipeline uses lives here rather than in module
//! constants, so alternate regions, proximity thresholds and scoring weights
//! can be exercised without touching code.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GroveError, Result};

/// Smallest accepted duplicate threshold (about 0.1 mm).
pub const MIN_THRESHOLD_DEGREES: f64 = 1e-9;

/// Top-level configuration passed to the orchestrator at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Region every record's coordinates must fall inside.
    pub region: RegionBounds,
    /// Near-duplicate matching parameters.
    pub duplicates: DuplicateConfig,
    /// Penalties and bonuses used by the quality scorer.
    pub scoring: ScoringWeights,
    /// Field-level rule parameters.
    pub fields: FieldRules,
    /// Worker sizing for row validation.
    pub concurrency: ConcurrencyConfig,
    /// Upper bound on a whole run, in seconds (None = unbounded).
    pub timeout_secs: Option<u64>,
}

impl ValidationConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Missing sections fall back to their defaults. The loaded configuration
    /// is validated before it is returned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GroveError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: ValidationConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is internally consistent.
    pub fn validate(&self) -> Result<()> {
        let r = &self.region;
        if !(r.min_latitude < r.max_latitude) || !(r.min_longitude < r.max_longitude) {
            return Err(GroveError::Config(format!(
                "region bounds are inverted: lat [{}, {}], lon [{}, {}]",
                r.min_latitude, r.max_latitude, r.min_longitude, r.max_longitude
            )));
        }
        if !(self.duplicates.threshold_degrees >= MIN_THRESHOLD_DEGREES) {
            return Err(GroveError::Config(format!(
                "duplicate threshold must be at least {MIN_THRESHOLD_DEGREES} degrees, got {}",
                self.duplicates.threshold_degrees
            )));
        }
        if self.duplicates.lookup_concurrency == 0 {
            return Err(GroveError::Config(
                "lookup_concurrency must be at least 1".to_string(),
            ));
        }
        if self.concurrency.row_chunk_size == 0 {
            return Err(GroveError::Config(
                "row_chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured run timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Latitude/longitude box records must fall inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl RegionBounds {
    /// Whether a point lies inside the box (edges included).
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

impl Default for RegionBounds {
    /// Kazakhstan.
    fn default() -> Self {
        Self {
            min_latitude: 40.9,
            max_latitude: 55.4,
            min_longitude: 46.5,
            max_longitude: 87.4,
        }
    }
}

/// Parameters for near-duplicate matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    /// Planar distance in degrees below which two points are "near".
    ///
    /// 0.0001° is roughly 11 m at mid latitudes. This is an approximation
    /// over raw degrees, not a geodesic distance.
    pub threshold_degrees: f64,
    /// Conversion used only for human-readable distances in match reasons.
    pub meters_per_degree: f64,
    /// Maximum number of store lookups in flight at once.
    pub lookup_concurrency: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            threshold_degrees: 0.0001,
            meters_per_degree: 111_000.0,
            lookup_concurrency: 8,
        }
    }
}

/// Penalties (and the one bonus) applied by the quality scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub per_error: f64,
    pub missing_secondary_name: f64,
    pub missing_scientific_name: f64,
    pub missing_district: f64,
    pub missing_notes: f64,
    pub missing_responsible_org: f64,
    pub short_species_name: f64,
    pub short_notes: f64,
    pub binomial_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            per_error: 20.0,
            missing_secondary_name: 5.0,
            missing_scientific_name: 10.0,
            missing_district: 5.0,
            missing_notes: 3.0,
            missing_responsible_org: 5.0,
            short_species_name: 10.0,
            short_notes: 5.0,
            binomial_bonus: 5.0,
        }
    }
}

/// Field rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRules {
    /// Planting dates older than this many years produce a warning.
    pub ancient_after_years: i32,
    /// Notes shorter than this (in characters) are considered too short.
    pub min_notes_len: usize,
    /// Primary species names shorter than this are penalized.
    pub min_species_len: usize,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            ancient_after_years: 100,
            min_notes_len: 10,
            min_species_len: 3,
        }
    }
}

/// Worker sizing for row validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Rows handed to each blocking validation worker.
    pub row_chunk_size: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            row_chunk_size: 256,
        }
    }
}
