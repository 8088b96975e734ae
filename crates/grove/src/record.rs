//! Normalized record types produced by field validation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of geolocated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    #[default]
    Tree,
    Park,
    Alley,
    Garden,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        RecordType::Tree,
        RecordType::Park,
        RecordType::Alley,
        RecordType::Garden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Tree => "tree",
            RecordType::Park => "park",
            RecordType::Alley => "alley",
            RecordType::Garden => "garden",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or(())
    }
}

/// Condition of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Alive,
    AttentionNeeded,
    Dead,
    Removed,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 4] = [
        RecordStatus::Alive,
        RecordStatus::AttentionNeeded,
        RecordStatus::Dead,
        RecordStatus::Removed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Alive => "alive",
            RecordStatus::AttentionNeeded => "attention_needed",
            RecordStatus::Dead => "dead",
            RecordStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = ();

    /// Case-insensitive; `-` and spaces are read as `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s
            .trim()
            .to_lowercase()
            .replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or(())
    }
}

/// A row that passed field validation.
///
/// Coordinates always lie inside the configured region and the planting date
/// is never in the future. Optional strings are trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub species_primary: String,
    pub species_alt1: Option<String>,
    pub species_alt2: Option<String>,
    pub species_alt3: Option<String>,
    pub scientific_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub city_id: Uuid,
    pub district_id: Option<Uuid>,
    pub planting_date: NaiveDate,
    pub status: RecordStatus,
    pub notes: Option<String>,
    pub responsible_org: Option<String>,
}

impl NormalizedRecord {
    /// Case-insensitive comparison of primary species names.
    pub fn same_species(&self, other: &str) -> bool {
        self.species_primary.to_lowercase() == other.trim().to_lowercase()
    }
}
