//! Canonical (normalized) column names.

pub const TYPE: &str = "type";
/// Primary species name (Russian).
pub const SPECIES_PRIMARY: &str = "species_ru";
/// Kazakh species name.
pub const SPECIES_ALT1: &str = "species_kz";
/// English species name.
pub const SPECIES_ALT2: &str = "species_en";
/// Free local alias.
pub const SPECIES_ALT3: &str = "species_alt";
pub const SCIENTIFIC_NAME: &str = "species_latin";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const CITY_ID: &str = "city_id";
pub const DISTRICT_ID: &str = "district_id";
pub const PLANTING_DATE: &str = "planting_date";
pub const STATUS: &str = "status";
pub const NOTES: &str = "notes";
pub const RESPONSIBLE_ORG: &str = "responsible_org";

/// Columns every submission must carry, in reporting order.
pub const REQUIRED: [&str; 5] = [LATITUDE, LONGITUDE, SPECIES_PRIMARY, CITY_ID, PLANTING_DATE];
