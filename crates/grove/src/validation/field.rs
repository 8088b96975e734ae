//! Field-level validation of a single raw row.

use chrono::{Datelike, Months, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::config::{FieldRules, RegionBounds, ValidationConfig};
use crate::input::{RawRow, columns};
use crate::record::{NormalizedRecord, RecordStatus, RecordType};

use super::issue::{FieldIssue, IssueCode};
use super::outcome::{InvalidRow, RowOutcome};

// Canonical 8-4-4-4-12 identifier; `Uuid::parse_str` alone also accepts
// braced, URN and dash-less forms.
static CANONICAL_UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Validates one raw row against the field rules.
#[derive(Debug, Clone)]
pub struct FieldValidator {
    region: RegionBounds,
    rules: FieldRules,
    today: NaiveDate,
}

impl FieldValidator {
    /// Create a validator using today's UTC date as "now".
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            region: config.region.clone(),
            rules: config.fields.clone(),
            today: Utc::now().date_naive(),
        }
    }

    /// Pin the date planting dates are compared against.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Validate a row.
    ///
    /// `row_number` is the source line reported for invalid rows. Returns
    /// `None` for blank rows, which are skipped without being counted as
    /// either valid or invalid.
    pub fn validate(&self, row_number: usize, raw: &RawRow) -> Option<RowOutcome> {
        if raw.is_blank() {
            return None;
        }

        let missing: Vec<FieldIssue> = columns::REQUIRED
            .iter()
            .filter(|col| raw.get(col).is_none())
            .map(|col| FieldIssue::error(IssueCode::Required, *col, format!("{col} is required")))
            .collect();
        if !missing.is_empty() {
            return Some(invalid(row_number, raw, missing));
        }

        let mut errors = Vec::new();

        let latitude = parse_coordinate(raw, columns::LATITUDE, 90.0, &mut errors);
        let longitude = parse_coordinate(raw, columns::LONGITUDE, 180.0, &mut errors);
        if let (Some(lat), Some(lon)) = (latitude, longitude) {
            if !self.region.contains(lat, lon) {
                errors.push(
                    FieldIssue::error(
                        IssueCode::OutsideRegion,
                        columns::LATITUDE,
                        "coordinates outside allowed region",
                    )
                    .without_field(),
                );
            }
        }

        let mut warnings = Vec::new();
        let planting_date = self.check_planting_date(raw, &mut errors, &mut warnings);

        let record_type = match raw.get(columns::TYPE) {
            None => Some(RecordType::default()),
            Some(v) => v.parse().ok().or_else(|| {
                errors.push(FieldIssue::error(
                    IssueCode::InvalidEnum,
                    columns::TYPE,
                    format!("type must be one of: tree, park, alley, garden (got '{v}')"),
                ));
                None
            }),
        };

        let status = match raw.get(columns::STATUS) {
            None => Some(RecordStatus::default()),
            Some(v) => v.parse().ok().or_else(|| {
                errors.push(FieldIssue::error(
                    IssueCode::InvalidEnum,
                    columns::STATUS,
                    format!(
                        "status must be one of: alive, attention_needed, dead, removed (got '{v}')"
                    ),
                ));
                None
            }),
        };

        let city_id = parse_identifier(raw, columns::CITY_ID, &mut errors);
        let district_id = parse_identifier(raw, columns::DISTRICT_ID, &mut errors);

        if !errors.is_empty() {
            return Some(invalid(row_number, raw, errors));
        }

        // Every required value parsed, so the options below are all Some.
        let (
            Some(latitude),
            Some(longitude),
            Some(planting_date),
            Some(record_type),
            Some(status),
            Some(city_id),
        ) = (latitude, longitude, planting_date, record_type, status, city_id)
        else {
            return Some(invalid(row_number, raw, errors));
        };

        let record = NormalizedRecord {
            record_type,
            species_primary: raw.get(columns::SPECIES_PRIMARY).unwrap_or_default().to_string(),
            species_alt1: optional(raw, columns::SPECIES_ALT1),
            species_alt2: optional(raw, columns::SPECIES_ALT2),
            species_alt3: optional(raw, columns::SPECIES_ALT3),
            scientific_name: optional(raw, columns::SCIENTIFIC_NAME),
            latitude,
            longitude,
            city_id,
            district_id,
            planting_date,
            status,
            notes: optional(raw, columns::NOTES),
            responsible_org: optional(raw, columns::RESPONSIBLE_ORG),
        };

        self.collect_warnings(&record, &mut warnings);

        Some(RowOutcome::Valid { record, warnings })
    }

    fn check_planting_date(
        &self,
        raw: &RawRow,
        errors: &mut Vec<FieldIssue>,
        warnings: &mut Vec<FieldIssue>,
    ) -> Option<NaiveDate> {
        let value = raw.get(columns::PLANTING_DATE)?;
        let Some(date) = parse_date(value) else {
            errors.push(FieldIssue::error(
                IssueCode::InvalidDate,
                columns::PLANTING_DATE,
                format!("planting_date '{value}' is not a valid date (expected YYYY-MM-DD)"),
            ));
            return None;
        };

        if date > self.today {
            errors.push(FieldIssue::error(
                IssueCode::FutureDate,
                columns::PLANTING_DATE,
                "planting_date cannot be in the future",
            ));
            return None;
        }

        let limit = self.rules.ancient_after_years;
        if years_before(self.today, limit).is_some_and(|cutoff| date < cutoff) {
            let years = whole_years_between(date, self.today);
            warnings.push(FieldIssue::warning(
                IssueCode::AncientDate,
                columns::PLANTING_DATE,
                format!("planting date is {years} years in the past"),
            ));
        }

        Some(date)
    }

    fn collect_warnings(&self, record: &NormalizedRecord, warnings: &mut Vec<FieldIssue>) {
        if record.species_alt1.is_none() {
            warnings.push(missing(columns::SPECIES_ALT1, "Kazakh species name is missing"));
        }
        if record.species_alt2.is_none() {
            warnings.push(missing(columns::SPECIES_ALT2, "English species name is missing"));
        }
        if record.scientific_name.is_none() {
            warnings.push(missing(columns::SCIENTIFIC_NAME, "scientific name is missing"));
        }
        if record.district_id.is_none() {
            warnings.push(missing(columns::DISTRICT_ID, "district is missing"));
        }
        match &record.notes {
            None => warnings.push(missing(columns::NOTES, "notes are missing")),
            Some(notes) if notes.chars().count() < self.rules.min_notes_len => {
                warnings.push(FieldIssue::warning(
                    IssueCode::ShortNotes,
                    columns::NOTES,
                    format!(
                        "notes are shorter than {} characters",
                        self.rules.min_notes_len
                    ),
                ));
            }
            Some(_) => {}
        }
    }
}

fn invalid(row_number: usize, raw: &RawRow, errors: Vec<FieldIssue>) -> RowOutcome {
    RowOutcome::Invalid(InvalidRow {
        row_number,
        raw: raw.clone(),
        errors,
    })
}

fn missing(field: &str, message: &str) -> FieldIssue {
    FieldIssue::warning(IssueCode::MissingOptional, field, message)
}

fn optional(raw: &RawRow, column: &str) -> Option<String> {
    raw.get(column).map(str::to_string)
}

/// Parse a coordinate and check it against `[-limit, limit]`.
fn parse_coordinate(
    raw: &RawRow,
    column: &str,
    limit: f64,
    errors: &mut Vec<FieldIssue>,
) -> Option<f64> {
    let value = raw.get(column)?;
    // Decimal commas are common in spreadsheet exports.
    let parsed = value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite());

    let Some(number) = parsed else {
        errors.push(FieldIssue::error(
            IssueCode::InvalidNumber,
            column,
            format!("{column} '{value}' is not a number"),
        ));
        return None;
    };

    if !(-limit..=limit).contains(&number) {
        errors.push(FieldIssue::error(
            IssueCode::OutOfRange,
            column,
            format!("{column} must be between -{limit} and {limit}"),
        ));
        return None;
    }

    Some(number)
}

fn parse_identifier(raw: &RawRow, column: &str, errors: &mut Vec<FieldIssue>) -> Option<Uuid> {
    let value = raw.get(column)?;
    let parsed = CANONICAL_UUID
        .is_match(value)
        .then(|| Uuid::parse_str(value).ok())
        .flatten();

    if parsed.is_none() {
        errors.push(FieldIssue::error(
            IssueCode::InvalidIdentifier,
            column,
            format!("{column} '{value}' is not a valid identifier"),
        ));
    }
    parsed
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// The same calendar day `years` years before `day`; Feb 29 falls back to Feb 28.
fn years_before(day: NaiveDate, years: i32) -> Option<NaiveDate> {
    day.year()
        .checked_sub(years)
        .and_then(|year| day.with_year(year))
        .or_else(|| {
            let months = u32::try_from(years).ok()?.checked_mul(12)?;
            day.checked_sub_months(Months::new(months))
        })
}

/// Completed years from `earlier` to `later`.
fn whole_years_between(earlier: NaiveDate, later: NaiveDate) -> i32 {
    let mut years = later.year() - earlier.year();
    if (later.month(), later.day()) < (earlier.month(), earlier.day()) {
        years -= 1;
    }
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Severity;

    const CITY: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn validator() -> FieldValidator {
        FieldValidator::new(&ValidationConfig::default()).with_today(today())
    }

    fn base_row() -> RawRow {
        RawRow::new()
            .with("latitude", "43.2220")
            .with("longitude", "76.8512")
            .with("species_ru", "Береза")
            .with("city_id", CITY)
            .with("planting_date", "2024-01-15")
    }

    fn errors_of(outcome: Option<RowOutcome>) -> Vec<FieldIssue> {
        match outcome {
            Some(RowOutcome::Invalid(invalid)) => invalid.errors,
            other => panic!("expected invalid outcome, got {other:?}"),
        }
    }

    fn valid_of(outcome: Option<RowOutcome>) -> (NormalizedRecord, Vec<FieldIssue>) {
        match outcome {
            Some(RowOutcome::Valid { record, warnings }) => (record, warnings),
            other => panic!("expected valid outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_row_is_valid_with_defaults() {
        let (record, warnings) = valid_of(validator().validate(2, &base_row()));
        assert_eq!(record.record_type, RecordType::Tree);
        assert_eq!(record.status, RecordStatus::Alive);
        assert_eq!(record.species_primary, "Береза");
        assert_eq!(record.latitude, 43.222);
        assert!(record.notes.is_none());
        assert!(warnings.iter().all(|w| w.severity == Severity::Warning));
        // kz, en, latin, district, notes
        assert_eq!(warnings.len(), 5);
    }

    #[test]
    fn test_blank_row_is_skipped() {
        let row = RawRow::from_pairs(&["latitude", "longitude", "notes"], &["", "  ", "\t"]);
        assert!(validator().validate(5, &row).is_none());
    }

    #[test]
    fn test_missing_required_short_circuits() {
        // An invalid longitude is not reported while a required field is missing.
        let row = RawRow::new()
            .with("longitude", "999")
            .with("species_ru", "Береза")
            .with("city_id", "nope")
            .with("planting_date", "2024-01-15");
        let errors = errors_of(validator().validate(3, &row));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "latitude is required");
        assert_eq!(errors[0].code, IssueCode::Required);
    }

    #[test]
    fn test_one_error_per_missing_field() {
        let row = RawRow::new().with("notes", "something long enough");
        let errors = errors_of(validator().validate(2, &row));
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().all(|e| e.code == IssueCode::Required));
    }

    #[test]
    fn test_invalid_row_keeps_number_and_raw() {
        let row = base_row().with("latitude", "abc");
        match validator().validate(7, &row) {
            Some(RowOutcome::Invalid(invalid)) => {
                assert_eq!(invalid.row_number, 7);
                assert_eq!(invalid.raw, row);
                assert_eq!(invalid.errors[0].code, IssueCode::InvalidNumber);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_latitude_boundaries() {
        let mut config = ValidationConfig::default();
        config.region = RegionBounds {
            min_latitude: -90.0,
            max_latitude: 90.0,
            min_longitude: -180.0,
            max_longitude: 180.0,
        };
        let v = FieldValidator::new(&config).with_today(today());

        assert!(v.validate(2, &base_row().with("latitude", "90")).unwrap().is_valid());
        assert!(v.validate(2, &base_row().with("latitude", "-90")).unwrap().is_valid());

        let errors = errors_of(v.validate(2, &base_row().with("latitude", "90.0001")));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, IssueCode::OutOfRange);
        assert_eq!(errors[0].message, "latitude must be between -90 and 90");
    }

    #[test]
    fn test_outside_region_is_distinct_error() {
        let row = base_row().with("latitude", "48.8566").with("longitude", "2.3522");
        let errors = errors_of(validator().validate(2, &row));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, IssueCode::OutsideRegion);
        assert_eq!(errors[0].message, "coordinates outside allowed region");
    }

    #[test]
    fn test_decimal_comma_accepted() {
        let (record, _) = valid_of(validator().validate(2, &base_row().with("latitude", "43,5")));
        assert_eq!(record.latitude, 43.5);
    }

    #[test]
    fn test_nan_is_not_a_number() {
        let errors = errors_of(validator().validate(2, &base_row().with("longitude", "NaN")));
        assert_eq!(errors[0].code, IssueCode::InvalidNumber);
    }

    #[test]
    fn test_planting_date_today_valid_tomorrow_invalid() {
        let v = validator();
        assert!(v.validate(2, &base_row().with("planting_date", "2025-06-15")).unwrap().is_valid());

        let errors = errors_of(v.validate(2, &base_row().with("planting_date", "2025-06-16")));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, IssueCode::FutureDate);
    }

    #[test]
    fn test_alternate_date_formats() {
        let v = validator();
        let (record, _) = valid_of(v.validate(2, &base_row().with("planting_date", "15.01.2024")));
        assert_eq!(record.planting_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let (record, _) = valid_of(v.validate(2, &base_row().with("planting_date", "2024/01/15")));
        assert_eq!(record.planting_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let errors = errors_of(v.validate(2, &base_row().with("planting_date", "2024-02-30")));
        assert_eq!(errors[0].code, IssueCode::InvalidDate);
    }

    #[test]
    fn test_ancient_date_is_warning() {
        let (_, warnings) =
            valid_of(validator().validate(2, &base_row().with("planting_date", "1875-06-15")));
        let ancient = warnings
            .iter()
            .find(|w| w.code == IssueCode::AncientDate)
            .expect("ancient warning");
        assert!(ancient.message.contains("150 years"));
    }

    #[test]
    fn test_exactly_hundred_years_is_not_flagged() {
        let (_, warnings) =
            valid_of(validator().validate(2, &base_row().with("planting_date", "1925-06-15")));
        assert!(warnings.iter().all(|w| w.code != IssueCode::AncientDate));
    }

    #[test]
    fn test_one_day_past_hundred_years_is_flagged() {
        let (_, warnings) =
            valid_of(validator().validate(2, &base_row().with("planting_date", "1925-06-14")));
        let ancient = warnings
            .iter()
            .find(|w| w.code == IssueCode::AncientDate)
            .expect("ancient warning");
        assert!(ancient.message.contains("100 years"));

        let (_, warnings) =
            valid_of(validator().validate(2, &base_row().with("planting_date", "1924-06-16")));
        assert!(warnings.iter().any(|w| w.code == IssueCode::AncientDate));
    }

    #[test]
    fn test_ancient_cutoff_on_leap_day() {
        let mut config = ValidationConfig::default();
        config.fields.ancient_after_years = 1;
        let v = FieldValidator::new(&config).with_today(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, warnings) = valid_of(v.validate(2, &base_row().with("planting_date", "2023-02-27")));
        assert!(warnings.iter().any(|w| w.code == IssueCode::AncientDate));
        let (_, warnings) = valid_of(v.validate(2, &base_row().with("planting_date", "2023-02-28")));
        assert!(warnings.iter().all(|w| w.code != IssueCode::AncientDate));
    }

    #[test]
    fn test_years_before() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(years_before(d(2025, 6, 15), 100), Some(d(1925, 6, 15)));
        assert_eq!(years_before(d(2024, 2, 29), 1), Some(d(2023, 2, 28)));
        assert_eq!(years_before(d(2024, 2, 29), 4), Some(d(2020, 2, 29)));
    }

    #[test]
    fn test_enum_fields_case_insensitive() {
        let row = base_row().with("type", "ALLEY").with("status", "Dead");
        let (record, _) = valid_of(validator().validate(2, &row));
        assert_eq!(record.record_type, RecordType::Alley);
        assert_eq!(record.status, RecordStatus::Dead);

        let errors = errors_of(validator().validate(2, &base_row().with("type", "forest")));
        assert_eq!(errors[0].code, IssueCode::InvalidEnum);
        assert_eq!(errors[0].field.as_deref(), Some("type"));
    }

    #[test]
    fn test_identifier_format() {
        let v = validator();
        let upper = CITY.to_uppercase();
        assert!(v.validate(2, &base_row().with("city_id", &upper)).unwrap().is_valid());

        for bad in ["3f2504e04f8911d39a0c0305e82c3301", "{3f2504e0-4f89-11d3-9a0c-0305e82c3301}", "42"] {
            let errors = errors_of(v.validate(2, &base_row().with("city_id", bad)));
            assert_eq!(errors[0].code, IssueCode::InvalidIdentifier, "{bad}");
        }

        let errors = errors_of(v.validate(2, &base_row().with("district_id", "district-1")));
        assert_eq!(errors[0].field.as_deref(), Some("district_id"));
    }

    #[test]
    fn test_multiple_errors_collected() {
        let row = base_row()
            .with("latitude", "100")
            .with("status", "sick")
            .with("city_id", "x");
        let errors = errors_of(validator().validate(2, &row));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_optional_strings_trimmed_and_absent_when_empty() {
        let row = base_row()
            .with("species_kz", "  Қайың ")
            .with("species_en", "   ")
            .with("notes", " Planted by volunteers ");
        let (record, warnings) = valid_of(validator().validate(2, &row));
        assert_eq!(record.species_alt1.as_deref(), Some("Қайың"));
        assert!(record.species_alt2.is_none());
        assert_eq!(record.notes.as_deref(), Some("Planted by volunteers"));
        assert!(warnings.iter().all(|w| w.field.as_deref() != Some("notes")));
    }

    #[test]
    fn test_short_notes_warning() {
        let (_, warnings) = valid_of(validator().validate(2, &base_row().with("notes", "ok")));
        assert!(warnings.iter().any(|w| w.code == IssueCode::ShortNotes));
    }

    #[test]
    fn test_whole_years_between() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(whole_years_between(d(2000, 6, 15), d(2025, 6, 15)), 25);
        assert_eq!(whole_years_between(d(2000, 6, 16), d(2025, 6, 15)), 24);
    }
}
