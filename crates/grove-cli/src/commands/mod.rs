//! CLI command implementations.

pub mod precheck;
pub mod validate;

use std::path::Path;

use grove::RawRow;

/// A tokenized import file.
pub struct ImportFile {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Read a delimited file with a header line into raw rows.
pub fn read_import(path: &Path, delimiter: char) -> Result<ImportFile, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| format!("Delimiter must be a single ASCII character, got '{delimiter}'"))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let values: Vec<&str> = record.iter().collect();
        rows.push(RawRow::from_pairs(&headers, &values));
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "Read import file");
    Ok(ImportFile { headers, rows })
}
