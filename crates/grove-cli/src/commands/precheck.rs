//! Precheck command - instant structural feedback on an import file.

use std::path::PathBuf;

use colored::Colorize;
use grove::precheck;

use super::read_import;

pub fn run(file: PathBuf, delimiter: char, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let import = read_import(&file, delimiter)?;
    let report = precheck(&import.headers, import.rows.len());

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_valid {
        println!(
            "{} {} ({} data rows)",
            "Structure OK:".green().bold(),
            file.display().to_string().white(),
            report.row_count
        );
    } else {
        println!(
            "{} {}",
            "Structure problems in".red().bold(),
            file.display().to_string().white()
        );
        for error in &report.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    report.into_result()?;
    Ok(())
}
