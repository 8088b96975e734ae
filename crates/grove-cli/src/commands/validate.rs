//! Validate command - run the full validation pipeline over an import file.

use std::collections::HashMap;

use colored::Colorize;
use grove::{
    BatchOptions, BatchOrchestrator, DuplicateOf, FieldIssue, InMemoryLookup, ValidationConfig,
    ValidationResult, precheck,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::read_import;
use crate::cli::ValidateArgs;

/// Issues listed per section before truncating, unless verbose.
const LISTED_ISSUES: usize = 20;

pub async fn run(
    args: ValidateArgs,
    cancel: CancellationToken,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args)?;

    let import = read_import(&args.file, args.delimiter)?;
    precheck(&import.headers, import.rows.len()).into_result()?;

    let options = if args.preview {
        BatchOptions::preview()
    } else {
        BatchOptions::full()
            .with_skip_duplicates(args.skip_duplicates)
            .with_min_quality_score(args.min_quality)
    };

    if !args.json {
        println!(
            "{} {} ({} rows)",
            "Validating".cyan().bold(),
            args.file.display().to_string().white(),
            import.rows.len()
        );
    }

    let result = match &args.existing {
        Some(path) if !args.preview => {
            let lookup = InMemoryLookup::load(path)?;
            info!(records = lookup.len(), "Loaded existing records");
            BatchOrchestrator::with_lookup(config, lookup)?
                .run(import.rows, &options, &cancel)
                .await?
        }
        _ => {
            BatchOrchestrator::new(config)?
                .run(import.rows, &options, &cancel)
                .await?
        }
    };

    if let Some(output) = &args.output {
        std::fs::write(output, serde_json::to_string_pretty(&result)?)?;
        if !args.json {
            println!("Wrote result to {}", output.display().to_string().white());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, verbose);
    }

    Ok(())
}

fn load_config(args: &ValidateArgs) -> Result<ValidationConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ValidationConfig::load(path)?,
        None => ValidationConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.duplicates.threshold_degrees = threshold;
    }
    if let Some(secs) = args.timeout {
        config.timeout_secs = Some(secs);
    }
    Ok(config)
}

fn print_summary(result: &ValidationResult, verbose: bool) {
    let s = &result.summary;
    println!();
    println!("{}", "Rows:".yellow().bold());
    println!("  Total:      {}", s.total_rows.to_string().white().bold());
    println!("  Valid:      {}", s.valid.to_string().green());
    println!("  Invalid:    {}", s.invalid.to_string().red());
    if s.filtered_out > 0 {
        println!("  Low score:  {}", s.filtered_out.to_string().yellow());
    }
    if s.skipped_duplicates > 0 {
        println!("  Duplicates: {} skipped", s.skipped_duplicates.to_string().magenta());
    }
    if s.blank_rows > 0 {
        println!("  Blank:      {}", s.blank_rows);
    }
    println!();

    let stats = &result.stats;
    let average = if stats.average_score >= 80 {
        stats.average_score.to_string().green()
    } else if stats.average_score >= 50 {
        stats.average_score.to_string().yellow()
    } else {
        stats.average_score.to_string().red()
    };
    println!(
        "Quality score: {} average (min {}, max {})",
        average, stats.min_score, stats.max_score
    );

    let limit = if verbose { usize::MAX } else { LISTED_ISSUES };

    if !result.invalid.is_empty() {
        println!();
        println!("{}", "Invalid rows:".red().bold());
        for row in result.invalid.iter().take(limit) {
            let messages: Vec<String> = row.errors.iter().map(describe_issue).collect();
            println!("  Row {}: {}", row.row_number, messages.join("; "));
        }
        print_truncated(result.invalid.len(), limit);
    }

    if !result.duplicates.is_empty() {
        // Duplicate matches refer to positions among valid rows.
        let row_numbers: HashMap<usize, usize> = result
            .valid
            .iter()
            .chain(&result.filtered_out)
            .chain(&result.skipped_duplicates)
            .map(|row| (row.index, row.row_number))
            .collect();
        let line = |index: usize| row_numbers.get(&index).copied().unwrap_or(index);

        println!();
        println!("{}", "Possible duplicates:".magenta().bold());
        for m in result.duplicates.iter().take(limit) {
            let of = match &m.duplicate_of {
                DuplicateOf::IntraBatch { index } => format!("row {}", line(*index)),
                DuplicateOf::ExternalStore { record } => format!("existing record {}", record.id),
            };
            println!(
                "  Row {} ~ {} ({:.0}% similar)",
                line(m.row),
                of,
                m.similarity_percent
            );
        }
        print_truncated(result.duplicates.len(), limit);
    }

    if verbose {
        let warned: Vec<_> = result.valid.iter().filter(|r| !r.warnings.is_empty()).collect();
        if !warned.is_empty() {
            println!();
            println!("{}", "Warnings:".yellow().bold());
            for row in warned {
                let messages: Vec<String> = row.warnings.iter().map(describe_issue).collect();
                println!(
                    "  Row {} (score {}): {}",
                    row.row_number,
                    row.quality_score,
                    messages.join("; ")
                );
            }
        }
    }
}

/// `[Label] message`, e.g. `[Out Of Range] latitude must be between -90 and 90`.
fn describe_issue(issue: &FieldIssue) -> String {
    format!("[{}] {}", issue.code.label(), issue)
}

fn print_truncated(total: usize, limit: usize) {
    if total > limit {
        println!("  ... and {} more (use --verbose to list all)", total - limit);
    }
}
