//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Grove: validate bulk imports of trees and green spaces
#[derive(Parser)]
#[command(name = "grove")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging, every issue listed)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check headers and row count without validating rows
    Precheck {
        /// Path to the import file (CSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Field delimiter
        #[arg(short, long, default_value_t = ',')]
        delimiter: char,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate, score and look for duplicates
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the import file (CSV)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    pub delimiter: char,

    /// JSON file of records already on file, checked for duplicates
    #[arg(long, value_name = "JSON")]
    pub existing: Option<PathBuf>,

    /// Skip the store pass and all post-filters
    #[arg(long, conflicts_with_all = ["skip_duplicates", "min_quality"])]
    pub preview: bool,

    /// Drop rows reported as duplicates from the valid set
    #[arg(long)]
    pub skip_duplicates: bool,

    /// Move valid rows scoring below this into the filtered set
    #[arg(long, value_name = "SCORE", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub min_quality: Option<u8>,

    /// Duplicate proximity threshold in degrees
    #[arg(long, value_name = "DEGREES")]
    pub threshold: Option<f64>,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Validation config file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the full result as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the full result as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_args(argv: &[&str]) -> ValidateArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Validate(args) => args,
            Commands::Precheck { .. } => panic!("expected validate"),
        }
    }

    #[test]
    fn test_validate_flags() {
        let args = validate_args(&[
            "grove",
            "validate",
            "trees.csv",
            "--skip-duplicates",
            "--min-quality",
            "60",
            "--threshold",
            "0.00015",
        ]);
        assert!(args.skip_duplicates);
        assert_eq!(args.min_quality, Some(60));
        assert_eq!(args.threshold, Some(0.00015));
        assert!(!args.preview);
        assert_eq!(args.delimiter, ',');
    }

    #[test]
    fn test_preview_conflicts_with_filters() {
        let result = Cli::try_parse_from(["grove", "validate", "a.csv", "--preview", "--skip-duplicates"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_min_quality_range() {
        let result = Cli::try_parse_from(["grove", "validate", "a.csv", "--min-quality", "101"]);
        assert!(result.is_err());
    }
}
