//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use std::path::PathBuf;

/// sales-report - daily sales report job
///
/// Aggregates the day's orders into a report document, renders an hourly
/// sales chart, stores both and sends a notification with the headline
/// figures.
///
/// Examples:
///   sales-report --input orders.json
///   sales-report --input orders.json --report-date 2024-01-02
///   sales-report --input orders.json --all-records --dry-run
///   sales-report --input orders.json --webhook-url https://hooks.example.com/sales
///   sales-report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Orders export to read (JSON array, JSON Lines, or query response)
    ///
    /// Can also be set via ORDERS_FILE env var or .salesreport.toml config.
    #[arg(short, long, value_name = "FILE", env = "ORDERS_FILE")]
    pub input: Option<PathBuf>,

    /// Root directory of the report store
    #[arg(short, long, value_name = "DIR", env = "REPORTS_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Date the report is filed under (YYYY-MM-DD)
    ///
    /// Defaults to today. When given without --window-end, the window ends
    /// at midnight at the start of this date.
    #[arg(long, value_name = "DATE")]
    pub report_date: Option<NaiveDate>,

    /// End of the query window (YYYY-MM-DDTHH:MM:SS, exclusive)
    #[arg(long, value_name = "DATETIME", conflicts_with = "all_records")]
    pub window_end: Option<NaiveDateTime>,

    /// Length of the query window in hours
    #[arg(long, value_name = "HOURS", conflicts_with = "all_records")]
    pub window_hours: Option<u32>,

    /// Aggregate every record in the input, without a time window
    #[arg(long)]
    pub all_records: bool,

    /// Webhook that receives the notification
    ///
    /// When unset the notification is written to the log.
    #[arg(long, value_name = "URL", env = "REPORT_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Base URL the report store is served from
    #[arg(long, value_name = "URL")]
    pub public_base_url: Option<String>,

    /// Skip rendering the hourly sales chart
    #[arg(long)]
    pub no_chart: bool,

    /// Dry run: print the report JSON without storing or notifying
    #[arg(long)]
    pub dry_run: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salesreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .salesreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.window_hours == Some(0) {
            return Err("Window must be at least 1 hour".to_string());
        }

        // Validate webhook URL format (not needed for dry-run)
        if !self.dry_run {
            if let Some(ref url) = self.webhook_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err("Webhook URL must start with 'http://' or 'https://'".to_string());
                }
            }
        }

        if let Some(ref input) = self.input {
            if input.is_dir() {
                return Err(format!("Input path is a directory: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
