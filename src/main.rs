//! sales-report - daily sales report job
//!
//! Reads the day's orders, aggregates them into a report document, renders
//! an hourly sales chart, stores both and sends a notification.
//!
//! Exit codes:
//!   0 - Success (report stored and notification sent, or dry run printed)
//!   1 - Permanent failure (bad config, malformed input, overflow, HTTP 4xx)
//!   2 - Transient failure (I/O, timeouts, connection errors, HTTP 5xx); retry later

mod analysis;
mod chart;
mod cli;
mod config;
mod error;
mod job;
mod models;
mod publish;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Local;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use error::{JobError, EXIT_PERMANENT};
use job::JobPlan;
use publish::{ConfiguredNotifier, LocalObjectStore, PublishError, PublishSettings, ReportPublisher};
use source::FileOrderSource;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_PERMANENT);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so the config file can turn on verbose output
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_PERMANENT);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("sales-report v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args, &config).await {
        error!("Report run failed: {}", e);
        if e.is_transient() {
            error!("The failure looks transient; the run can be retried");
        }
        std::process::exit(e.exit_code());
    }

    Ok(())
}

/// Handle --init-config: generate a default .salesreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(EXIT_PERMANENT);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("Edit it to set the orders input, report store and webhook.");
    Ok(())
}

/// Initialize logging on stderr; `RUST_LOG` overrides the verbosity flags.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
///
/// Returns the path the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(DEFAULT_CONFIG_FILE)))),
        None => Ok((Config::default(), None)),
    }
}

/// Run the complete report workflow.
async fn run(args: &Args, config: &Config) -> Result<(), JobError> {
    let plan = JobPlan::resolve(args, config, Local::now().naive_local())?;
    debug!("Plan: {:?}", plan);

    let source = FileOrderSource::new(plan.input.clone());
    info!("Reading orders from {}", source.path().display());
    let prepared = job::prepare(&source, &plan)?;

    // Handle --dry-run: print the report and stop
    if plan.dry_run {
        let json = report::generate_json_report(&prepared.report).map_err(PublishError::from)?;
        println!("{}", json);
        info!("Dry run complete, nothing was published");
        return Ok(());
    }

    let store = LocalObjectStore::new(config.storage.output_dir.clone());
    info!("Storing reports under {}", store.root().display());
    let notifier = ConfiguredNotifier::from_config(&config.notification)?;
    let publisher = ReportPublisher::new(store, notifier, PublishSettings::from(config));

    let summary = job::publish(&publisher, &prepared).await?;

    let json = serde_json::to_string_pretty(&summary).map_err(PublishError::from)?;
    println!("{}", json);
    Ok(())
}
