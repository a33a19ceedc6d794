//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salesreport.toml` files.

use crate::chart::MAX_CANVAS_SIDE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".salesreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Orders source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification settings.
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Chart settings.
    #[serde(default)]
    pub chart: ChartConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Orders source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Orders export file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Length of the query window in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            window_hours: default_window_hours(),
        }
    }
}

fn default_window_hours() -> u32 {
    24
}

/// Report storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the local object store.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Key prefix for report artifacts.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Base URL the stored reports are served from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            key_prefix: default_key_prefix(),
            public_base_url: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports-bucket")
}

fn default_key_prefix() -> String {
    "reports/daily".to_string()
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Webhook endpoint. Notifications are logged when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Webhook request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Subject line prefix, followed by the report date.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_seconds: default_timeout(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_subject_prefix() -> String {
    crate::report::DEFAULT_SUBJECT_PREFIX.to_string()
}

/// Chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Render the hourly sales chart.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Canvas width in pixels.
    #[serde(default = "default_chart_width")]
    pub width: u32,

    /// Canvas height in pixels.
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_chart_width() -> u32 {
    1000
}

fn default_chart_height() -> u32 {
    600
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.source.path = Some(input.clone());
        }
        if let Some(hours) = args.window_hours {
            self.source.window_hours = hours;
        }

        if let Some(ref dir) = args.output_dir {
            self.storage.output_dir = dir.clone();
        }
        if let Some(ref url) = args.public_base_url {
            self.storage.public_base_url = Some(url.clone());
        }

        if let Some(ref url) = args.webhook_url {
            self.notification.webhook_url = Some(url.clone());
        }

        // Flags always override
        if args.no_chart {
            self.chart.enabled = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.source.window_hours == 0 {
            return Err("[source] window_hours must be at least 1".to_string());
        }

        if self.notification.timeout_seconds == 0 {
            return Err("[notification] timeout_seconds must be at least 1".to_string());
        }

        if let Some(ref url) = self.notification.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(
                    "[notification] webhook_url must start with 'http://' or 'https://'"
                        .to_string(),
                );
            }
        }

        // Canvases too small to lay out are reported by the renderer
        let oversized = self.chart.width > MAX_CANVAS_SIDE || self.chart.height > MAX_CANVAS_SIDE;
        if self.chart.enabled && oversized {
            return Err(format!(
                "[chart] width and height must be at most {} pixels, got {}x{}",
                MAX_CANVAS_SIDE, self.chart.width, self.chart.height
            ));
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
