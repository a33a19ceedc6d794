//! Order record sources.
//!
//! The job reads its orders through [`OrderSource`]. The file-backed source
//! reads an export of the orders table (JSON array, JSON Lines, or a query
//! response object with an `Items` array) and selects the records of the
//! requested time window the way a timestamp sort-key index does: by ISO
//! string range.

use crate::models::OrderRecord;
use chrono::{Duration, NaiveDateTime};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Half-open time window `[start, end)` of local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// The `hours` long window ending at `end`. `None` if it underflows the calendar.
    pub fn ending_at(end: NaiveDateTime, hours: u32) -> Option<Self> {
        let start = end.checked_sub_signed(Duration::hours(i64::from(hours)))?;
        Some(Self { start, end })
    }

    /// Whether a stored timestamp string falls in the window.
    pub fn contains_key(&self, timestamp: &str) -> bool {
        let start = self.start.format(KEY_FORMAT).to_string();
        let end = self.end.format(KEY_FORMAT).to_string();
        timestamp >= start.as_str() && timestamp < end.as_str()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format(KEY_FORMAT),
            self.end.format(KEY_FORMAT)
        )
    }
}

/// Failure while loading orders.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read orders from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse orders in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse orders in {} at line {line}: {source}", path.display())]
    ParseLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("orders in {} must be a JSON array, JSON Lines, or an object with an \"Items\" array", path.display())]
    UnexpectedShape { path: PathBuf },
}

impl SourceError {
    /// I/O failures may clear up on a later run; malformed exports will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Io { .. })
    }
}

/// Supplier of order records.
pub trait OrderSource {
    /// Fetch the orders in `window`, or every order when `window` is `None`.
    fn fetch(&self, window: Option<&TimeWindow>) -> Result<Vec<OrderRecord>, SourceError>;
}

/// Orders exported to a local file.
#[derive(Debug, Clone)]
pub struct FileOrderSource {
    path: PathBuf,
}

impl FileOrderSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the raw export into JSON values, one per order.
    fn read_values(&self) -> Result<Vec<Value>, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        let trimmed = content.trim_start();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Array(items)) => return Ok(items),
                Ok(Value::Object(mut map)) => {
                    return match map.remove("Items") {
                        Some(Value::Array(items)) => Ok(items),
                        Some(_) => Err(SourceError::UnexpectedShape {
                            path: self.path.clone(),
                        }),
                        // a single-line JSON Lines file holding one order
                        None => Ok(vec![Value::Object(map)]),
                    };
                }
                Ok(_) => {
                    return Err(SourceError::UnexpectedShape {
                        path: self.path.clone(),
                    })
                }
                // several objects, one per line
                Err(_) if trimmed.starts_with('{') => {}
                Err(source) => {
                    return Err(SourceError::Parse {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        }

        self.read_lines(&content)
    }

    fn read_lines(&self, content: &str) -> Result<Vec<Value>, SourceError> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| SourceError::ParseLine {
                    path: self.path.clone(),
                    line: index + 1,
                    source,
                })
            })
            .collect()
    }
}

impl OrderSource for FileOrderSource {
    fn fetch(&self, window: Option<&TimeWindow>) -> Result<Vec<OrderRecord>, SourceError> {
        let values = self.read_values()?;
        let available = values.len();

        let orders: Vec<OrderRecord> = values
            .iter()
            .filter(|value| match window {
                Some(window) => value
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .is_some_and(|ts| window.contains_key(ts)),
                None => true,
            })
            .map(OrderRecord::from_value)
            .collect();

        match window {
            Some(window) => info!(
                "Loaded {} of {} orders in window {} from {}",
                orders.len(),
                available,
                window,
                self.path.display()
            ),
            None => info!("Loaded {} orders from {}", orders.len(), self.path.display()),
        }
        debug!(path = %self.path.display(), available, selected = orders.len(), "Order fetch complete");

        Ok(orders)
    }
}
