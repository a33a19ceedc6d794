//! Job-level errors and exit codes.

use crate::analysis::AggregateError;
use crate::chart::ChartError;
use crate::publish::PublishError;
use crate::source::SourceError;

/// The run failed and will fail again until the input or config changes.
pub const EXIT_PERMANENT: i32 = 1;
/// The run failed on I/O or the network and may succeed if retried.
pub const EXIT_TRANSIENT: i32 = 2;

/// Failure of a report run.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("chart rendering failed: {0}")]
    Chart(#[from] ChartError),

    #[error("publishing failed: {0}")]
    Publish(#[from] PublishError),
}

impl JobError {
    pub fn is_transient(&self) -> bool {
        match self {
            JobError::Config(_) | JobError::Aggregate(_) | JobError::Chart(_) => false,
            JobError::Source(e) => e.is_transient(),
            JobError::Publish(e) => e.is_transient(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_transient() {
            EXIT_TRANSIENT
        } else {
            EXIT_PERMANENT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let config = JobError::Config("no input".to_string());
        assert_eq!(config.exit_code(), EXIT_PERMANENT);

        let overflow = JobError::from(AggregateError::RevenueOverflow { index: 3 });
        assert!(!overflow.is_transient());
        assert_eq!(overflow.exit_code(), EXIT_PERMANENT);

        let io = JobError::from(SourceError::Io {
            path: PathBuf::from("orders.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });
        assert_eq!(io.exit_code(), EXIT_TRANSIENT);

        let store = JobError::from(PublishError::Store {
            key: "reports/daily/2024-01-02.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        });
        assert_eq!(store.exit_code(), EXIT_TRANSIENT);
    }

    #[test]
    fn test_source_message_is_passed_through() {
        let err = JobError::from(SourceError::UnexpectedShape {
            path: PathBuf::from("orders.json"),
        });
        assert!(err.to_string().starts_with("orders in orders.json"));
    }
}
