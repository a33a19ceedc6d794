//! Report publishing.
//!
//! The publisher stores the report document and its charts under
//! date-based keys, then sends a notification pointing at the report.
//! Storage and notification clients are injected, never global.

pub mod notify;
pub mod store;

pub use notify::{ConfiguredNotifier, Notification, Notifier};
pub use store::{LocalObjectStore, ObjectStore};

use crate::chart::ChartArtifact;
use crate::config::Config;
use crate::models::ReportDocument;
use crate::report::{generate_json_report, notification_message, notification_subject};
use chrono::NaiveDate;
use store::{JSON_CONTENT_TYPE, PNG_CONTENT_TYPE};
use tracing::info;

/// Failure while publishing a report.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid object key {0:?}")]
    InvalidKey(String),

    #[error("failed to store {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("notification request failed: {0}")]
    Notify(#[from] reqwest::Error),

    #[error("notification endpoint returned {status}: {body}")]
    NotifyStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl PublishError {
    /// Whether a later run could succeed without any change to the input or config.
    pub fn is_transient(&self) -> bool {
        match self {
            PublishError::Serialize(_) | PublishError::InvalidKey(_) => false,
            PublishError::Store { .. } => true,
            PublishError::Notify(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            PublishError::NotifyStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

/// Key naming and notification settings for the publisher.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub key_prefix: String,
    pub public_base_url: Option<String>,
    pub subject_prefix: String,
}

impl From<&Config> for PublishSettings {
    fn from(config: &Config) -> Self {
        Self {
            key_prefix: config.storage.key_prefix.clone(),
            public_base_url: config.storage.public_base_url.clone(),
            subject_prefix: config.notification.subject_prefix.clone(),
        }
    }
}

/// Where the published artifacts ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub report_key: String,
    pub chart_keys: Vec<String>,
    pub report_url: String,
}

/// Stores report artifacts and announces them.
pub struct ReportPublisher<S, N> {
    store: S,
    notifier: N,
    settings: PublishSettings,
}

impl<S: ObjectStore, N: Notifier> ReportPublisher<S, N> {
    pub fn new(store: S, notifier: N, settings: PublishSettings) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    /// Key of the report document, e.g. `reports/daily/2024-01-02.json`.
    pub fn report_key(&self, date: NaiveDate) -> String {
        format!("{}/{}.json", self.prefix(), date.format("%Y-%m-%d"))
    }

    /// Key of a chart, e.g. `reports/daily/2024-01-02_hourly_sales.png`.
    pub fn chart_key(&self, date: NaiveDate, chart_name: &str) -> String {
        format!(
            "{}/{}_{}.png",
            self.prefix(),
            date.format("%Y-%m-%d"),
            chart_name
        )
    }

    /// Public URL of a stored object.
    pub fn object_url(&self, key: &str) -> String {
        match self.settings.public_base_url {
            Some(ref base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => self.store.url_for(key),
        }
    }

    fn prefix(&self) -> &str {
        self.settings.key_prefix.trim_matches('/')
    }

    /// Store the report and charts, then send the notification.
    pub async fn publish(
        &self,
        report: &ReportDocument,
        charts: &[ChartArtifact],
    ) -> Result<PublishOutcome, PublishError> {
        let body = generate_json_report(report)?;
        let report_key = self.report_key(report.date);
        self.store
            .put(&report_key, body.as_bytes(), JSON_CONTENT_TYPE)?;
        info!("Stored report at {}", report_key);

        let mut chart_keys = Vec::with_capacity(charts.len());
        for chart in charts {
            let key = self.chart_key(report.date, &chart.name);
            self.store.put(&key, &chart.png, PNG_CONTENT_TYPE)?;
            info!("Stored chart {} at {}", chart.name, key);
            chart_keys.push(key);
        }

        let report_url = self.object_url(&report_key);
        let notification = Notification {
            subject: notification_subject(report, &self.settings.subject_prefix),
            message: notification_message(report, &self.settings.subject_prefix, &report_url),
        };
        self.notifier.send(&notification).await?;

        Ok(PublishOutcome {
            report_key,
            chart_keys,
            report_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::notify::recording::RecordingNotifier;
    use super::store::memory::MemoryObjectStore;
    use super::*;
    use crate::chart::HOURLY_SALES_CHART;
    use crate::report::DEFAULT_SUBJECT_PREFIX;

    fn settings(public_base_url: Option<&str>) -> PublishSettings {
        PublishSettings {
            key_prefix: "reports/daily".to_string(),
            public_base_url: public_base_url.map(String::from),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn test_keys() {
        let publisher = ReportPublisher::new(
            MemoryObjectStore::default(),
            RecordingNotifier::default(),
            settings(None),
        );

        assert_eq!(publisher.report_key(date()), "reports/daily/2024-01-02.json");
        assert_eq!(
            publisher.chart_key(date(), HOURLY_SALES_CHART),
            "reports/daily/2024-01-02_hourly_sales.png"
        );
    }

    #[test]
    fn test_object_url_prefers_public_base() {
        let publisher = ReportPublisher::new(
            MemoryObjectStore::default(),
            RecordingNotifier::default(),
            settings(Some("https://reports.example.com/")),
        );
        assert_eq!(
            publisher.object_url("reports/daily/2024-01-02.json"),
            "https://reports.example.com/reports/daily/2024-01-02.json"
        );

        let local = ReportPublisher::new(
            MemoryObjectStore::default(),
            RecordingNotifier::default(),
            settings(None),
        );
        assert_eq!(
            local.object_url("reports/daily/2024-01-02.json"),
            "memory://reports/daily/2024-01-02.json"
        );
    }

    #[test]
    fn test_publish_stores_and_notifies() {
        let publisher = ReportPublisher::new(
            MemoryObjectStore::default(),
            RecordingNotifier::default(),
            settings(None),
        );
        let report = ReportDocument::empty(date());
        let charts = vec![ChartArtifact {
            name: HOURLY_SALES_CHART.to_string(),
            png: vec![0x89, b'P', b'N', b'G'],
        }];

        let outcome = tokio_test::block_on(publisher.publish(&report, &charts)).unwrap();

        assert_eq!(outcome.report_key, "reports/daily/2024-01-02.json");
        assert_eq!(
            outcome.chart_keys,
            vec!["reports/daily/2024-01-02_hourly_sales.png"]
        );

        let objects = publisher.store.objects.lock().unwrap();
        let (body, content_type) = &objects["reports/daily/2024-01-02.json"];
        assert_eq!(content_type, JSON_CONTENT_TYPE);
        let stored: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(stored["total_orders"], 0);
        assert_eq!(objects["reports/daily/2024-01-02_hourly_sales.png"].1, PNG_CONTENT_TYPE);

        let sent = publisher.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Daily Sales Report - 2024-01-02");
        assert!(sent[0]
            .message
            .ends_with("View full report: memory://reports/daily/2024-01-02.json\n"));
    }

    #[test]
    fn test_publish_without_charts() {
        let publisher = ReportPublisher::new(
            MemoryObjectStore::default(),
            RecordingNotifier::default(),
            settings(None),
        );

        let outcome =
            tokio_test::block_on(publisher.publish(&ReportDocument::empty(date()), &[])).unwrap();

        assert!(outcome.chart_keys.is_empty());
        assert_eq!(publisher.store.objects.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_error_classification() {
        let io = PublishError::Store {
            key: "k".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(io.is_transient());
        assert!(!PublishError::InvalidKey("..".to_string()).is_transient());

        let server = PublishError::NotifyStatus {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        assert!(server.is_transient());

        let client = PublishError::NotifyStatus {
            status: reqwest::StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert!(!client.is_transient());
    }
}
