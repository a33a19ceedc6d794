//! Report notifications.
//!
//! A notification is a subject plus a plain-text body. It is either posted
//! as JSON to a webhook or, when no endpoint is configured, written to the log.

use super::PublishError;
use crate::config::NotificationConfig;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// A notification ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}

/// Delivery channel for notifications.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn send(&self, notification: &Notification) -> Result<(), PublishError>;
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), PublishError> {
        info!("{}", notification.subject);
        for line in notification.message.lines() {
            info!("  {}", line);
        }
        Ok(())
    }
}

/// Posts notifications as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout_seconds: u64) -> Result<Self, PublishError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            url: url.into(),
            timeout_seconds,
            http_client,
        })
    }
}

impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), PublishError> {
        debug!(url = %self.url, "Posting notification");

        let response = self
            .http_client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    debug!("Notification timed out after {}s", self.timeout_seconds);
                }
                PublishError::Notify(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::NotifyStatus { status, body });
        }

        info!("Notification delivered to {}", self.url);
        Ok(())
    }
}

/// The notifier selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredNotifier {
    Log(LogNotifier),
    Webhook(WebhookNotifier),
}

impl ConfiguredNotifier {
    pub fn from_config(config: &NotificationConfig) -> Result<Self, PublishError> {
        match config.webhook_url {
            Some(ref url) => Ok(Self::Webhook(WebhookNotifier::new(
                url.clone(),
                config.timeout_seconds,
            )?)),
            None => Ok(Self::Log(LogNotifier)),
        }
    }
}

impl Notifier for ConfiguredNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), PublishError> {
        match self {
            Self::Log(notifier) => notifier.send(notification).await,
            Self::Webhook(notifier) => notifier.send(notification).await,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_notifier_defaults_to_log() {
        let config = NotificationConfig::default();
        let notifier = ConfiguredNotifier::from_config(&config).unwrap();
        assert!(matches!(notifier, ConfiguredNotifier::Log(_)));
    }

    #[test]
    fn test_configured_notifier_webhook() {
        let config = NotificationConfig {
            webhook_url: Some("http://127.0.0.1:9/hook".to_string()),
            ..NotificationConfig::default()
        };
        let notifier = ConfiguredNotifier::from_config(&config).unwrap();
        assert!(matches!(notifier, ConfiguredNotifier::Webhook(_)));
    }

    #[test]
    fn test_log_notifier_succeeds() {
        let notification = Notification {
            subject: "Daily Sales Report - 2024-01-02".to_string(),
            message: "Total Orders: 0\n".to_string(),
        };
        tokio_test::block_on(LogNotifier.send(&notification)).unwrap();
    }

    #[test]
    fn test_webhook_connection_failure_is_transient() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook", 2).unwrap();
        let notification = Notification {
            subject: "s".to_string(),
            message: "m".to_string(),
        };

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let err = runtime.block_on(notifier.send(&notification)).unwrap_err();
        assert!(err.is_transient(), "unexpected error: {}", err);
    }
}
