//! Alert delivery.
//!
//! The probe loop hands every fired alert to a [`Notifier`] and awaits it inline.
//! Delivery failures are reported back as [`NotifyError`] and never stop monitoring.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use rttmon_core::MonitorConfig;

use crate::errors::{DaemonError, Result};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook rejected alert with status {status}")]
    Rejected { status: u16 },
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).notify(subject, body).await
    }
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).notify(subject, body).await
    }
}

/// Writes alerts to the log. Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        warn!(target: "rttmon::alert", "{subject}\n{body}");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
    target: &'a str,
    sent_at: DateTime<Utc>,
}

/// Posts alerts as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    target: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, target: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DaemonError::notifier(format!("http client: {e}")))?;
        Ok(Self { client, url: url.into(), target: target.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let payload = WebhookPayload { subject, body, target: &self.target, sent_at: Utc::now() };
        let resp = self.client.post(&self.url).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected { status: status.as_u16() });
        }
        debug!(url = %self.url, status = status.as_u16(), "alert delivered");
        Ok(())
    }
}

/// Webhook when `webhook_url` is set, log otherwise.
pub fn from_config(cfg: &MonitorConfig, target: &str) -> Result<Box<dyn Notifier>> {
    match &cfg.webhook_url {
        Some(url) => Ok(Box::new(WebhookNotifier::new(url.clone(), target, cfg.webhook_timeout())?)),
        None => Ok(Box::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_never_fails() {
        LogNotifier.notify("subject", "body").await.unwrap();
    }

    #[test]
    fn config_without_webhook_selects_log() {
        let cfg = MonitorConfig::default();
        assert!(from_config(&cfg, "192.0.2.1").is_ok());
    }

    #[test]
    fn payload_shape() {
        let p = WebhookPayload { subject: "s", body: "b", target: "t", sent_at: Utc::now() };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["subject"], "s");
        assert_eq!(v["body"], "b");
        assert_eq!(v["target"], "t");
        assert!(v["sent_at"].is_string());
    }
}
