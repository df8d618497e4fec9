//! Webhook sink: POSTs the position snapshot as JSON
//!
//!  One attempt per alert, bounded by the client timeout. Failures are the
//!  dispatcher's to log; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

use crate::dispatch::{Alert, AlertSink, SinkError};

const USER_AGENT: &str = "overhead-webhook";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, alert: Alert) -> Result<(), SinkError> {
        let body = serde_json::to_vec(&alert.position)
            .map_err(|e| SinkError::Io(e.into()))?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("sent webhook to {} and got HTTP response code {}", self.url, status);
        } else {
            warn!("webhook {} answered with HTTP {}", self.url, status);
        }
        Ok(())
    }
}
