//! Incoming-webhook channel (Slack compatible)
//!
//! POSTs the payload as JSON to a fixed URL.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::channel::NotificationChannel;
use super::payload::Payload;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Webhook channel configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Incoming webhook URL
    pub url: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Webhook channel
#[derive(Debug)]
pub struct WebhookChannel {
    client: Client,
    config: WebhookConfig,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(anyhow!("webhook_url is required"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, payload: &Payload) -> Result<()> {
        let body = serde_json::to_vec(payload)?;
        let request = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .map_err(|e| anyhow!("Invalid webhook request: {}", e))?;

        info!(
            version = ?request.version(),
            method = %request.method(),
            host = request.url().host_str().unwrap_or_default(),
            "Sending webhook request"
        );

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| anyhow!("Webhook request failed: {}", e))?;

        let status = response.status();
        info!(version = ?response.version(), status = %status, "Webhook responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(body = %body, "Webhook error body");
            return Err(anyhow!("Webhook returned {}", status));
        }

        Ok(())
    }
}
