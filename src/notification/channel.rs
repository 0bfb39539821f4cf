//! Delivery channel trait

use anyhow::Result;
use async_trait::async_trait;

use super::payload::Payload;

/// Outcome of dispatching one event
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// Delivered
    Sent,
    /// Nothing to deliver (user not configured, dry-run)
    Skipped(String),
    /// Delivery was attempted and failed
    Failed(String),
}

/// Something that can deliver a finalized payload
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name, for logs
    fn name(&self) -> &str;

    /// Deliver one message. No retries.
    async fn send(&self, payload: &Payload) -> Result<()>;
}
