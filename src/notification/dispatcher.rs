//! Notification dispatcher - routes activity events to the owning user's channel

use super::channel::{NotificationChannel, SendResult};
use super::payload::{build_message, Payload, PayloadError};
use super::template::{TemplateError, TemplateSet};
use crate::activity::ActivityEvent;
use crate::config::Config;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Notification dispatcher
pub struct NotificationDispatcher {
    /// Toggl user id → delivery settings
    users: BTreeMap<String, Payload>,
    templates: TemplateSet,
    channel: Arc<dyn NotificationChannel>,
    /// Render and log, but never send
    dry_run: bool,
}

impl NotificationDispatcher {
    pub fn new(
        config: &Config,
        channel: Arc<dyn NotificationChannel>,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            users: config.users.clone(),
            templates: TemplateSet::compile(&config.templates)?,
            channel,
            dry_run: false,
        })
    }

    /// Set dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Deliver one event to its user.
    ///
    /// Delivery and rendering problems are logged and reported as
    /// `SendResult::Failed`; only a broken payload configuration is an error.
    pub async fn dispatch(&self, event: &ActivityEvent) -> Result<SendResult, PayloadError> {
        let activity = &event.activity;
        let user = activity.user_key();

        let Some(settings) = self.users.get(&user) else {
            debug!(user = %user, event = %event.kind, "User not configured, skipping");
            return Ok(SendResult::Skipped(format!("user {} not configured", user)));
        };

        let template = self.templates.get(event.kind);
        let text = match template.render(activity) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    user = %user,
                    template = template.name(),
                    error = %e,
                    "Template render failed"
                );
                return Ok(SendResult::Failed(e.to_string()));
            }
        };

        let message = build_message(settings, text)?;

        if self.dry_run {
            info!(
                user = %user,
                event = %event.kind,
                payload = %serde_json::to_string(&message).unwrap_or_default(),
                "[DRY-RUN] Would send notification"
            );
            return Ok(SendResult::Skipped("dry-run".to_string()));
        }

        match self.channel.send(&message).await {
            Ok(()) => {
                info!(
                    user = %user,
                    event = %event.kind,
                    channel = %message.channel,
                    "Notification sent"
                );
                Ok(SendResult::Sent)
            }
            Err(e) => {
                warn!(
                    user = %user,
                    event = %event.kind,
                    via = self.channel.name(),
                    error = %e,
                    "Notification delivery failed"
                );
                Ok(SendResult::Failed(e.to_string()))
            }
        }
    }

    /// Number of configured users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}
