//! Notification layer - templates, payloads and webhook delivery
//!
//! # Usage
//! ```ignore
//! use std::sync::Arc;
//! use toggl_notifier::notification::{NotificationDispatcher, WebhookChannel, WebhookConfig};
//!
//! let channel = Arc::new(WebhookChannel::new(WebhookConfig::new(&config.webhook_url))?);
//! let dispatcher = NotificationDispatcher::new(&config, channel)?;
//! dispatcher.dispatch(&event).await?;
//! ```

pub mod channel;
pub mod dispatcher;
pub mod payload;
pub mod template;
pub mod webhook;

pub use channel::{NotificationChannel, SendResult};
pub use dispatcher::NotificationDispatcher;
pub use payload::{build_message, Payload, PayloadError};
pub use template::{Template, TemplateError, TemplateSet};
pub use webhook::{WebhookChannel, WebhookConfig};
