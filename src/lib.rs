//! Toggl Notifier - posts Toggl start/stop activity to a chat webhook

pub mod activity;
pub mod cli;
pub mod config;
pub mod notification;
pub mod toggl;
pub mod watcher;

pub use activity::{Activity, ActivityEvent, ActivityKey, EventKind};
pub use config::{Config, Templates};
pub use notification::{
    NotificationChannel, NotificationDispatcher, Payload, PayloadError, SendResult,
};
pub use toggl::{ActivitySource, TogglClient, TogglConfig};
pub use watcher::{ActivityState, ActivityWatcher};
