//! Configuration file
//!
//! ```json
//! {
//!     "interval": 60,
//!     "toggl_token": "YOUR_TOGGL_TOKEN",
//!     "dashboard_id": 0,
//!     "webhook_url": "https://hooks.slack.com/services/...",
//!     "users": {
//!         "TOGGL_USER_ID": { "channel": "#general", "username": "toggl2slack" }
//!     },
//!     "templates": {
//!         "started": "started {{.Description}}",
//!         "finished": "finished {{.Description}}"
//!     }
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::Duration;

use crate::notification::payload::Payload;
use crate::notification::template::TemplateSet;
use crate::notification::webhook::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_TOGGL_API_URL: &str = "https://api.track.toggl.com";
pub const DEFAULT_STARTED_TEMPLATE: &str = "started {{.Description}}";
pub const DEFAULT_FINISHED_TEMPLATE: &str = "finished {{.Description}}";

/// Message templates, one per event kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Templates {
    #[serde(default = "default_started")]
    pub started: String,
    #[serde(default = "default_finished")]
    pub finished: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            started: default_started(),
            finished: default_finished(),
        }
    }
}

fn default_started() -> String {
    DEFAULT_STARTED_TEMPLATE.to_string()
}

fn default_finished() -> String {
    DEFAULT_FINISHED_TEMPLATE.to_string()
}

fn default_toggl_api_url() -> String {
    DEFAULT_TOGGL_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Poll interval (seconds)
    pub interval: u64,
    pub toggl_token: String,
    #[serde(default)]
    pub dashboard_id: u64,
    pub webhook_url: String,
    /// Toggl user id → delivery settings
    #[serde(default)]
    pub users: BTreeMap<String, Payload>,
    #[serde(default)]
    pub templates: Templates,
    #[serde(default = "default_toggl_api_url")]
    pub toggl_api_url: String,
    /// HTTP timeout for both Toggl and the webhook (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Config {
    /// Config written by `init`
    pub fn sample() -> Self {
        let mut users = BTreeMap::new();
        users.insert(
            "TOGGL_USER_ID".to_string(),
            Payload::new("#general", "toggl2slack"),
        );

        Self {
            interval: 60,
            toggl_token: "YOUR_TOGGL_TOKEN".to_string(),
            dashboard_id: 0,
            webhook_url: "https://hooks.slack.com/services/...".to_string(),
            users,
            templates: Templates::default(),
            toggl_api_url: default_toggl_api_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Malformed config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked before the loop starts
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(anyhow!("interval must be at least 1 second"));
        }
        if self.toggl_token.is_empty() {
            return Err(anyhow!("toggl_token is required"));
        }
        if self.webhook_url.is_empty() {
            return Err(anyhow!("webhook_url is required"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be at least 1 second"));
        }
        TemplateSet::compile(&self.templates).context("Invalid template")?;
        Ok(())
    }

    /// Write `Config::sample()` to `path`; refuses to overwrite
    pub fn generate(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(anyhow!("{} already exists", path.display()));
            }
            Err(e) => return Err(e).with_context(|| format!("Cannot create {}", path.display())),
        };

        file.write_all(Self::sample().to_pretty_json()?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// JSON with four-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Delivery settings for a user, if configured
    pub fn user(&self, user_id: &str) -> Option<&Payload> {
        self.users.get(user_id)
    }
}
