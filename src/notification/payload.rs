//! Webhook payloads and their delivery defaults
//!
//! Wire format:
//! ```json
//! {
//!   "channel": "#general",
//!   "icon_url": "https://...",
//!   "username": "Toggl",
//!   "text": "started writing docs"
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CHANNEL: &str = "#general";
pub const DEFAULT_USERNAME: &str = "Toggl";
pub const DEFAULT_ICON_URL: &str =
    "http://blog.toggl.com/wp-content/uploads/2015/04/toggl-button-light.png";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error(
        "do not specify both icon_emoji and icon_url (channel {channel:?}, username {username:?})"
    )]
    ConflictingIcons { channel: String, username: String },
}

/// Per-user delivery settings, also the message posted to the webhook once
/// `text` is filled in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub channel: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_emoji: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Payload {
    pub fn new(channel: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn with_icon_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.icon_emoji = emoji.into();
        self
    }

    pub fn with_icon_url(mut self, url: impl Into<String>) -> Self {
        self.icon_url = url.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Fill unset fields with defaults.
    ///
    /// Fails if both icon fields are set; the caller decides whether that is
    /// fatal.
    pub fn reverse_merge_default(mut self) -> Result<Self, PayloadError> {
        if !self.icon_emoji.is_empty() && !self.icon_url.is_empty() {
            return Err(PayloadError::ConflictingIcons {
                channel: self.channel,
                username: self.username,
            });
        }
        if self.channel.is_empty() {
            self.channel = DEFAULT_CHANNEL.to_string();
        }
        if self.username.is_empty() {
            self.username = DEFAULT_USERNAME.to_string();
        }
        if self.icon_emoji.is_empty() && self.icon_url.is_empty() {
            self.icon_url = DEFAULT_ICON_URL.to_string();
        }
        Ok(self)
    }
}

/// Build the message for one notification from the stored settings.
///
/// Works on a copy, so the configured settings never see the text or the
/// defaults.
pub fn build_message(settings: &Payload, text: impl Into<String>) -> Result<Payload, PayloadError> {
    settings.clone().with_text(text).reverse_merge_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_empty_fields() {
        let payload = Payload::default().reverse_merge_default().unwrap();

        assert_eq!(payload.channel, DEFAULT_CHANNEL);
        assert_eq!(payload.username, DEFAULT_USERNAME);
        assert_eq!(payload.icon_url, DEFAULT_ICON_URL);
        assert!(payload.icon_emoji.is_empty());
    }

    #[test]
    fn test_configured_fields_are_kept() {
        let payload = Payload::new("#dev", "bot")
            .with_icon_emoji(":clock1:")
            .reverse_merge_default()
            .unwrap();

        assert_eq!(payload.channel, "#dev");
        assert_eq!(payload.username, "bot");
        assert_eq!(payload.icon_emoji, ":clock1:");
        assert!(payload.icon_url.is_empty());
    }

    #[test]
    fn test_conflicting_icons_fail() {
        let result = Payload::new("#dev", "bot")
            .with_icon_emoji(":clock1:")
            .with_icon_url("https://example.com/icon.png")
            .reverse_merge_default();

        assert!(matches!(result, Err(PayloadError::ConflictingIcons { .. })));
    }

    #[test]
    fn test_reverse_merge_is_idempotent() {
        let inputs = [
            Payload::default(),
            Payload::new("#dev", ""),
            Payload::new("", "bot").with_icon_emoji(":x:"),
            Payload::new("#a", "b").with_icon_url("https://example.com/i.png"),
        ];
        for input in inputs {
            let once = input.reverse_merge_default().unwrap();
            let twice = once.clone().reverse_merge_default().unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_build_message_leaves_settings_untouched() {
        let settings = Payload::new("#dev", "");
        let message = build_message(&settings, "started x").unwrap();

        assert_eq!(message.text, "started x");
        assert_eq!(message.username, DEFAULT_USERNAME);
        assert_eq!(settings, Payload::new("#dev", ""));
    }

    #[test]
    fn test_wire_format_omits_empty_optionals() {
        let payload = Payload::new("#dev", "bot").with_icon_emoji(":x:");
        let message = build_message(&payload, "hi").unwrap();
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "channel": "#dev",
                "icon_emoji": ":x:",
                "username": "bot",
                "text": "hi"
            })
        );
    }
}
