//! Activity snapshots sampled from the time tracker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked time entry as reported by the activity source.
///
/// Fields the notifier does not care about are kept in `extra` so that
/// templates can still reach them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Time entry id (not every source reports one)
    #[serde(default)]
    pub id: Option<u64>,
    /// Owning user
    pub user_id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    /// Task id
    #[serde(default)]
    pub tid: Option<u64>,
    /// Seconds; negative while running (`-start_epoch`)
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub stop: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Identity of an activity across polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKey {
    /// Keyed by time entry id
    Entry(u64),
    /// Keyed by owner and start marker, for entries without an id
    Started { user_id: u64, marker: i64 },
}

impl Activity {
    /// Create a running activity for a user
    pub fn new(id: u64, user_id: u64, description: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            user_id,
            description: Some(description.into()),
            project_id: None,
            tid: None,
            duration: -1,
            stop: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn key(&self) -> ActivityKey {
        match self.id {
            Some(id) => ActivityKey::Entry(id),
            None => ActivityKey::Started {
                user_id: self.user_id,
                marker: self.duration,
            },
        }
    }

    /// Whether the entry is still being tracked
    pub fn is_running(&self) -> bool {
        self.duration < 0 || self.stop.is_none()
    }

    /// Start time derived from the running duration marker
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        if self.duration < -1 {
            DateTime::from_timestamp(-self.duration, 0)
        } else {
            None
        }
    }

    /// Key used to look up delivery settings in the config
    pub fn user_key(&self) -> String {
        self.user_id.to_string()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Kind of transition raised by the watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Started,
    Finished,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Started => "started",
            EventKind::Finished => "finished",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A start or stop transition with the activity it concerns
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEvent {
    pub kind: EventKind,
    pub activity: Activity,
}

impl ActivityEvent {
    pub fn started(activity: Activity) -> Self {
        Self {
            kind: EventKind::Started,
            activity,
        }
    }

    pub fn finished(activity: Activity) -> Self {
        Self {
            kind: EventKind::Finished,
            activity,
        }
    }
}
