//! Activity state machine - turns consecutive samples into start/stop events

use crate::activity::{Activity, ActivityEvent};

/// Last observed activity
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActivityState {
    #[default]
    Idle,
    Active(Activity),
}

impl ActivityState {
    pub fn current(&self) -> Option<&Activity> {
        match self {
            ActivityState::Idle => None,
            ActivityState::Active(activity) => Some(activity),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ActivityState::Idle)
    }

    /// Apply one sample.
    ///
    /// A sample with the same identity as the current activity replaces the
    /// stored snapshot without raising anything, so a later stop event carries
    /// the last observed fields.
    pub fn transition(self, sample: Option<Activity>) -> (ActivityState, Vec<ActivityEvent>) {
        match (self, sample) {
            (ActivityState::Idle, None) => (ActivityState::Idle, Vec::new()),
            (ActivityState::Idle, Some(next)) => (
                ActivityState::Active(next.clone()),
                vec![ActivityEvent::started(next)],
            ),
            (ActivityState::Active(previous), None) => {
                (ActivityState::Idle, vec![ActivityEvent::finished(previous)])
            }
            (ActivityState::Active(previous), Some(next)) if previous.key() == next.key() => {
                (ActivityState::Active(next), Vec::new())
            }
            (ActivityState::Active(previous), Some(next)) => (
                ActivityState::Active(next.clone()),
                vec![ActivityEvent::finished(previous), ActivityEvent::started(next)],
            ),
        }
    }
}
