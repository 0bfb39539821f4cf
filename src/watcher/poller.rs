//! Poll loop - sample, diff, dispatch, once per interval

use anyhow::{Context, Result};
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::state::ActivityState;
use crate::activity::ActivityEvent;
use crate::notification::{NotificationDispatcher, PayloadError, SendResult};
use crate::toggl::ActivitySource;

/// Watches one activity source and notifies on every start/stop
pub struct ActivityWatcher<S> {
    source: S,
    dispatcher: NotificationDispatcher,
    state: ActivityState,
    interval: Duration,
}

impl<S: ActivitySource> ActivityWatcher<S> {
    pub fn new(source: S, dispatcher: NotificationDispatcher, interval: Duration) -> Self {
        Self {
            source,
            dispatcher,
            state: ActivityState::Idle,
            interval,
        }
    }

    pub fn state(&self) -> &ActivityState {
        &self.state
    }

    /// Sample the source and advance the state.
    ///
    /// A failed sample leaves the state untouched.
    pub async fn poll(&mut self) -> Result<Vec<ActivityEvent>> {
        let sample = self.source.current_activity().await?;
        let (next, events) = std::mem::take(&mut self.state).transition(sample);
        self.state = next;
        Ok(events)
    }

    /// One poll cycle: sample, then dispatch every event in order.
    ///
    /// Sampling and delivery failures are logged; only a payload
    /// configuration error is returned.
    pub async fn tick(&mut self) -> Result<Vec<(ActivityEvent, SendResult)>, PayloadError> {
        let events = match self.poll().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Failed to sample current activity");
                return Ok(Vec::new());
            }
        };

        if events.is_empty() {
            debug!("No activity change");
        }

        let mut results = Vec::with_capacity(events.len());
        for event in events {
            info!(
                event = %event.kind,
                user_id = event.activity.user_id,
                description = event.activity.description(),
                "Activity changed"
            );
            let result = self.dispatcher.dispatch(&event).await?;
            results.push((event, result));
        }
        Ok(results)
    }

    /// Poll until Ctrl-C. The first poll runs immediately.
    pub async fn run(self) -> Result<()> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Poll until `shutdown` resolves with `Ok`.
    ///
    /// If `shutdown` fails (no signal handler) the error is logged and
    /// polling carries on.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = io::Result<()>>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        let mut listening = true;

        info!(
            interval_secs = self.interval.as_secs(),
            users = self.dispatcher.user_count(),
            "Watching Toggl activity"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await.context("Invalid delivery settings")?;
                }
                signal = &mut shutdown, if listening => match signal {
                    Ok(()) => {
                        info!("Received Ctrl-C, stopping");
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(error = %e, "Cannot listen for Ctrl-C, polling continues");
                        listening = false;
                    }
                },
            }
        }
    }
}
