//! Start command - watch Toggl and post notifications until interrupted

use crate::config::Config;
use crate::notification::{NotificationDispatcher, WebhookChannel, WebhookConfig};
use crate::toggl::{TogglClient, TogglConfig};
use crate::watcher::ActivityWatcher;
use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Start command arguments
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Render and log notifications without posting them
    #[arg(long)]
    pub dry_run: bool,
}

/// Build the watcher from a loaded config
pub fn build_watcher(config: &Config, args: &StartArgs) -> Result<ActivityWatcher<TogglClient>> {
    let source = TogglClient::new(TogglConfig::from(config))?;

    let webhook = WebhookChannel::new(WebhookConfig {
        url: config.webhook_url.clone(),
        timeout_secs: config.timeout_secs,
    })?;
    let dispatcher = NotificationDispatcher::new(config, Arc::new(webhook))
        .context("Invalid template")?
        .with_dry_run(args.dry_run);

    Ok(ActivityWatcher::new(source, dispatcher, config.poll_interval()))
}

/// Handle the start command
pub async fn handle_start(config_path: &Path, args: StartArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    info!(
        path = %config_path.display(),
        dashboard_id = config.dashboard_id,
        dry_run = args.dry_run,
        "Config loaded"
    );

    build_watcher(&config, &args)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_watcher_from_sample() {
        let watcher = build_watcher(&Config::sample(), &StartArgs::default()).unwrap();
        assert!(watcher.state().is_idle());
    }

    #[tokio::test]
    async fn test_start_fails_without_config() {
        let dir = tempdir().unwrap();
        let err = handle_start(&dir.path().join("config.json"), StartArgs::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Cannot read config file"));
    }
}
