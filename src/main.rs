//! Toggl Notifier CLI
//!
//! Watches a Toggl dashboard and posts start/stop notifications to a webhook

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toggl_notifier::cli::{handle_init, handle_start, StartArgs};
use toggl_notifier::config::DEFAULT_CONFIG_PATH;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "toggl-notifier")]
#[command(about = "Notify Toggl activities to a chat webhook")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start watching Toggl
    #[command(visible_alias = "s")]
    Start(StartArgs),
    /// Generate a config file
    #[command(visible_aliases = ["g", "generate", "i"])]
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("toggl_notifier=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start(args) => handle_start(&cli.config, args).await,
        Commands::Init => handle_init(&cli.config),
    }
}
