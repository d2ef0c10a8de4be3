//! build-notify CLI - post one build notification.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use build_notify::{BuildOutcome, Delivery, NotificationConfig, Notifier};

/// Post a build notification to the messaging API.
#[derive(Parser)]
#[command(name = "build-notify")]
#[command(about = "Post a CI build notification to a chat channel")]
#[command(version)]
struct Cli {
    /// TOML notification configuration
    #[arg(short, long)]
    config: PathBuf,

    /// JSON build outcome supplied by the build server
    #[arg(short, long)]
    outcome: Option<PathBuf>,

    /// Stream this file as the request body instead of the attachment payload
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = NotificationConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(file) = cli.file {
        config.filename = Some(file);
    }

    let outcome = match &cli.outcome {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let outcome: BuildOutcome = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid build outcome in {}", path.display()))?;
            Some(outcome)
        }
        None => None,
    };

    let notifier = Notifier::new(config).context("Failed to build HTTP client")?;

    match notifier.send(outcome.as_ref()).await {
        Delivery::Skipped(reason) => {
            let channel = notifier.config().channel.as_deref().unwrap_or_default();
            println!("Skipped notification to {channel:?}: {reason:?}");
        }
        Delivery::Sent(response) => {
            println!("Status: {}", response.status);
            if let Some(body) = response.body {
                println!("{body}");
            }
        }
        Delivery::Failed(e) => bail!("Notification failed: {e}"),
    }

    Ok(())
}
