//! Relaybot CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use relaybot::bot::{Dispatcher, Ping, SuperUsers};
use relaybot::config::Config;
use relaybot::conversation::SqliteMessageLogger;
use relaybot::listener::Listener;
use relaybot::messaging::TelegramTransport;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relaybot")]
#[command(about = "Telegram group bot gateway")]
struct Cli {
    /// Path to config file (optional)
    #[arg(short, long, env = "RELAYBOT_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Target group: numeric chat id or public handle
    #[arg(short, long)]
    group: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref(), |config| {
        if let Some(group) = cli.group {
            config.telegram.group = group;
        }
        config.debug |= cli.debug;
    })
    .context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(data_dir = %config.data_dir.display(), group = %config.telegram.group, "starting relaybot");

    let logger = SqliteMessageLogger::connect(&config.sqlite_path())
        .await
        .context("failed to open message log")?;

    let super_users = SuperUsers::new(&config.super_users);
    tracing::info!(count = super_users.len(), "super users loaded");

    let mut bots = Dispatcher::new(Vec::new());
    bots.register(Ping);

    let (listener, _submitter) = Listener::new(
        TelegramTransport::new(&config.telegram.token),
        Arc::new(logger.clone()),
        Box::new(bots),
        config.listener(),
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("shutdown signal received");
                    cancel.cancel();
                }
                Err(error) => tracing::warn!(%error, "failed to listen for shutdown signal"),
            }
        }
    });

    let result = listener.run(cancel).await;
    logger.close().await;

    match result {
        Err(error) if error.is_cancelled() => {
            tracing::info!("relaybot stopped");
            Ok(())
        }
        Err(error) => Err(error).context("listener failed"),
        Ok(()) => Ok(()),
    }
}
