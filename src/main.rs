mod config;
mod dispatch;
mod extract;
mod notifier;
mod payload;
mod relay;
mod render;
mod routing;
mod server;
mod telegram;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Settings};
use crate::notifier::ErrorNotifier;
use crate::relay::AlertRouter;
use crate::server::AppState;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,upptime_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let settings = Arc::new(Settings::from_env(&config));

    info!("Configuration loaded successfully");
    info!("  Strategy: {}", settings.strategy);
    info!("  Routes: {}", settings.table.routes().len());
    info!("  Max message length: {}", settings.max_message_len);

    // Requests fail with a 500 naming these until they are set.
    if !settings.missing.is_empty() {
        warn!(
            "Missing required configuration: {}",
            settings.missing.join(", ")
        );
    }

    let sender = TelegramClient::new(
        &settings.telegram_api_base_url,
        settings.bot_token.clone(),
        settings.telegram_timeout,
    )?;

    let notifier = ErrorNotifier::new(
        settings.error_webhook_url.clone(),
        settings.error_webhook_timeout,
    );
    if !notifier.enabled() {
        warn!("Error webhook not configured, failures will only be logged");
    }

    let router = AlertRouter::new(settings.clone(), Arc::new(sender));
    let state = Arc::new(AppState::new(router, notifier));

    info!("Relay is starting...");
    server::serve(state, &settings.bind).await?;

    Ok(())
}
