//! Webhook delivery mode: one HTTP POST per Telegram update, JSON status
//! bodies, health check on GET. Shares the relay core with the polling
//! binary; only the transport differs.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdrelay::config::Config;
use mdrelay::telegram::TelegramSender;
use mdrelay::webhook::{self, AppState};
use mdrelay::Error;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mdrelay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;

    // A missing token is not fatal here: the server still serves the health
    // check and answers every relay attempt with `missing_token`.
    let sender = match TelegramSender::new(&config) {
        Ok(sender) => Some(Arc::new(sender)),
        Err(Error::MissingToken) => {
            warn!("TELEGRAM_BOT_TOKEN is not set; updates will be answered with missing_token");
            None
        }
        Err(err) => return Err(err).context("Failed to build the Telegram client"),
    };

    let app = webhook::router(AppState { sender });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Webhook relay listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    info!("Webhook relay stopped");
    Ok(())
}
