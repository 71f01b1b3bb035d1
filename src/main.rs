use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdrelay::config::Config;
use mdrelay::telegram;

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
    // Missing credential is fatal before the loop starts.
    config
        .require_token()
        .context("Provide the bot credential before starting the polling relay")?;

    info!("Relay bot is starting...");
    telegram::run(config).await?;

    Ok(())
}
