//! Webhook registration tool.
//!
//! `set_webhook --url https://example.com/relay` points Telegram at the
//! webhook deployment; `set_webhook --drop` removes the registration again.
//! The URL may also come from `TELEGRAM_WEBHOOK_URL`, and
//! `--drop-pending-updates` discards updates queued while no webhook was
//! registered.

use anyhow::{bail, Context, Result};
use reqwest::Url;
use teloxide::prelude::*;

use mdrelay::config::Config;

struct Args {
    drop: bool,
    drop_pending: bool,
    url: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args {
        drop: false,
        drop_pending: false,
        url: std::env::var("TELEGRAM_WEBHOOK_URL").ok(),
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--drop" => parsed.drop = true,
            "--drop-pending-updates" => parsed.drop_pending = true,
            "--url" => {
                parsed.url = Some(args.next().context("Missing value for --url")?);
            }
            other => {
                if let Some(value) = other.strip_prefix("--url=") {
                    parsed.url = Some(value.to_string());
                } else {
                    bail!("Unknown argument: {other}");
                }
            }
        }
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = parse_args()?;
    let config = Config::from_env().context("Failed to load configuration")?;
    let token = config
        .require_token()
        .context("Set TELEGRAM_BOT_TOKEN before registering a webhook")?;

    let mut bot = Bot::new(token);
    if let Some(api_url) = &config.api_url {
        bot = bot.set_api_url(api_url.clone());
    }

    if args.drop {
        println!("Deleting webhook");
        bot.delete_webhook()
            .drop_pending_updates(args.drop_pending)
            .await
            .context("Telegram API call failed")?;
        println!("Webhook deleted successfully.");
        return Ok(());
    }

    let url = args
        .url
        .context("Provide the webhook URL via --url or TELEGRAM_WEBHOOK_URL")?;
    let url = Url::parse(&url).with_context(|| format!("Invalid webhook URL: {url}"))?;

    println!("Setting webhook to {url}");
    bot.set_webhook(url)
        .drop_pending_updates(args.drop_pending)
        .await
        .context("Telegram API call failed")?;
    println!("Webhook registered successfully.");
    Ok(())
}
