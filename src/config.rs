use std::{env, net::SocketAddr, time::Duration};

use reqwest::Url;

use crate::{Error, Result};

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SEND_TIMEOUT_MS: u64 = 10_000;

/// Runtime configuration, read from the environment once at startup and
/// passed by value from there on.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot credential. `None` is tolerated here so the webhook server can
    /// still come up and answer every relay attempt with `missing_token`;
    /// the polling entry point requires it before the loop starts.
    pub bot_token: Option<String>,
    /// Bot API base override (local Bot API server, tests).
    pub api_url: Option<Url>,
    /// Upper bound on a single outbound request.
    pub send_timeout: Duration,
    /// Webhook listen address.
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token = env_str(TOKEN_ENV).and_then(non_empty);
        let api_url = parse_api_url(env_str("TELEGRAM_API_URL"))?;
        let send_timeout = parse_timeout_ms(env_str("SEND_TIMEOUT_MS"))?;
        let bind_addr = parse_bind_addr(env_str("BIND_ADDR"))?;

        Ok(Self {
            bot_token,
            api_url,
            send_timeout,
            bind_addr,
        })
    }

    /// The credential, or the configuration error both adapters report.
    pub fn require_token(&self) -> Result<&str> {
        self.bot_token.as_deref().ok_or(Error::MissingToken)
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_api_url(v: Option<String>) -> Result<Option<Url>> {
    match v {
        None => Ok(None),
        Some(raw) => match Url::parse(&raw) {
            Ok(url) => Ok(Some(url)),
            Err(_) => Err(Error::InvalidConfig {
                key: "TELEGRAM_API_URL",
                value: raw,
            }),
        },
    }
}

fn parse_timeout_ms(v: Option<String>) -> Result<Duration> {
    match v {
        None => Ok(Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS)),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Ok(Duration::from_millis(ms)),
            Err(_) => Err(Error::InvalidConfig {
                key: "SEND_TIMEOUT_MS",
                value: raw,
            }),
        },
    }
}

fn parse_bind_addr(v: Option<String>) -> Result<SocketAddr> {
    let raw = v.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    match raw.parse() {
        Ok(addr) => Ok(addr),
        Err(_) => Err(Error::InvalidConfig {
            key: "BIND_ADDR",
            value: raw,
        }),
    }
}
