use crate::config;

/// Crate error type shared by both transport adapters.
///
/// Markup rejection is deliberately not represented here: the responder
/// recovers from it locally, so it travels as a
/// [`SendOutcome`](crate::relay::SendOutcome) instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{} environment variable is not set", config::TOKEN_ENV)]
    MissingToken,

    #[error("invalid value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
