//! Telegram Markdown relay bot.
//!
//! Receives a text message, re-sends it with Markdown rendering enabled and
//! falls back to a fixed plain-text apology when Telegram rejects the markup.
//! Two delivery modes share the `relay` core: a long-polling worker
//! ([`telegram::run`]) and a stateless HTTP webhook ([`webhook::router`]).

pub mod config;
pub mod error;
pub mod relay;
pub mod telegram;
pub mod webhook;

pub use error::{Error, Result};
