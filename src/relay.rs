use async_trait::async_trait;
use teloxide::types::{ChatId, Message, MessageId, Update, UpdateKind};
use tracing::warn;

use crate::Result;

/// Fallback reply sent when Telegram rejects the Markdown rendering.
pub const PARSE_ERROR_REPLY: &str =
    "I couldn't parse that Markdown. Please check your formatting and try again.";

/// How the text of an [`OutboundReply`] should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Markdown parse mode, link preview disabled.
    Markdown,
    /// No parse mode; the text goes out verbatim.
    Plain,
}

/// One outbound send attempt. Built per attempt, dropped after.
#[derive(Debug, Clone)]
pub struct OutboundReply {
    pub chat_id: ChatId,
    pub text: String,
    pub reply_to: Option<MessageId>,
    pub mode: RenderMode,
}

impl OutboundReply {
    pub fn markdown(chat_id: ChatId, text: impl Into<String>, reply_to: Option<MessageId>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to,
            mode: RenderMode::Markdown,
        }
    }

    pub fn plain(chat_id: ChatId, text: impl Into<String>, reply_to: Option<MessageId>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to,
            mode: RenderMode::Plain,
        }
    }
}

/// What the remote API did with a single send attempt.
///
/// Markup rejection is a regular outcome, not an error: the responder
/// recovers from it with the plain-text fallback. Hard failures (network,
/// any other API error) travel through the `Err` channel and are never
/// retried.
#[derive(Debug)]
pub enum SendOutcome {
    Sent,
    /// Telegram refused to parse the message entities; carries the API error
    /// description.
    RejectedMarkup(String),
}

/// Boundary between the relay logic and the Telegram client, so the decision
/// logic can be exercised without the network.
#[async_trait]
pub trait SendPort: Send + Sync {
    async fn send(&self, reply: &OutboundReply) -> Result<SendOutcome>;
}

/// Result of handling one inbound update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to relay: wrong update kind, no text, or empty text.
    Ignored,
    /// The Markdown rendering went through.
    Sent,
    /// Telegram rejected the markup; the apology fallback was sent instead.
    ParseError,
}

impl Outcome {
    /// Stable label used in webhook bodies and log lines.
    pub fn as_status(self) -> &'static str {
        match self {
            Outcome::Ignored => "ignored",
            Outcome::Sent => "sent",
            Outcome::ParseError => "parse_error",
        }
    }
}

/// Pull the user-authored message out of an update, new or edited.
pub fn extract_message(update: &Update) -> Option<&Message> {
    match &update.kind {
        UpdateKind::Message(message) | UpdateKind::EditedMessage(message) => Some(message),
        _ => None,
    }
}

/// Chat id, text and reply target for a message worth relaying; `None` for
/// non-text and empty-text messages.
pub fn reply_target(message: &Message) -> Option<(ChatId, &str, MessageId)> {
    let text = message.text()?;
    if text.is_empty() {
        return None;
    }
    Some((message.chat.id, text, message.id))
}

/// Echo `text` back with Markdown rendering; on markup rejection send the
/// fixed plain-text apology to the same chat and reply target.
///
/// Exactly one outbound call on success, exactly two when the markup is
/// rejected. Any other failure propagates to the caller untouched.
pub async fn respond(
    port: &dyn SendPort,
    chat_id: ChatId,
    text: &str,
    reply_to: Option<MessageId>,
) -> Result<Outcome> {
    let attempt = OutboundReply::markdown(chat_id, text, reply_to);
    match port.send(&attempt).await? {
        SendOutcome::Sent => Ok(Outcome::Sent),
        SendOutcome::RejectedMarkup(description) => {
            warn!("Markdown rejected for chat {}: {}", chat_id.0, description);
            port.send(&OutboundReply::plain(chat_id, PARSE_ERROR_REPLY, reply_to))
                .await?;
            Ok(Outcome::ParseError)
        }
    }
}

/// The one shared "handle one update" path both transports dispatch into.
pub async fn handle_update(port: &dyn SendPort, update: &Update) -> Result<Outcome> {
    let Some(message) = extract_message(update) else {
        return Ok(Outcome::Ignored);
    };
    let Some((chat_id, text, message_id)) = reply_target(message) else {
        return Ok(Outcome::Ignored);
    };
    respond(port, chat_id, text, Some(message_id)).await
}
