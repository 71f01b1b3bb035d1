use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::{ApiError, RequestError};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::relay::{self, OutboundReply, RenderMode, SendOutcome, SendPort};
use crate::Result;

/// How-to line answered to `/start`.
const WELCOME: &str =
    "Send me a message that contains Markdown markup and I will reply with the formatted version.";

/// [`SendPort`] backed by a real teloxide [`Bot`].
///
/// Carries its own HTTP client so the bounded send timeout never cuts short
/// the long-poll hold of the update fetcher.
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.require_token()?;
        let client = teloxide::net::default_reqwest_settings()
            .timeout(config.send_timeout)
            .build()?;
        let mut bot = Bot::with_client(token, client);
        if let Some(api_url) = &config.api_url {
            bot = bot.set_api_url(api_url.clone());
        }
        Ok(Self { bot })
    }
}

#[async_trait]
impl SendPort for TelegramSender {
    async fn send(&self, reply: &OutboundReply) -> Result<SendOutcome> {
        let mut request = self.bot.send_message(reply.chat_id, reply.text.clone());
        if reply.mode == RenderMode::Markdown {
            request = request
                .parse_mode(ParseMode::Markdown)
                .disable_web_page_preview(true);
        }
        if let Some(reply_to) = reply.reply_to {
            request = request.reply_to_message_id(reply_to);
        }

        match request.await {
            Ok(_) => Ok(SendOutcome::Sent),
            Err(RequestError::Api(err @ ApiError::CantParseEntities)) => {
                Ok(SendOutcome::RejectedMarkup(err.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Run the long-polling transport: fetch updates forever and push each one
/// through the shared relay path. A failure on a single update is logged and
/// the loop moves on to the next one.
pub async fn run(config: Config) -> Result<()> {
    let sender = Arc::new(TelegramSender::new(&config)?);

    // Separate bot for getUpdates; offset bookkeeping lives in the dispatcher.
    let mut bot = Bot::new(config.require_token()?);
    if let Some(api_url) = &config.api_url {
        bot = bot.set_api_url(api_url.clone());
    }

    info!("Starting long-polling relay. Waiting for messages...");

    let handler = dptree::entry().endpoint(dispatch_update);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![sender])
        .error_handler(LoggingErrorHandler::with_custom_text("relay"))
        .build()
        .dispatch()
        .await;

    info!("Update stream closed, shutting down");
    Ok(())
}

async fn dispatch_update(update: Update, sender: Arc<TelegramSender>) -> ResponseResult<()> {
    if let Some(message) = relay::extract_message(&update) {
        if message.text() == Some("/start") {
            let greeting = OutboundReply::plain(message.chat.id, WELCOME, None);
            if let Err(err) = sender.send(&greeting).await {
                error!("Failed to greet chat {}: {err}", message.chat.id.0);
            }
            return Ok(());
        }
    }

    match relay::handle_update(sender.as_ref(), &update).await {
        Ok(outcome) => debug!("Update {:?}: {}", update.id, outcome.as_status()),
        Err(err) => error!("Failed to relay update {:?}: {err}", update.id),
    }

    Ok(())
}
