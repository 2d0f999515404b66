//! Telegram bot backend
//!
//! Alerts go through the Bot API `sendMessage` method.

use crate::monitoring::notifier::{http_client, post_json, truncate_chars, NotificationSink};
use crate::utils::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Telegram rejects message text longer than this
pub const TELEGRAM_TEXT_LIMIT: usize = 4096;

/// `sendMessage` request body
#[derive(Debug, Serialize)]
pub struct TelegramMessage<'a> {
    pub chat_id: &'a str,
    pub text: String,
    pub disable_web_page_preview: bool,
}

/// Sends alerts to one chat as a bot
#[derive(Debug, Clone)]
pub struct TelegramAlert {
    api_base: String,
    bot_token: String,
    chat_id: String,
    client: Client,
}

impl TelegramAlert {
    pub fn new(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        Ok(Self {
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            client: http_client(timeout)?,
        })
    }

    /// `sendMessage` URL; contains the bot token and must not be logged
    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[async_trait]
impl NotificationSink for TelegramAlert {
    fn name(&self) -> &'static str {
        "telegram"
    }

    #[instrument(skip(self, message), fields(notifier = "telegram", chat_id = %self.chat_id))]
    async fn send(&self, message: &str) -> Result<(), AppError> {
        let payload = TelegramMessage {
            chat_id: &self.chat_id,
            text: truncate_chars(message, TELEGRAM_TEXT_LIMIT),
            disable_web_page_preview: true,
        };

        post_json(&self.client, &self.endpoint(), &payload, self.name()).await?;

        info!("Telegram alert delivered");
        Ok(())
    }
}
