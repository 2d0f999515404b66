//! Discord webhook backend

use crate::monitoring::notifier::{http_client, post_json, truncate_chars, NotificationSink};
use crate::utils::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Discord rejects message content longer than this
pub const DISCORD_CONTENT_LIMIT: usize = 2000;

/// Webhook body; only plain `content` is used
#[derive(Debug, Serialize)]
pub struct DiscordMessage {
    pub content: String,
}

impl DiscordMessage {
    pub fn new(text: &str) -> Self {
        Self {
            content: truncate_chars(text, DISCORD_CONTENT_LIMIT),
        }
    }
}

/// Posts alerts to one Discord channel webhook
#[derive(Debug, Clone)]
pub struct DiscordAlert {
    webhook_url: String,
    client: Client,
}

impl DiscordAlert {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            webhook_url: webhook_url.into(),
            client: http_client(timeout)?,
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

#[async_trait]
impl NotificationSink for DiscordAlert {
    fn name(&self) -> &'static str {
        "discord"
    }

    #[instrument(skip(self, message), fields(notifier = "discord"))]
    async fn send(&self, message: &str) -> Result<(), AppError> {
        post_json(
            &self.client,
            &self.webhook_url,
            &DiscordMessage::new(message),
            self.name(),
        )
        .await?;

        info!("Discord alert delivered");
        Ok(())
    }
}
