//! Notification delivery capability and backend selection

use crate::config::NotifierConfig;
use crate::monitoring::{DiscordAlert, TelegramAlert};
use crate::utils::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Delivers a text message through one configured channel
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// `false` for the `none` backend
    fn is_enabled(&self) -> bool {
        true
    }

    /// Deliver `message`; `Ok` only when the channel accepted it.
    async fn send(&self, message: &str) -> Result<(), AppError>;
}

/// The `none` backend: alerts are logged, never delivered
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSink;

#[async_trait]
impl NotificationSink for DisabledSink {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn send(&self, _message: &str) -> Result<(), AppError> {
        debug!("Notifications disabled, skipping");
        Ok(())
    }
}

/// Build the sink selected by configuration
pub fn build_sink(config: &NotifierConfig, timeout: Duration) -> Result<Arc<dyn NotificationSink>, AppError> {
    let sink: Arc<dyn NotificationSink> = match config {
        NotifierConfig::None => Arc::new(DisabledSink),
        NotifierConfig::Discord { webhook_url } => {
            Arc::new(DiscordAlert::new(webhook_url.clone(), timeout)?)
        }
        NotifierConfig::Telegram {
            bot_token,
            chat_id,
            api_base,
        } => Arc::new(TelegramAlert::new(
            api_base.clone(),
            bot_token.clone(),
            chat_id.clone(),
            timeout,
        )?),
    };

    info!(notifier = sink.name(), enabled = sink.is_enabled(), "Notification sink ready");
    Ok(sink)
}

/// HTTP client shared by the webhook backends
pub(crate) fn http_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder().timeout(timeout).build().map_err(|e| {
        error!(error = %e, "Failed to build HTTP client");
        AppError::delivery(format!("Failed to build HTTP client: {}", e))
    })
}

/// POST `payload` as JSON and require a 2xx answer.
///
/// Both backends carry a secret in the URL, so it is stripped from errors.
pub(crate) async fn post_json<T>(
    client: &Client,
    url: &str,
    payload: &T,
    backend: &'static str,
) -> Result<(), AppError>
where
    T: Serialize + ?Sized,
{
    let response = client.post(url).json(payload).send().await.map_err(|e| {
        let e = e.without_url();
        error!(error = %e, notifier = backend, "Notification request failed");
        AppError::delivery(format!("{} request failed: {}", backend, e))
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    error!(status = %status, body = %body, notifier = backend, "Notification endpoint rejected message");
    Err(AppError::delivery(format!("{} returned {}: {}", backend, status, body)))
}

/// Cut `message` to at most `max_chars` characters, marking the cut.
pub fn truncate_chars(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }

    let keep = max_chars.saturating_sub(1);
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_build_disabled_sink_for_none() {
        // Act
        let sink = build_sink(&NotifierConfig::None, Duration::from_secs(1)).expect("sink");

        // Assert
        assert_eq!(sink.name(), "none");
        assert!(!sink.is_enabled());
        assert!(sink.send("ignored").await.is_ok());
    }

    #[test]
    fn should_build_discord_sink() {
        let config = NotifierConfig::Discord {
            webhook_url: "https://discord.com/api/webhooks/1/abc".to_string(),
        };

        let sink = build_sink(&config, Duration::from_secs(1)).expect("sink");

        assert_eq!(sink.name(), "discord");
        assert!(sink.is_enabled());
    }

    #[test]
    fn should_build_telegram_sink() {
        let config = NotifierConfig::Telegram {
            bot_token: "123:abc".to_string(),
            chat_id: "42".to_string(),
            api_base: "https://api.telegram.org".to_string(),
        };

        let sink = build_sink(&config, Duration::from_secs(1)).expect("sink");

        assert_eq!(sink.name(), "telegram");
    }

    #[test]
    fn should_keep_short_messages() {
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn should_truncate_on_char_boundaries() {
        // Arrange
        let message = "에러가 발생했습니다";

        // Act
        let truncated = truncate_chars(message, 4);

        // Assert
        assert_eq!(truncated, "에러가…");
        assert_eq!(truncated.chars().count(), 4);
    }
}
