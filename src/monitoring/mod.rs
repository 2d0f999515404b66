//! Monitoring module
//!
//! This module turns persisted records into operator alerts:
//! - Output classification
//! - Message fingerprinting and duplicate suppression
//! - Notification backends (Discord webhook, Telegram bot)

pub mod classifier;
pub mod dedup;
pub mod discord_alert;
pub mod notifier;
pub mod telegram_alert;

pub use classifier::{classify, AlertKind};
pub use dedup::{AlertDeduplicator, AlertOutcome};
pub use discord_alert::DiscordAlert;
pub use notifier::{build_sink, DisabledSink, NotificationSink};
pub use telegram_alert::TelegramAlert;
