use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Europe/Istanbul, which has had no DST since 2016
pub const DEFAULT_SOURCE_UTC_OFFSET: &str = "+03:00";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// What a pass does with a line that can never be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Log it and move the position past it; it is never retried.
    #[default]
    Discard,
    /// Stop the pass before it; it is retried on every pass.
    Halt,
}

impl FromStr for MalformedLinePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(MalformedLinePolicy::Discard),
            "halt" => Ok(MalformedLinePolicy::Halt),
            other => Err(ConfigError::InvalidPolicy(other.to_string())),
        }
    }
}

/// Notification backend selection with its credentials
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotifierConfig {
    #[default]
    None,
    Discord {
        webhook_url: String,
    },
    Telegram {
        bot_token: String,
        chat_id: String,
        api_base: String,
    },
}

impl NotifierConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            NotifierConfig::None => "none",
            NotifierConfig::Discord { .. } => "discord",
            NotifierConfig::Telegram { .. } => "telegram",
        }
    }
}

/// 애플리케이션 설정
///
/// Built once at startup and handed to each component's constructor.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Append-only JSONL telemetry log
    pub source_log_path: PathBuf,
    pub database_url: String,
    /// Committed line count
    pub position_file: PathBuf,
    /// Last delivered alert fingerprint
    pub alert_state_file: PathBuf,
    /// Fixed zone the source timestamps are written in
    pub source_utc_offset: FixedOffset,
    pub malformed_line_policy: MalformedLinePolicy,
    pub poll_interval: Duration,
    pub watch_interval: Duration,
    pub notifier: NotifierConfig,
    pub notify_timeout: Duration,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let source_utc_offset = parse_utc_offset(&get_or(
            "SOURCE_UTC_OFFSET",
            DEFAULT_SOURCE_UTC_OFFSET,
        ))?;

        let malformed_line_policy = match get("MALFORMED_LINE_POLICY") {
            Some(v) => v.parse()?,
            None => MalformedLinePolicy::default(),
        };

        let poll_interval = Duration::from_secs(parse_positive(
            "POLL_INTERVAL_SECS",
            &get_or("POLL_INTERVAL_SECS", "30"),
        )?);
        let watch_interval = Duration::from_millis(parse_positive(
            "WATCH_INTERVAL_MS",
            &get_or("WATCH_INTERVAL_MS", "1000"),
        )?);
        let notify_timeout = Duration::from_secs(parse_positive(
            "NOTIFY_TIMEOUT_SECS",
            &get_or("NOTIFY_TIMEOUT_SECS", "10"),
        )?);

        let notifier = match get_or("NOTIFIER", "none").trim().to_lowercase().as_str() {
            "none" => NotifierConfig::None,
            "discord" => NotifierConfig::Discord {
                webhook_url: get("DISCORD_WEBHOOK_URL")
                    .ok_or(ConfigError::MissingCredential("DISCORD_WEBHOOK_URL"))?,
            },
            "telegram" => NotifierConfig::Telegram {
                bot_token: get("TELEGRAM_BOT_TOKEN")
                    .ok_or(ConfigError::MissingCredential("TELEGRAM_BOT_TOKEN"))?,
                chat_id: get("TELEGRAM_CHAT_ID")
                    .ok_or(ConfigError::MissingCredential("TELEGRAM_CHAT_ID"))?,
                api_base: get_or("TELEGRAM_API_BASE", DEFAULT_TELEGRAM_API_BASE),
            },
            other => return Err(ConfigError::UnknownNotifier(other.to_string())),
        };

        Ok(Self {
            source_log_path: PathBuf::from(get_or("SOURCE_LOG_PATH", "/data/stylus_logs.jsonl")),
            database_url: get_or("DATABASE_URL", "sqlite:///data/stylus_logs.db?mode=rwc"),
            position_file: PathBuf::from(get_or("POSITION_FILE", "/data/stylus_logs.meta")),
            alert_state_file: PathBuf::from(get_or("ALERT_STATE_FILE", "/data/stylus_logs.alert")),
            source_utc_offset,
            malformed_line_policy,
            poll_interval,
            watch_interval,
            notifier,
            notify_timeout,
            log_dir: PathBuf::from(get_or("LOG_DIR", "logs")),
        })
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM`, `Z` or `UTC` into a fixed offset
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidUtcOffset(value.to_string());
    let trimmed = value.trim();

    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if rest.contains(':') && rest.find(':') != Some(2) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid UTC offset '{0}', expected +HH:MM")]
    InvalidUtcOffset(String),
    #[error("Invalid malformed line policy '{0}', expected 'discard' or 'halt'")]
    InvalidPolicy(String),
    #[error("Unknown notifier '{0}', expected 'none', 'discord' or 'telegram'")]
    UnknownNotifier(String),
    #[error("{0} environment variable is required for the selected notifier")]
    MissingCredential(&'static str),
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}
