use crate::config::ConfigError;
use thiserror::Error;

/// Timestamp string did not match `YYYY-MM-DD HH:MM:SS`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("timestamp '{value}' does not match YYYY-MM-DD HH:MM:SS: {reason}")]
pub struct TimestampFormatError {
    pub value: String,
    pub reason: String,
}

/// A source line that can never become a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedLineError {
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("missing or non-string 'timestamp' field")]
    MissingTimestamp,
    #[error(transparent)]
    Timestamp(#[from] TimestampFormatError),
}

/// 애플리케이션 전역 에러 타입
#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed line {line}: {source}")]
    MalformedLine {
        line: u64,
        #[source]
        source: MalformedLineError,
    },
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("notification delivery failed: {0}")]
    NotificationDelivery(String),
    #[error("state file error: {0}")]
    StateFile(String),
    #[error("database error: {0}")]
    Database(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    /// 에러 코드 반환 (로그 필드용)
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MalformedLine { .. } => "INGEST4001",
            AppError::StorageUnavailable(_) => "STORE5001",
            AppError::NotificationDelivery(_) => "NOTIFY5001",
            AppError::StateFile(_) => "STATE5001",
            AppError::Database(_) => "DB5001",
            AppError::Config(_) => "CONFIG4001",
        }
    }

    /// Whether the failure only affects the current pass
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::StorageUnavailable(_) | AppError::NotificationDelivery(_)
        )
    }
}

/// 편의 함수들
impl AppError {
    pub fn storage(msg: impl Into<String>) -> Self {
        AppError::StorageUnavailable(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        AppError::NotificationDelivery(msg.into())
    }

    pub fn state_file(msg: impl Into<String>) -> Self {
        AppError::StateFile(msg.into())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}
