//! 로깅 초기화 모듈
//!
//! stdout과 `LOG_DIR`의 일별 파일에 JSON 구조화 로그를 남깁니다.
//! 수집 패스마다 `ingest_pass` span이 붙으므로 span 필드를 함께 출력합니다.

use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,telemetry_watcher=debug";

/// Daily file prefix, rolled as `watcher.log.YYYY-MM-DD`
pub const LOG_FILE_PREFIX: &str = "watcher.log";

/// `RUST_LOG` if it parses, otherwise [`DEFAULT_LOG_FILTER`]
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn json_layer<S, W>(writer: W, ansi: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(ansi)
        .with_writer(writer)
}

/// 로깅 시스템을 초기화합니다.
///
/// 반환되는 `WorkerGuard`는 main에서 유지해야 종료 시 버퍼링된 파일 로그가 flush됩니다.
/// 이미 전역 subscriber가 설치된 경우(테스트 등)에는 경고만 남기고 계속 진행합니다.
pub fn init_logging(log_dir: &Path) -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));

    let installed = tracing_subscriber::registry()
        .with(log_filter())
        .with(json_layer(std::io::stdout, true))
        .with(json_layer(file_writer, false))
        .try_init();

    if let Err(e) = installed {
        eprintln!("Logging already initialized, keeping existing subscriber: {}", e);
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use uuid::Uuid;

    #[test]
    fn should_keep_running_when_initialized_twice() {
        // Arrange
        let dir = temp_dir().join(format!("test_logging_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("Failed to create test dir");

        // Act
        let _first = init_logging(&dir);
        let _second = init_logging(&dir);
        tracing::info!("written after double init");

        // Assert
        assert!(dir.exists());
    }
}
