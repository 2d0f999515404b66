use std::process::ExitCode;
use std::sync::Arc;
use telemetry_watcher::config::{establish_connection, AppConfig};
use telemetry_watcher::event::{
    run_queue, spawn_change_trigger, spawn_poll_trigger, IngestWorker, TriggerSource,
    DEFAULT_QUEUE_CAPACITY,
};
use telemetry_watcher::ingest::{LogIngester, SeaOrmRecordStore};
use telemetry_watcher::monitoring::{build_sink, AlertDeduplicator};
use telemetry_watcher::shutdown::shutdown_signal;
use telemetry_watcher::state::{FileAlertStateStore, FilePositionStore};
use telemetry_watcher::utils::{logging::init_logging, AppError};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // 1. 환경변수 로드
    dotenvy::dotenv().ok();

    // 2. 설정 로드
    let config = match AppConfig::from_env().map_err(AppError::from) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[{}] Invalid configuration: {}", e.error_code(), e);
            return ExitCode::FAILURE;
        }
    };

    // 3. 로깅 초기화
    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("Failed to create log dir {}: {}", config.log_dir.display(), e);
        return ExitCode::FAILURE;
    }
    let _guard = init_logging(&config.log_dir);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, error_code = e.error_code(), "Telemetry watcher failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    info!(
        source = %config.source_log_path.display(),
        notifier = config.notifier.kind(),
        policy = ?config.malformed_line_policy,
        "Starting telemetry watcher"
    );

    // 4. 상태 파일 및 DB 연결
    let position = Arc::new(FilePositionStore::open(config.position_file.clone())?);
    let alert_state = Arc::new(FileAlertStateStore::open(config.alert_state_file.clone())?);
    let db = establish_connection(&config.database_url)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    // 5. 파이프라인 구성
    let records = Arc::new(SeaOrmRecordStore::new(db));
    let sink = build_sink(&config.notifier, config.notify_timeout)?;
    let alerts = AlertDeduplicator::new(sink, alert_state);
    let ingester = LogIngester::from_config(&config, records, position, alerts);

    // 6. 워커 및 트리거 실행
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sender, receiver) = run_queue(DEFAULT_QUEUE_CAPACITY);
    sender.request(TriggerSource::Startup);

    let worker = IngestWorker::new(ingester).spawn(receiver, shutdown_rx.clone());
    let poller = spawn_poll_trigger(sender.clone(), config.poll_interval, shutdown_rx.clone());
    let watcher = spawn_change_trigger(
        sender,
        config.source_log_path.clone(),
        config.watch_interval,
        shutdown_rx,
    );

    // 7. 종료 대기
    let signal = shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    for (name, handle) in [("poll_trigger", poller), ("change_trigger", watcher), ("worker", worker)] {
        if let Err(e) = handle.await {
            error!(task = name, error = %e, "Background task panicked");
        }
    }

    info!(signal = %signal, "Telemetry watcher stopped");
    Ok(())
}
