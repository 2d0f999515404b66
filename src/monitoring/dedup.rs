//! Alert message building and consecutive-duplicate suppression
//!
//! An alert is delivered only when its fingerprint differs from the
//! fingerprint of the last alert that was actually delivered. The stored
//! fingerprint moves only after a successful delivery, so an alert that
//! failed to go out is tried again the next time it occurs.

use crate::ingest::LogRecord;
use crate::monitoring::classifier::AlertKind;
use crate::monitoring::notifier::NotificationSink;
use crate::state::AlertStateStore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What happened to one alert-worthy record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    Sent { fingerprint: String },
    /// Same fingerprint as the last delivered alert
    Suppressed { fingerprint: String },
    /// Delivery failed; the stored fingerprint was left unchanged
    Failed { fingerprint: String, error: String },
    /// The `none` backend is configured
    Disabled,
}

/// Builds, fingerprints and (re)sends alerts
pub struct AlertDeduplicator {
    sink: Arc<dyn NotificationSink>,
    state: Arc<dyn AlertStateStore>,
}

impl AlertDeduplicator {
    pub fn new(sink: Arc<dyn NotificationSink>, state: Arc<dyn AlertStateStore>) -> Self {
        Self { sink, state }
    }

    /// Title line, command line and raw output
    pub fn build_message(kind: AlertKind, record: &LogRecord) -> String {
        let command_line = record.command_line();
        let command_line = if command_line.is_empty() {
            "(empty)".to_string()
        } else {
            command_line
        };

        format!(
            "🚨 {}\nCommand: {}\nOutput:\n{}",
            kind.label(),
            command_line,
            record.output
        )
    }

    /// Hex SHA-256 of the whitespace-normalized message
    pub fn fingerprint(message: &str) -> String {
        let normalized = message.split_whitespace().collect::<Vec<_>>().join(" ");
        hex::encode(Sha256::digest(normalized.as_bytes()))
    }

    pub fn should_send(&self, fingerprint: &str) -> bool {
        fingerprint != self.state.load()
    }

    /// Deliver the alert for `record` unless it repeats the last one.
    pub async fn dispatch(&self, kind: AlertKind, record: &LogRecord) -> AlertOutcome {
        if !self.sink.is_enabled() {
            debug!(kind = %kind, command = %record.command_line(), "Alert detected, notifications disabled");
            return AlertOutcome::Disabled;
        }

        let message = Self::build_message(kind, record);
        let fingerprint = Self::fingerprint(&message);

        if !self.should_send(&fingerprint) {
            debug!(fingerprint = %fingerprint, kind = %kind, "Skipping duplicate alert");
            return AlertOutcome::Suppressed { fingerprint };
        }

        match self.sink.send(&message).await {
            Ok(()) => {
                if let Err(e) = self.state.store(&fingerprint) {
                    // Delivered but not recorded: the next identical alert goes out again
                    error!(error = %e, fingerprint = %fingerprint, "Failed to persist alert fingerprint");
                }
                info!(
                    fingerprint = %fingerprint,
                    kind = %kind,
                    notifier = self.sink.name(),
                    "Alert delivered"
                );
                AlertOutcome::Sent { fingerprint }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    error_code = e.error_code(),
                    fingerprint = %fingerprint,
                    notifier = self.sink.name(),
                    "Alert delivery failed, fingerprint not updated"
                );
                AlertOutcome::Failed {
                    fingerprint,
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FileAlertStateStore;
    use crate::utils::AppError;
    use async_trait::async_trait;
    use std::env::temp_dir;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, message: &str) -> Result<(), AppError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::delivery("channel down"));
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn state_store() -> Arc<FileAlertStateStore> {
        let path = temp_dir()
            .join(format!("test_dedup_{}", Uuid::new_v4()))
            .join("logs.alert");
        Arc::new(FileAlertStateStore::open(path).expect("Failed to open state"))
    }

    fn record(args: &str, output: &str) -> LogRecord {
        LogRecord {
            timestamp_utc: 1_705_302_000,
            command: "stylus".to_string(),
            subcommand: "deploy".to_string(),
            args: args.to_string(),
            output: output.to_string(),
            duration_seconds: 0.1,
        }
    }

    #[test]
    fn should_build_message_with_title_command_and_output() {
        // Act
        let message = AlertDeduplicator::build_message(
            AlertKind::GenericError,
            &record("--endpoint x", "error: out of gas"),
        );

        // Assert
        assert_eq!(
            message,
            "🚨 CLI error detected\nCommand: stylus deploy --endpoint x\nOutput:\nerror: out of gas"
        );
    }

    #[test]
    fn should_fingerprint_whitespace_insensitively() {
        // Arrange
        let a = "Missing required argument\nCommand: stylus  deploy\n";
        let b = "  Missing required argument Command:\tstylus deploy";

        // Act & Assert
        assert_eq!(AlertDeduplicator::fingerprint(a), AlertDeduplicator::fingerprint(b));
        assert_ne!(
            AlertDeduplicator::fingerprint(a),
            AlertDeduplicator::fingerprint("Missing required argument")
        );
        assert_eq!(AlertDeduplicator::fingerprint(a).len(), 64);
    }

    #[test]
    fn should_fingerprint_sha256_of_normalized_text() {
        // sha256("abc")
        assert_eq!(
            AlertDeduplicator::fingerprint(" a b c "),
            AlertDeduplicator::fingerprint("a b c")
        );
        assert_eq!(
            AlertDeduplicator::fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn should_suppress_consecutive_identical_alerts() {
        // Arrange
        let sink = Arc::new(RecordingSink::default());
        let dedup = AlertDeduplicator::new(sink.clone(), state_store());
        let failing = record("", "error: boom");
        let other = record("--x", "error: other");

        // Act
        let first = dedup.dispatch(AlertKind::GenericError, &failing).await;
        let second = dedup.dispatch(AlertKind::GenericError, &failing).await;
        let third = dedup.dispatch(AlertKind::GenericError, &other).await;

        // Assert
        assert!(matches!(first, AlertOutcome::Sent { .. }));
        assert!(matches!(second, AlertOutcome::Suppressed { .. }));
        assert!(matches!(third, AlertOutcome::Sent { .. }));
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_resend_after_a_different_alert() {
        // Arrange
        let sink = Arc::new(RecordingSink::default());
        let dedup = AlertDeduplicator::new(sink.clone(), state_store());
        let a = record("", "error: a");
        let b = record("", "error: b");

        // Act
        dedup.dispatch(AlertKind::GenericError, &a).await;
        dedup.dispatch(AlertKind::GenericError, &b).await;
        let again = dedup.dispatch(AlertKind::GenericError, &a).await;

        // Assert - only consecutive repeats are suppressed
        assert!(matches!(again, AlertOutcome::Sent { .. }));
        assert_eq!(sink.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_not_store_fingerprint_when_delivery_fails() {
        // Arrange
        let sink = Arc::new(RecordingSink::default());
        let state = state_store();
        let dedup = AlertDeduplicator::new(sink.clone(), state.clone());
        let failing = record("", "error: boom");
        sink.fail.store(true, Ordering::SeqCst);

        // Act
        let outcome = dedup.dispatch(AlertKind::GenericError, &failing).await;

        // Assert
        assert!(matches!(outcome, AlertOutcome::Failed { .. }));
        assert_eq!(state.load(), "");

        // Channel recovers: the same alert is delivered on its next occurrence
        sink.fail.store(false, Ordering::SeqCst);
        let retried = dedup.dispatch(AlertKind::GenericError, &failing).await;
        assert!(matches!(retried, AlertOutcome::Sent { .. }));
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_report_disabled_without_touching_state() {
        // Arrange
        let state = state_store();
        let dedup = AlertDeduplicator::new(Arc::new(crate::monitoring::DisabledSink), state.clone());

        // Act
        let outcome = dedup
            .dispatch(AlertKind::MissingArgument, &record("", "error"))
            .await;

        // Assert
        assert_eq!(outcome, AlertOutcome::Disabled);
        assert_eq!(state.load(), "");
    }
}
