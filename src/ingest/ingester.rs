//! Incremental ingestion pass
//!
//! One pass reads the source lines after the committed position, persists the
//! parsed records in a single transaction, commits the new position and then
//! raises alerts for the persisted records in source order.
//!
//! Position semantics:
//! - lines at or below the committed position are never looked at again
//! - blank lines count as processed
//! - malformed lines follow [`MalformedLinePolicy`]
//! - a storage failure aborts the pass before the position moves

use super::record::{LogRecord, RecordParser};
use super::store::RecordStore;
use super::timestamp::TimestampNormalizer;
use crate::config::{AppConfig, MalformedLinePolicy};
use crate::monitoring::{classify, AlertDeduplicator, AlertOutcome};
use crate::state::PositionStore;
use crate::utils::{AppError, MalformedLineError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Result of evaluating one source line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Parsed(LogRecord),
    Blank,
    Discarded(MalformedLineError),
}

/// Summary of one ingestion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub previous_position: u64,
    pub new_position: u64,
    /// Lines after the previous position that were looked at
    pub lines_visited: u64,
    /// Records newly persisted
    pub inserted: u64,
    pub discarded: u64,
    pub blank: u64,
    /// Line the pass stopped at under [`MalformedLinePolicy::Halt`]
    pub halted_at: Option<u64>,
    pub alerts_sent: u64,
    pub alerts_suppressed: u64,
    pub alerts_failed: u64,
}

impl IngestReport {
    fn starting_at(position: u64) -> Self {
        Self {
            previous_position: position,
            new_position: position,
            ..Self::default()
        }
    }
}

/// Lines read from the source in one pass, not yet persisted
struct ScanResult {
    records: Vec<LogRecord>,
    highest_processed: u64,
    total_lines: u64,
}

/// Orchestrates ingestion passes over one source file
pub struct LogIngester {
    source_path: PathBuf,
    parser: RecordParser,
    policy: MalformedLinePolicy,
    records: Arc<dyn RecordStore>,
    position: Arc<dyn PositionStore>,
    alerts: AlertDeduplicator,
}

impl LogIngester {
    pub fn new(
        source_path: impl Into<PathBuf>,
        parser: RecordParser,
        records: Arc<dyn RecordStore>,
        position: Arc<dyn PositionStore>,
        alerts: AlertDeduplicator,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            parser,
            policy: MalformedLinePolicy::default(),
            records,
            position,
            alerts,
        }
    }

    /// Build an ingester from the startup configuration
    pub fn from_config(
        config: &AppConfig,
        records: Arc<dyn RecordStore>,
        position: Arc<dyn PositionStore>,
        alerts: AlertDeduplicator,
    ) -> Self {
        let parser = RecordParser::new(TimestampNormalizer::new(config.source_utc_offset));
        Self::new(
            config.source_log_path.clone(),
            parser,
            records,
            position,
            alerts,
        )
        .with_policy(config.malformed_line_policy)
    }

    /// Set the malformed line policy
    pub fn with_policy(mut self, policy: MalformedLinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Classify one raw line as read from the source
    pub fn evaluate_line(&self, raw: &[u8]) -> LineOutcome {
        match self.parser.parse_bytes(raw) {
            Ok(Some(record)) => LineOutcome::Parsed(record),
            Ok(None) => LineOutcome::Blank,
            Err(e) => LineOutcome::Discarded(e),
        }
    }

    /// Run one ingestion pass.
    ///
    /// Returns `AppError::StorageUnavailable` when the source cannot be read
    /// or the record store / position marker cannot be written; the position
    /// is then left where it was. When only the position write fails, the
    /// records of this pass are already committed and the next pass inserts
    /// them again.
    ///
    /// An unterminated last line is left for a later pass.
    #[instrument(skip(self), fields(source = %self.source_path.display()))]
    pub async fn run(&self) -> Result<IngestReport, AppError> {
        let last_position = self.position.load();
        let mut report = IngestReport::starting_at(last_position);

        if !self.source_path.exists() {
            debug!("Source log does not exist yet");
            return Ok(report);
        }

        let scan = self.scan(last_position, &mut report)?;

        if scan.total_lines < last_position {
            warn!(
                position = last_position,
                current_lines = scan.total_lines,
                "Source has fewer lines than the committed position, waiting for it to catch up"
            );
        }

        report.inserted = self.records.insert_batch(&scan.records).await?;

        if scan.highest_processed > last_position {
            if let Err(e) = self.position.store(scan.highest_processed) {
                error!(
                    error = %e,
                    previous_position = last_position,
                    new_position = scan.highest_processed,
                    inserted = report.inserted,
                    "Records committed but position marker not saved; they will be read again"
                );
                return Err(e);
            }
            report.new_position = scan.highest_processed;
        }

        for record in &scan.records {
            let Some(kind) = classify(&record.output) else {
                continue;
            };
            match self.alerts.dispatch(kind, record).await {
                AlertOutcome::Sent { .. } => report.alerts_sent += 1,
                AlertOutcome::Suppressed { .. } => report.alerts_suppressed += 1,
                AlertOutcome::Failed { .. } => report.alerts_failed += 1,
                AlertOutcome::Disabled => {}
            }
        }

        if report.lines_visited > 0 {
            info!(
                inserted = report.inserted,
                discarded = report.discarded,
                blank = report.blank,
                position = report.new_position,
                alerts_sent = report.alerts_sent,
                "{} new records added",
                report.inserted
            );
        } else {
            debug!(position = report.new_position, "No new lines");
        }

        Ok(report)
    }

    /// Read and parse every line after `after_line`
    fn scan(&self, after_line: u64, report: &mut IngestReport) -> Result<ScanResult, AppError> {
        let file = File::open(&self.source_path).map_err(|e| {
            error!(error = %e, file = %self.source_path.display(), "Failed to open source log");
            AppError::storage(format!("Failed to open source log: {}", e))
        })?;
        let mut reader = BufReader::new(file);

        let mut records = Vec::new();
        let mut highest_processed = after_line;
        let mut line_num: u64 = 0;
        let mut halted = false;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(|e| {
                error!(error = %e, line = line_num + 1, "Failed to read source line");
                AppError::storage(format!("Failed to read line {}: {}", line_num + 1, e))
            })?;
            if read == 0 {
                break;
            }
            if buf.last() != Some(&b'\n') {
                // The writer is mid-append; the line is read once it is terminated
                debug!(line = line_num + 1, bytes = buf.len(), "Unterminated last line, deferring");
                break;
            }
            line_num += 1;

            if line_num <= after_line || halted {
                continue;
            }

            report.lines_visited += 1;

            match self.evaluate_line(&buf) {
                LineOutcome::Parsed(record) => records.push(record),
                LineOutcome::Blank => report.blank += 1,
                LineOutcome::Discarded(source) => {
                    let err = AppError::MalformedLine {
                        line: line_num,
                        source,
                    };
                    report.discarded += 1;

                    if self.policy == MalformedLinePolicy::Halt {
                        warn!(
                            line = line_num,
                            error = %err,
                            error_code = err.error_code(),
                            "Malformed line, halting pass until it is fixed"
                        );
                        report.halted_at = Some(line_num);
                        halted = true;
                        continue;
                    }

                    warn!(
                        line = line_num,
                        error = %err,
                        error_code = err.error_code(),
                        "Malformed line discarded"
                    );
                }
            }

            highest_processed = line_num;
        }

        debug!(
            new_records = records.len(),
            after_line = after_line,
            total_lines = line_num,
            "Scanned source log"
        );

        Ok(ScanResult {
            records,
            highest_processed,
            total_lines: line_num,
        })
    }
}
