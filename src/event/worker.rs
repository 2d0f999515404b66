//! Ingestion worker
//!
//! Sole consumer of the run queue. Requests that pile up while a pass is
//! running are coalesced into the next pass, and a pass that has started is
//! always finished before shutdown is honoured.

use crate::event::trigger::wait_for_shutdown;
use crate::event::{RunReceiver, RunRequest, TriggerSource};
use crate::ingest::{IngestReport, LogIngester};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Event worker that runs ingestion passes from the queue
pub struct IngestWorker {
    ingester: LogIngester,
}

impl IngestWorker {
    pub fn new(ingester: LogIngester) -> Self {
        Self { ingester }
    }

    /// Run one pass for a batch of coalesced requests.
    ///
    /// Returns `None` when the pass failed; the error is logged and the
    /// position is left for the next pass to retry.
    pub async fn process_batch(&self, batch: &[RunRequest]) -> Option<IngestReport> {
        let trigger = batch
            .first()
            .map(|r| r.source)
            .unwrap_or(TriggerSource::Poll);
        let span = info_span!(
            "ingest_pass",
            pass_id = %Uuid::new_v4(),
            trigger = %trigger,
            coalesced = batch.len()
        );

        async {
            match self.ingester.run().await {
                Ok(report) => {
                    info!(
                        previous_position = report.previous_position,
                        new_position = report.new_position,
                        inserted = report.inserted,
                        discarded = report.discarded,
                        alerts_sent = report.alerts_sent,
                        alerts_suppressed = report.alerts_suppressed,
                        alerts_failed = report.alerts_failed,
                        "Ingestion pass finished"
                    );
                    if let Some(line) = report.halted_at {
                        warn!(line = line, "Pass halted at malformed line");
                    }
                    Some(report)
                }
                Err(e) => {
                    error!(
                        error = %e,
                        error_code = e.error_code(),
                        transient = e.is_transient(),
                        "Ingestion pass failed"
                    );
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Wait for one batch and process it. `None` once the queue is closed.
    pub async fn run_once(&self, receiver: &mut RunReceiver) -> Option<Option<IngestReport>> {
        let batch = receiver.next_batch().await?;
        Some(self.process_batch(&batch).await)
    }

    /// Process batches until shutdown is flagged or every sender is gone.
    pub async fn run_loop(self, mut receiver: RunReceiver, mut shutdown: watch::Receiver<bool>) {
        info!(source = %self.ingester.source_path().display(), "Starting ingest worker");

        loop {
            let batch = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => break,
                batch = receiver.next_batch() => batch,
            };

            match batch {
                Some(batch) => {
                    self.process_batch(&batch).await;
                }
                None => break,
            }
        }

        info!("Ingest worker stopped");
    }

    /// Spawn [`IngestWorker::run_loop`] on the runtime
    pub fn spawn(self, receiver: RunReceiver, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run_loop(receiver, shutdown))
    }
}
