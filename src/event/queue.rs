//! Single-consumer work queue for ingestion passes
//!
//! Any number of triggers hold a [`RunSender`]; exactly one worker holds the
//! [`RunReceiver`], so passes never overlap.

use crate::event::{RunRequest, TriggerSource};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Default bound on queued requests
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Create a bounded run queue
pub fn run_queue(capacity: usize) -> (RunSender, RunReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (RunSender { tx }, RunReceiver { rx })
}

/// Producer side, cloned into every trigger
#[derive(Debug, Clone)]
pub struct RunSender {
    tx: mpsc::Sender<RunRequest>,
}

impl RunSender {
    /// Ask for a pass.
    ///
    /// Returns `false` once the worker is gone. A full queue already holds
    /// pending passes, so the request is dropped and `true` is returned.
    pub fn request(&self, source: TriggerSource) -> bool {
        match self.tx.try_send(RunRequest::new(source)) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                debug!(trigger = %request.source, "Run queue full, pass already pending");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the worker
#[derive(Debug)]
pub struct RunReceiver {
    rx: mpsc::Receiver<RunRequest>,
}

impl RunReceiver {
    /// Wait for the next request and drain everything already queued behind it.
    ///
    /// Returns `None` when every sender is dropped. Cancel safe.
    pub async fn next_batch(&mut self) -> Option<Vec<RunRequest>> {
        let first = self.rx.recv().await?;
        let mut batch = vec![first];
        while let Ok(request) = self.rx.try_recv() {
            batch.push(request);
        }
        Some(batch)
    }
}
