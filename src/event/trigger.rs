//! Pass triggers
//!
//! Triggers only enqueue run requests; they never touch the ingester.
//! - poll: fixed interval
//! - change: polls the source file's length and modification time and
//!   requests a pass when either moves

use crate::event::{RunSender, TriggerSource};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Observable state of the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSnapshot {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceSnapshot {
    /// `None` while the file does not exist
    pub fn observe(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// Request a pass every `period` until shutdown.
pub fn spawn_poll_trigger(
    sender: RunSender,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis() as u64, "Poll trigger started");

        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                _ = ticker.tick() => {
                    if !sender.request(TriggerSource::Poll) {
                        break;
                    }
                }
            }
        }

        debug!("Poll trigger stopped");
    })
}

/// Request a pass whenever the source file changes.
pub fn spawn_change_trigger(
    sender: RunSender,
    path: PathBuf,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = SourceSnapshot::observe(&path);
        info!(path = %path.display(), period_ms = period.as_millis() as u64, "Change trigger started");

        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                _ = ticker.tick() => {
                    let current = SourceSnapshot::observe(&path);
                    if current == last {
                        continue;
                    }
                    last = current;
                    if current.is_none() {
                        debug!(path = %path.display(), "Source log disappeared");
                        continue;
                    }
                    debug!(path = %path.display(), "Source log changed");
                    if !sender.request(TriggerSource::FileChanged) {
                        break;
                    }
                }
            }
        }

        debug!("Change trigger stopped");
    })
}

/// Resolves once shutdown is flagged or the flag's sender is dropped.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
