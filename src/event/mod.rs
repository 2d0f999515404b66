//! Event system module for the ingestion pipeline
//!
//! - Run request types
//! - Bounded single-consumer run queue
//! - Poll and file-change triggers
//! - The worker that turns requests into ingestion passes

pub mod queue;
pub mod trigger;
pub mod worker;

// Allow module_inception for event module naming
#[allow(clippy::module_inception)]
mod event_types;

pub use event_types::{RunRequest, TriggerSource};
pub use queue::{run_queue, RunReceiver, RunSender, DEFAULT_QUEUE_CAPACITY};
pub use trigger::{spawn_change_trigger, spawn_poll_trigger, SourceSnapshot};
pub use worker::IngestWorker;
