//! Run request types for the ingestion work queue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What asked for an ingestion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Initial pass when the process starts
    Startup,
    /// Fixed-interval timer
    Poll,
    /// Source file length or modification time changed
    FileChanged,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerSource::Startup => "startup",
            TriggerSource::Poll => "poll",
            TriggerSource::FileChanged => "file_changed",
        };
        f.write_str(name)
    }
}

/// A queued instruction for the worker to run one pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub id: Uuid,
    pub source: TriggerSource,
    pub requested_at: DateTime<Utc>,
}

impl RunRequest {
    pub fn new(source: TriggerSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            requested_at: Utc::now(),
        }
    }
}
