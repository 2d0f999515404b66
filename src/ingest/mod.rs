//! Incremental ingestion of the CLI telemetry log
//!
//! - `timestamp`: source-local time to UTC epoch seconds
//! - `record`: raw JSONL line to [`LogRecord`]
//! - `store`: append-only `logs` table
//! - `ingester`: one ingestion pass

pub mod ingester;
pub mod record;
pub mod store;
pub mod timestamp;

pub use ingester::{IngestReport, LineOutcome, LogIngester};
pub use record::{LogRecord, RecordParser};
pub use store::{RecordStore, SeaOrmRecordStore};
pub use timestamp::TimestampNormalizer;
