//! Append-only record store backed by the `logs` table

use super::record::LogRecord;
use crate::entity::log;
use crate::utils::AppError;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set, TransactionTrait};
use tracing::{debug, error};

/// Result type for record store operations
pub type StoreResult<T> = Result<T, AppError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append all records in one transaction, in order.
    ///
    /// Either every record is committed or none is.
    async fn insert_batch(&self, records: &[LogRecord]) -> StoreResult<u64>;

    /// Number of stored records
    async fn count(&self) -> StoreResult<u64>;
}

/// sea-orm implementation of [`RecordStore`]
#[derive(Debug, Clone)]
pub struct SeaOrmRecordStore {
    db: DatabaseConnection,
}

impl SeaOrmRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn to_active_model(record: &LogRecord) -> log::ActiveModel {
    log::ActiveModel {
        timestamp: Set(record.timestamp_utc),
        command: Set(record.command.clone()),
        subcommand: Set(record.subcommand.clone()),
        args: Set(record.args.clone()),
        output: Set(record.output.clone()),
        duration: Set(record.duration_seconds),
        ..Default::default()
    }
}

#[async_trait]
impl RecordStore for SeaOrmRecordStore {
    async fn insert_batch(&self, records: &[LogRecord]) -> StoreResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction");
            AppError::storage(e.to_string())
        })?;

        for record in records {
            to_active_model(record).insert(&txn).await.map_err(|e| {
                error!(error = %e, "Failed to insert log record");
                AppError::storage(e.to_string())
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit log records");
            AppError::storage(e.to_string())
        })?;

        debug!(count = records.len(), "Committed log records");
        Ok(records.len() as u64)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(log::Entity::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::establish_connection;
    use sea_orm::QueryOrder;
    use std::env::temp_dir;
    use uuid::Uuid;

    async fn create_test_store() -> SeaOrmRecordStore {
        let dir = temp_dir().join(format!("test_record_store_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("Failed to create test dir");
        let url = format!("sqlite://{}?mode=rwc", dir.join("logs.db").display());
        let db = establish_connection(&url).await.expect("Failed to connect");
        SeaOrmRecordStore::new(db)
    }

    fn record(command: &str, output: &str) -> LogRecord {
        LogRecord {
            timestamp_utc: 1_705_302_000,
            command: command.to_string(),
            subcommand: "deploy".to_string(),
            args: "--verbose".to_string(),
            output: output.to_string(),
            duration_seconds: 0.5,
        }
    }

    #[tokio::test]
    async fn should_insert_records_with_increasing_ids() {
        // Arrange
        let store = create_test_store().await;
        let records = vec![record("stylus", "ok"), record("cargo", "error: boom")];

        // Act
        let inserted = store.insert_batch(&records).await.expect("insert");

        // Assert
        assert_eq!(inserted, 2);
        let rows = log::Entity::find()
            .order_by_asc(log::Column::Id)
            .all(store.connection())
            .await
            .expect("query");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].id < rows[1].id);
        assert_eq!(rows[0].command, "stylus");
        assert_eq!(rows[1].output, "error: boom");
        assert_eq!(rows[1].timestamp, 1_705_302_000);
        assert_eq!(rows[1].duration, 0.5);
    }

    #[tokio::test]
    async fn should_do_nothing_for_empty_batch() {
        let store = create_test_store().await;

        assert_eq!(store.insert_batch(&[]).await.expect("insert"), 0);
        assert_eq!(store.count().await.expect("count"), 0);
    }
}
