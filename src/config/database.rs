//! Record store connection and schema bootstrap

use crate::entity::log;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::time::Duration;
use tracing::{error, info};

/// Only the worker writes, one pass at a time
const MAX_CONNECTIONS: u32 = 4;

/// Connect to the record store and make sure the `logs` table exists.
///
/// The table is created when absent and never altered afterwards.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(MAX_CONNECTIONS)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await.map_err(|e| {
        error!(error = %e, "Failed to connect to record store");
        e
    })?;
    info!("Connected to record store");

    ensure_logs_table(&db).await?;
    Ok(db)
}

async fn ensure_logs_table(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut create = Schema::new(backend).create_table_from_entity(log::Entity);
    create.if_not_exists();

    db.execute(backend.build(&create)).await.map_err(|e| {
        error!(error = %e, table = "logs", "Failed to create table");
        e
    })?;

    info!(table = "logs", "Record store schema ready");
    Ok(())
}
