//! Database connection and schema bootstrap.

use crate::app_config::DatabaseConfig;
use crate::orm::{admin_users, choices, polls};
use crate::repository::{DbRepository, MemoryRepository, PollRepository};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::sync::Arc;

/// Opens a pooled connection and makes sure the tables exist.
pub async fn init_db(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(max_connections)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    create_schema(&db).await?;
    Ok(db)
}

/// Creates the tables derived from the entities when they are missing.
/// Parents come before children so the foreign keys resolve.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = vec![
        schema.create_table_from_entity(polls::Entity),
        schema.create_table_from_entity(choices::Entity),
        schema.create_table_from_entity(admin_users::Entity),
    ];

    for stmt in statements.iter_mut() {
        db.execute(backend.build(stmt.if_not_exists())).await?;
    }

    log::debug!("Schema ready on {:?}", backend);
    Ok(())
}

/// Builds the repository selected by the configuration.
pub async fn open_repository(config: &DatabaseConfig) -> Result<Arc<dyn PollRepository>, DbErr> {
    if config.is_memory() {
        log::warn!("Using the in-memory repository. Nothing will be persisted.");
        return Ok(Arc::new(MemoryRepository::new()));
    }

    let db = init_db(&config.resolved_url(), config.connections).await?;
    Ok(Arc::new(DbRepository::new(db)))
}
