//! Test database setup and management

use polls::repository::{DbRepository, MemoryRepository, PollRepository};
use sea_orm::{ConnectionTrait, DbErr, Statement};
use std::sync::Arc;
use tempfile::TempDir;

/// A SQLite database living in its own temporary directory.
/// The directory, and the database with it, is removed on drop.
pub struct TestDatabase {
    _dir: TempDir,
    pub repo: Arc<DbRepository>,
}

impl TestDatabase {
    /// The repository as the handlers see it.
    pub fn repo(&self) -> Arc<dyn PollRepository> {
        self.repo.clone()
    }

    /// Drops a table so the next write touching it fails.
    pub async fn drop_table(&self, table: &str) -> Result<(), DbErr> {
        let conn = self.repo.connection();
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            format!("DROP TABLE {}", table),
        ))
        .await?;
        Ok(())
    }
}

/// Setup a fresh test database with the schema applied.
pub async fn setup_test_database() -> Result<TestDatabase, DbErr> {
    let dir = tempfile::tempdir().map_err(|e| DbErr::Custom(e.to_string()))?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("polls.db").display());

    let db = polls::db::init_db(&url, 1).await?;

    Ok(TestDatabase {
        _dir: dir,
        repo: Arc::new(DbRepository::new(db)),
    })
}

/// In-memory repository for tests that don't care about SQL.
pub fn setup_memory_repository() -> Arc<dyn PollRepository> {
    Arc::new(MemoryRepository::new())
}
