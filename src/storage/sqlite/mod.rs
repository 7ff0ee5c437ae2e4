//! SQLite storage implementations
//!
//! SQLite is suitable for single-instance deployments and development.

mod users;

use crate::errors::StorageError;
use sqlx::sqlite::SqlitePool;

pub use users::SqliteUserStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// SQLite storage handle owning the pool and schema migrations
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    pub fn user_store(&self) -> SqliteUserStore {
        SqliteUserStore::new(self.pool.clone())
    }
}
