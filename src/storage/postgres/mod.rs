//! PostgreSQL storage implementations
//!
//! PostgreSQL is suitable for production deployments with multiple instances.

mod users;

use crate::errors::StorageError;
use sqlx::postgres::PgPool;

pub use users::PostgresUserStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// PostgreSQL storage handle owning the pool and schema migrations
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/postgres")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    pub fn user_store(&self) -> PostgresUserStore {
        PostgresUserStore::new(self.pool.clone())
    }
}
