//! PostgreSQL implementation for user storage

use crate::errors::StorageError;
use crate::storage::map_sqlx_error;
use crate::storage::traits::{Result, User, UserStore};
use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

/// PostgreSQL implementation of user storage
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Create a new PostgreSQL user store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert PostgreSQL row to User
    fn row_to_user(row: &PgRow) -> Result<User> {
        let get = |column: &str| -> Result<String> {
            row.try_get(column).map_err(|e| {
                StorageError::QueryFailed(format!("Failed to get {}: {}", column, e))
            })
        };

        let created_at: chrono::DateTime<chrono::Utc> = row
            .try_get("created_at")
            .map_err(|e| StorageError::QueryFailed(format!("Failed to get created_at: {}", e)))?;

        Ok(User {
            id: get("id")?,
            username: get("username")?,
            normalized_username: get("normalized_username")?,
            email: get("email")?,
            password_hash: get("password_hash")?,
            created_at,
        })
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, normalized_username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.normalized_username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, &user.username))?;

        Ok(())
    }

    async fn get_user_by_username(&self, normalized_username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, normalized_username, email, password_hash, created_at
            FROM users WHERE normalized_username = $1
            "#,
        )
        .bind(normalized_username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, normalized_username))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_users(&self, limit: Option<usize>) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, normalized_username, email, password_hash, created_at
            FROM users ORDER BY created_at, id LIMIT $1
            "#,
        )
        .bind(limit.map(|l| l as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(format!("Failed to list users: {}", e)))?;

        rows.iter().map(Self::row_to_user).collect()
    }
}
