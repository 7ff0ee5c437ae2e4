//! SQLite implementation for user storage

use crate::errors::StorageError;
use crate::storage::map_sqlx_error;
use crate::storage::traits::{Result, User, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of user storage
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Create a new SQLite user store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert SQLite row to User
    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let get = |column: &str| -> Result<String> {
            row.try_get(column).map_err(|e| {
                StorageError::QueryFailed(format!("Failed to get {}: {}", column, e))
            })
        };

        let created_at_str = get("created_at")?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid created_at timestamp: {}", e)))?
            .with_timezone(&Utc);

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
impl UserStore for SqliteUserStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, normalized_username, email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.normalized_username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, &user.username))?;

        Ok(())
    }

    async fn get_user_by_username(&self, normalized_username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, normalized_username, email, password_hash, created_at
            FROM users WHERE normalized_username = ?
            "#,
        )
        .bind(normalized_username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, normalized_username))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_users(&self, limit: Option<usize>) -> Result<Vec<User>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = sqlx::query(
            r#"
            SELECT id, username, normalized_username, email, password_hash, created_at
            FROM users ORDER BY created_at, id LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(format!("Failed to list users: {}", e)))?;

        rows.iter().map(Self::row_to_user).collect()
    }
}
