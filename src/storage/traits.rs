//! Storage trait definitions for user accounts.
//!
//! Defines the async user store interface implemented by the in-memory,
//! SQLite, and PostgreSQL backends.

use crate::errors::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Registered end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// ULID assigned at creation
    pub id: String,
    /// Username as entered
    pub username: String,
    /// Lowercased username used for lookups and uniqueness
    pub normalized_username: String,
    pub email: String,
    /// Argon2 PHC string; never the plaintext password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Canonical form used for username uniqueness and lookups
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Trait for storing and retrieving users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user.
    ///
    /// Fails with `DuplicateUsername` when a user with the same normalized
    /// username exists. The check and the insert are a single atomic step.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Retrieve a user by normalized username
    async fn get_user_by_username(&self, normalized_username: &str) -> Result<Option<User>>;

    /// List users ordered by creation time (for admin purposes)
    async fn list_users(&self, limit: Option<usize>) -> Result<Vec<User>>;
}
