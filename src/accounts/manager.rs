//! User account operations layered over a [`UserStore`].

use chrono::Utc;
use std::sync::Arc;
use ulid::Ulid;

use crate::accounts::password::PasswordHasher;
use crate::errors::StorageError;
use crate::storage::traits::{User, UserStore, normalize_username};

/// Creates, finds, and authenticates users
#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserManager {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Create a user with a freshly hashed password.
    ///
    /// Hashing runs on a blocking worker before the store is touched, so no
    /// store lock is held while it runs. Uniqueness is enforced by the store's
    /// atomic insert.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, StorageError> {
        let normalized_username = normalize_username(username);

        // Skip the expensive hash for names that are obviously taken.
        if self
            .store
            .get_user_by_username(&normalized_username)
            .await?
            .is_some()
        {
            return Err(StorageError::DuplicateUsername(username.to_string()));
        }

        let password_hash = self.hash_password(password.to_string()).await?;

        let user = User {
            id: Ulid::new().to_string(),
            username: username.trim().to_string(),
            normalized_username,
            email: email.trim().to_string(),
            password_hash,
            created_at: Utc::now(),
        };

        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User, StorageError> {
        self.store
            .get_user_by_username(&normalize_username(username))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("user '{}'", username)))
    }

    pub async fn verify_password(&self, user: &User, password: &str) -> bool {
        let hasher = self.hasher.clone();
        let password_hash = user.password_hash.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &password_hash))
            .await
            .unwrap_or(false)
    }

    pub async fn list_users(&self, limit: Option<usize>) -> Result<Vec<User>, StorageError> {
        self.store.list_users(limit).await
    }

    async fn hash_password(&self, password: String) -> Result<String, StorageError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| StorageError::HashingFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::password::Argon2PasswordHasher;
    use crate::config::PasswordHashingParams;
    use crate::storage::inmemory::MemoryUserStore;

    fn create_test_manager() -> UserManager {
        let hasher = Argon2PasswordHasher::new(&PasswordHashingParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        UserManager::new(Arc::new(MemoryUserStore::new()), Arc::new(hasher))
    }

    #[tokio::test]
    async fn test_create_find_verify_round_trip() {
        let manager = create_test_manager();

        let created = manager
            .create("bob", "bob@x.com", "CorrectPass1!")
            .await
            .unwrap();
        assert_ne!(created.password_hash, "CorrectPass1!");

        let found = manager.find_by_username("bob").await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "bob@x.com");

        assert!(manager.verify_password(&found, "CorrectPass1!").await);
        assert!(!manager.verify_password(&found, "wrong").await);
    }

    #[tokio::test]
    async fn test_find_by_username_not_found() {
        let manager = create_test_manager();
        assert!(matches!(
            manager.find_by_username("nobody").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let manager = create_test_manager();
        manager
            .create("Carol", "carol@x.com", "CorrectPass1!")
            .await
            .unwrap();

        let found = manager.find_by_username("CAROL").await.unwrap();
        assert_eq!(found.username, "Carol");
        assert!(matches!(
            manager.create("carol", "other@x.com", "CorrectPass1!").await,
            Err(StorageError::DuplicateUsername(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_create_single_winner() {
        let manager = create_test_manager();

        let (first, second) = futures::join!(
            manager.create("alice", "alice@x.com", "CorrectPass1!"),
            manager.create("alice", "alice2@x.com", "CorrectPass1!"),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(StorageError::DuplicateUsername(_))))
                .count(),
            1
        );
        assert_eq!(manager.list_users(None).await.unwrap().len(), 1);
    }
}
