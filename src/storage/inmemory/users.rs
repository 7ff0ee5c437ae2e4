//! In-memory user storage

use crate::errors::StorageError;
use crate::storage::traits::*;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory implementation of user storage, keyed by normalized username
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.normalized_username) {
            return Err(StorageError::DuplicateUsername(user.username.clone()));
        }
        users.insert(user.normalized_username.clone(), user.clone());
        Ok(())
    }

    async fn get_user_by_username(&self, normalized_username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(normalized_username).cloned())
    }

    async fn list_users(&self, limit: Option<usize>) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut result: Vec<User> = users.values().cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            result.truncate(limit);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn create_test_user(username: &str) -> User {
        User {
            id: ulid::Ulid::new().to_string(),
            username: username.to_string(),
            normalized_username: normalize_username(username),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_user() {
        let store = MemoryUserStore::new();
        let user = create_test_user("Bob");

        store.insert_user(&user).await.unwrap();

        let found = store.get_user_by_username("bob").await.unwrap();
        assert_eq!(found, Some(user));
        assert!(store.get_user_by_username("Bob").await.unwrap().is_none());
        assert!(store.get_user_by_username("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_case_insensitive() {
        let store = MemoryUserStore::new();
        store.insert_user(&create_test_user("alice")).await.unwrap();

        let result = store.insert_user(&create_test_user("ALICE")).await;
        assert!(matches!(result, Err(StorageError::DuplicateUsername(name)) if name == "ALICE"));
        assert_eq!(store.list_users(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_single_winner() {
        let store = Arc::new(MemoryUserStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_user(&create_test_user("alice")).await })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(StorageError::DuplicateUsername(_)) => duplicates += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.list_users(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_users_limit() {
        let store = MemoryUserStore::new();
        for name in ["a", "b", "c"] {
            store.insert_user(&create_test_user(name)).await.unwrap();
        }
        assert_eq!(store.list_users(Some(2)).await.unwrap().len(), 2);
        assert_eq!(store.list_users(None).await.unwrap().len(), 3);
    }
}
