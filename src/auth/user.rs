//! # Users
//!
//! User model and the `UserStore` contract consumed by the identity service.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Login chosen at registration (unique)
    pub login: String,

    /// Argon2id PHC string (never plaintext)
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

/// Durable user storage
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; fails with `Duplicate` if the login is taken
    async fn create(&self, user: &User) -> StoreResult<()>;

    /// Fetch a user by login; fails with `NotFound` if absent
    async fn find_by_login(&self, login: &str) -> StoreResult<User>;

    async fn exists(&self, login: &str) -> StoreResult<bool>;
}

/// In-memory user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("Lock poisoned".to_string())
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;

        if users.iter().any(|u| u.login == user.login) {
            return Err(StoreError::Duplicate(user.login.clone()));
        }

        users.push(user.clone());
        Ok(())
    }

    async fn find_by_login(&self, login: &str) -> StoreResult<User> {
        let users = self.users.read().map_err(|_| poisoned())?;
        users
            .iter()
            .find(|u| u.login == login)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", login)))
    }

    async fn exists(&self, login: &str) -> StoreResult<bool> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.iter().any(|u| u.login == login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(login: &str) -> User {
        User {
            id: Uuid::new_v4(),
            login: login.to_string(),
            password_hash: "$argon2id$v=19$hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryUserStore::new();
        let alice = user("alice");

        store.create(&alice).await.unwrap();

        assert!(store.exists("alice").await.unwrap());
        assert!(!store.exists("bob").await.unwrap());
        assert_eq!(store.find_by_login("alice").await.unwrap().id, alice.id);
        assert!(matches!(
            store.find_by_login("bob").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_login_rejected() {
        let store = InMemoryUserStore::new();
        store.create(&user("alice")).await.unwrap();

        assert!(matches!(
            store.create(&user("alice")).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[test]
    fn test_serialization_omits_password_hash() {
        let alice = user("alice");
        let json = serde_json::to_string(&alice).unwrap();

        assert!(!json.contains("password_hash"));
        assert!(!json.contains(&alice.password_hash));
    }
}
