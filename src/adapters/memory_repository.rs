//! In-process user store for local runs and tests.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    core::user::{NewUser, User},
    ports::user_repository::{RepositoryResult, UserRepository},
};

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    pub async fn get(&self, id: &Uuid) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let user = user.with_generated_id();
        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            user_id: user.user_id,
            username: user.username,
            password: user.password,
            email: user.email,
            created_at: now,
            updated_at: now,
        };

        self.users.write().await.insert(record.id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password: "secret".to_string(),
            email: format!("{name}@example.com"),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_timestamps() {
        let repo = MemoryUserRepository::new();
        assert!(repo.is_empty().await);

        let user = repo.create_user(new_user("alice")).await.unwrap();

        assert!(Uuid::parse_str(&user.user_id).is_ok());
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(repo.get(&user.id).await, Some(user));
    }

    #[tokio::test]
    async fn test_keeps_caller_supplied_user_id() {
        let repo = MemoryUserRepository::new();
        let user = repo
            .create_user(NewUser {
                user_id: "ext-1".to_string(),
                ..new_user("bob")
            })
            .await
            .unwrap();

        assert_eq!(user.user_id, "ext-1");
    }

    #[tokio::test]
    async fn test_duplicate_payloads_create_distinct_records() {
        let repo = MemoryUserRepository::new();
        let first = repo.create_user(new_user("carol")).await.unwrap();
        let second = repo.create_user(new_user("carol")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repo.len().await, 2);
    }
}
