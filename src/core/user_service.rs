//! User use-cases.
//!
//! The service turns a validated payload into a record and hands it to the
//! configured [`UserRepository`]. It holds no state of its own beyond the
//! repository handle, so one instance is shared by all requests.
use std::sync::Arc;

use crate::{
    core::user::{CreateUserRequest, NewUser, User},
    ports::user_repository::{RepositoryResult, UserRepository},
};

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> RepositoryResult<User> {
        let user = NewUser::from(request);
        tracing::debug!(username = %user.username, "Creating user");
        self.repository.create_user(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_repository::MemoryUserRepository;

    #[tokio::test]
    async fn test_create_user_persists_submitted_fields() {
        let repository = Arc::new(MemoryUserRepository::new());
        let service = UserService::new(repository.clone());

        let user = service
            .create_user(CreateUserRequest {
                username: Some("alice".into()),
                password: Some("p".into()),
                email: Some("a@b.com".into()),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@b.com");
        assert!(!user.user_id.is_empty());
        assert_eq!(repository.len().await, 1);
    }
}
