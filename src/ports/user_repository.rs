use async_trait::async_trait;
use thiserror::Error;

use crate::core::user::{NewUser, User};

/// Error type for user persistence operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RepositoryError {
    /// The store could not be reached or refused the connection
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the query
    #[error("Query failed: {0}")]
    Query(String),
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// UserRepository defines the port (interface) for persisting users
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user
    ///
    /// # Arguments
    /// * `user` - The user to store; `user_id` is generated when empty
    ///
    /// # Returns
    /// The saved record including its store-assigned `id` and timestamps
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;
}
