//! Postgres-backed [`UserRepository`] built on a `sqlx` connection pool.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr};
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{
    config::models::DatabaseConfig,
    core::user::{NewUser, User},
    ports::user_repository::{RepositoryError, RepositoryResult, UserRepository},
};

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    user_id: String,
    username: String,
    password: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            password: row.password,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresUserRepository {
    /// Open the pool and check connectivity.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .wrap_err("Failed to connect to the database")?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .wrap_err("Database connectivity check failed")?;

        tracing::info!(
            min_connections = config.min_connections,
            max_connections = config.max_connections,
            "Database pool ready"
        );
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .wrap_err("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Unavailable(err.to_string())
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let user = user.with_generated_id();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (user_id, username, password, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, username, password, email, created_at, updated_at
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
