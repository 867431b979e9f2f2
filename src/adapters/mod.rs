pub mod auth;
pub mod endpoint;
pub mod memory_repository;
pub mod middleware;
pub mod postgres_repository;
pub mod request;
pub mod routes;
pub mod user_handler;

/// Re-export commonly used types from adapters
pub use auth::HmacDigestAuth;
pub use endpoint::{Endpoint, EndpointOptions, FaultDetail, serve_v1_endpoint};
pub use memory_repository::MemoryUserRepository;
pub use postgres_repository::PostgresUserRepository;
pub use request::ApiRequest;
pub use routes::build_router;
