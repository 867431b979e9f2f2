//! Signet - a user service behind an authenticated JSON request pipeline.
//!
//! Every call travels through the same pipeline: the caller is authenticated
//! with an HMAC-SHA1 service signature, the JSON body is decoded and checked
//! against declarative field rules, a handler produces a payload or a single
//! typed error, and the dispatcher wraps the outcome in a versioned envelope.
//! A panicking handler is recovered and answered with an internal error, so a
//! request always gets exactly one well-formed response.
//!
//! # Wire format
//! ```text
//! {"success":true,"data":{...},"api_version":1}
//! {"success":false,"error":{"code":"bad_request","message":"..."},"api_version":1}
//! ```
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use signet::{adapters::{MemoryUserRepository, build_router}, config::AppConfig};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = AppConfig {
//!     service_credentials: "svcA:alpha".to_string(),
//!     ..AppConfig::default()
//! };
//! let app = build_router(&config, Arc::new(MemoryUserRepository::new()));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! the pipeline's pure logic (errors, validation, envelopes, signatures) inside `core`.
//!
//! # Error Handling
//! Request-path failures are [`core::ApiError`] values carrying a code, a client-safe
//! description, an internal cause trail and an HTTP status. Start-up and CLI code returns
//! `eyre::Result<T>` with context attached via `WrapErr`.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{Endpoint, HmacDigestAuth, build_router, serve_v1_endpoint},
    core::{ApiError, Envelope, ErrorCode, ServiceCredentials, UserService},
    ports::{
        handler::{Handler, Middleware},
        user_repository::UserRepository,
    },
    utils::GracefulShutdown,
};
