pub mod credentials;
pub mod envelope;
pub mod error;
pub mod signature;
pub mod user;
pub mod user_service;
pub mod validation;

pub use credentials::ServiceCredentials;
pub use envelope::{Envelope, HandlerResult, ResponseBuilder};
pub use error::{ApiError, ErrorCode};
pub use user_service::UserService;
