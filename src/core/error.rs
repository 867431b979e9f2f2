//! Wire-facing error model.
//!
//! Every failed call produces exactly one [`ApiError`]. The `code` and
//! `description` travel to the client inside the failure envelope; the
//! `cause` trail and HTTP status stay on the server side (logs, status line).
use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Machine-readable error code carried in the failure envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    BadRequest,
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::InternalServerError => "internal_server_error",
        }
    }

    /// Status used when an error of this kind is built through the shorthand constructors.
    pub fn default_status(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request failure.
///
/// `code`, `description` and `status` are fixed at construction. The cause
/// trail can only grow, through [`ApiError::with_cause`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "code: {code} description: {description} httpStatusCode: {} cause: {cause}",
    status.as_u16()
)]
pub struct ApiError {
    code: ErrorCode,
    description: String,
    cause: String,
    status: StatusCode,
}

impl ApiError {
    pub fn new(
        code: ErrorCode,
        description: impl Into<String>,
        cause: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            code,
            description: description.into(),
            cause: cause.into(),
            status,
        }
    }

    /// 400 with a user-safe description.
    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::of_kind(ErrorCode::BadRequest, description)
    }

    /// 401 with a user-safe description.
    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self::of_kind(ErrorCode::Unauthorized, description)
    }

    /// 500 with a user-safe description.
    pub fn internal(description: impl Into<String>) -> Self {
        Self::of_kind(ErrorCode::InternalServerError, description)
    }

    fn of_kind(code: ErrorCode, description: impl Into<String>) -> Self {
        Self::new(code, description, String::new(), code.default_status())
    }

    /// Append to the cause trail; segments are joined with `:`.
    #[must_use]
    pub fn with_cause(mut self, cause: impl AsRef<str>) -> Self {
        let cause = cause.as_ref();
        if cause.is_empty() {
            return self;
        }
        if self.cause.is_empty() {
            self.cause = cause.to_string();
        } else {
            self.cause.push(':');
            self.cause.push_str(cause);
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}
