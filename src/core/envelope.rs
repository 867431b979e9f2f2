//! Versioned JSON envelope wrapping every response.
//!
//! Success: `{"success": true, "data": ..., "api_version": v}`
//! Failure: `{"success": false, "error": {"code": ..., "message": ...}, "api_version": v}`
//!
//! The error's cause trail and HTTP status never appear in the body.
use bytes::Bytes;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use serde_json::Value;

use crate::core::error::{ApiError, ErrorCode};

/// Protocol generation served under `/api/v1`.
pub const API_VERSION_V1: u32 = 1;

/// What a handler (or filter) produces for one call.
pub type HandlerResult = Result<Value, ApiError>;

/// Public part of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code(),
            message: err.description().to_string(),
        }
    }
}

/// Final response shape, one of two fixed schemas.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub enum Envelope {
    Success { data: Value, api_version: u32 },
    Failure { error: ErrorBody, api_version: u32 },
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn api_version(&self) -> u32 {
        match self {
            Envelope::Success { api_version, .. } | Envelope::Failure { api_version, .. } => {
                *api_version
            }
        }
    }

    /// Serialize once for the wire. A failure is logged and yields an empty
    /// body rather than a second envelope.
    pub fn to_bytes(&self) -> Bytes {
        match serde_json::to_vec(self) {
            Ok(encoded) => Bytes::from(encoded),
            Err(e) => {
                tracing::error!(error = %e, "unable to marshal json response");
                Bytes::new()
            }
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 3)?;
        match self {
            Envelope::Success { data, api_version } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
                state.serialize_field("api_version", api_version)?;
            }
            Envelope::Failure { error, api_version } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
                state.serialize_field("api_version", api_version)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<ErrorBody>,
    api_version: u32,
}

impl TryFrom<RawEnvelope> for Envelope {
    type Error = String;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        match (raw.success, raw.error) {
            (true, None) => Ok(Envelope::Success {
                data: raw.data,
                api_version: raw.api_version,
            }),
            (false, Some(error)) => Ok(Envelope::Failure {
                error,
                api_version: raw.api_version,
            }),
            (true, Some(_)) => Err("success envelope must not carry an error".to_string()),
            (false, None) => Err("failure envelope is missing its error".to_string()),
        }
    }
}

/// Turns handler outcomes into envelopes for a fixed protocol version.
#[derive(Debug, Clone, Copy)]
pub struct ResponseBuilder {
    api_version: u32,
}

impl ResponseBuilder {
    pub fn new(api_version: u32) -> Self {
        Self { api_version }
    }

    pub fn build(&self, result: &HandlerResult) -> Envelope {
        match result {
            Ok(data) => self.success(data.clone()),
            Err(err) => self.failure(err),
        }
    }

    pub fn success(&self, data: Value) -> Envelope {
        Envelope::Success {
            data,
            api_version: self.api_version,
        }
    }

    pub fn failure(&self, err: &ApiError) -> Envelope {
        Envelope::Failure {
            error: ErrorBody::from(err),
            api_version: self.api_version,
        }
    }
}
