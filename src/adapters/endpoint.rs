//! Request dispatcher: composes filters and a handler into one endpoint and
//! turns whatever comes out (payload, error or panic) into exactly one
//! enveloped JSON response.
//!
//! Per request the stages run strictly in order:
//!
//! ```text
//! received ─▶ filters ─▶ body inspection ─▶ handler ─▶ responded
//!                │                              │
//!                └──── error ──────────────────▶┤
//!                                     panic ───▶┘ (internal error)
//! ```
//!
//! An [`Endpoint`] holds only immutable, shared state and is cloned into the
//! router; any number of requests may run through it concurrently.
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams},
    http::{HeaderValue, Request, StatusCode, header},
    response::Response,
};
use futures_util::FutureExt;
use serde_json::Value;

use crate::{
    adapters::request::{ApiRequest, DEFAULT_BODY_LIMIT},
    core::{
        envelope::{API_VERSION_V1, HandlerResult, ResponseBuilder},
        error::{ApiError, ErrorCode},
    },
    metrics,
    ports::handler::{Handler, Middleware},
};

/// Description returned for recovered faults when details are concealed.
pub const GENERIC_FAULT_DESCRIPTION: &str = "internal server error";

/// Whether a recovered fault's text may reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDetail {
    /// Put the raw fault text in the error description.
    Expose,
    /// Use [`GENERIC_FAULT_DESCRIPTION`]; the raw text only goes to the cause trail and logs.
    Conceal,
}

#[derive(Debug, Clone, Copy)]
pub struct EndpointOptions {
    pub max_body_bytes: usize,
    pub fault_detail: FaultDetail,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_BODY_LIMIT,
            fault_detail: FaultDetail::Conceal,
        }
    }
}

/// One routed endpoint.
#[derive(Clone)]
pub struct Endpoint {
    name: Arc<str>,
    builder: ResponseBuilder,
    chain: Arc<dyn Handler>,
    options: EndpointOptions,
}

/// Build a version-1 endpoint: `middleware` wraps the body inspection
/// stage, which wraps `handler`.
pub fn serve_v1_endpoint(
    name: &str,
    middleware: &dyn Middleware,
    handler: Arc<dyn Handler>,
    options: EndpointOptions,
) -> Endpoint {
    serve(name, ResponseBuilder::new(API_VERSION_V1), middleware, handler, options)
}

pub fn serve(
    name: &str,
    builder: ResponseBuilder,
    middleware: &dyn Middleware,
    handler: Arc<dyn Handler>,
    options: EndpointOptions,
) -> Endpoint {
    let inspected: Arc<dyn Handler> = Arc::new(InspectBody { next: handler });
    Endpoint {
        name: Arc::from(name),
        builder,
        chain: middleware.wrap(inspected),
        options,
    }
}

impl Endpoint {
    /// Run one request through the chain and produce its response.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let timer = metrics::RequestTimer::new(&self.name);
        let (mut parts, body) = request.into_parts();

        let path_params = RawPathParams::from_request_parts(&mut parts, &()).await.ok();
        let mut request =
            ApiRequest::from_parts(parts, body).with_body_limit(self.options.max_body_bytes);
        if let Some(params) = path_params {
            for (key, value) in params.iter() {
                request.set_path_param(key, value);
            }
        }
        let request_id = request.request_id().unwrap_or_default().to_string();

        let result = match AssertUnwindSafe(self.chain.call(&mut request))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(fault) => Err(self.recover(fault.as_ref(), &request_id)),
        };

        let response = self.respond(result, &request_id);
        tracing::debug!(
            endpoint = %self.name,
            request_id = %request_id,
            status = response.status().as_u16(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }

    fn recover(&self, fault: &(dyn Any + Send), request_id: &str) -> ApiError {
        let message = panic_message(fault);
        tracing::error!(
            endpoint = %self.name,
            request_id = %request_id,
            fault = %message,
            "Recovered from handler panic"
        );
        metrics::increment_handler_panics();

        let description = match self.options.fault_detail {
            FaultDetail::Expose => message.clone(),
            FaultDetail::Conceal => GENERIC_FAULT_DESCRIPTION.to_string(),
        };
        ApiError::new(
            ErrorCode::InternalServerError,
            description,
            message,
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    }

    fn respond(&self, result: HandlerResult, request_id: &str) -> Response {
        let status = response_code(&result);

        let code = match &result {
            Ok(_) => "",
            Err(err) => {
                if status.is_server_error() {
                    tracing::error!(
                        endpoint = %self.name,
                        request_id = %request_id,
                        code = %err.code(),
                        cause = %err.cause(),
                        "Request failed"
                    );
                } else {
                    tracing::info!(
                        endpoint = %self.name,
                        request_id = %request_id,
                        code = %err.code(),
                        cause = %err.cause(),
                        "Request rejected"
                    );
                }
                err.code().as_str()
            }
        };
        metrics::increment_request_total(&self.name, status.as_u16(), code);

        envelope_response(&self.builder, &result)
    }
}

/// Envelope bytes for `result` with its status and a JSON content type.
pub fn envelope_response(builder: &ResponseBuilder, result: &HandlerResult) -> Response {
    let body = builder.build(result).to_bytes();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = response_code(result);
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Status line for a call outcome.
pub fn response_code(result: &HandlerResult) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(err) => err.status(),
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(fault: &(dyn Any + Send)) -> String {
    if let Some(message) = fault.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = fault.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown fault".to_string()
    }
}

/// Buffers the body for diagnostic logging and puts it back for the handler.
struct InspectBody {
    next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for InspectBody {
    async fn call(&self, request: &mut ApiRequest) -> HandlerResult {
        let bytes = match request.read_body().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return Err(ApiError::bad_request("unable to read request body")
                    .with_cause(e.to_string()));
            }
        };

        if !bytes.is_empty() {
            if let Err(e) = serde_json::from_slice::<Value>(&bytes) {
                tracing::info!(
                    request_id = request.request_id().unwrap_or_default(),
                    error = %e,
                    "Error while decoding the request body"
                );
            }
        }

        request.restore_body(Body::from(bytes));
        self.next.call(request).await
    }
}
