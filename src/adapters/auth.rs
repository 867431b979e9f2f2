//! HMAC service-to-service authentication filter.
//!
//! Reads `Service-Id`, `Service-Nonce` and `Service-Signature`, verifies the
//! signature against the caller's shared secret and either short-circuits
//! with a 401 or hands the request to the wrapped handler untouched.
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::{
    adapters::request::ApiRequest,
    core::{
        credentials::ServiceCredentials,
        envelope::HandlerResult,
        error::{ApiError, ErrorCode},
        signature::validate_hmac_digest,
    },
    metrics,
    ports::handler::{Handler, Middleware},
};

pub const SERVICE_ID_HEADER: &str = "Service-Id";
pub const SERVICE_NONCE_HEADER: &str = "Service-Nonce";
pub const SERVICE_SIGNATURE_HEADER: &str = "Service-Signature";

/// Middleware that authenticates callers with an HMAC digest.
#[derive(Debug, Clone)]
pub struct HmacDigestAuth {
    credentials: Arc<ServiceCredentials>,
}

impl HmacDigestAuth {
    pub fn new(credentials: Arc<ServiceCredentials>) -> Self {
        Self { credentials }
    }
}

impl Middleware for HmacDigestAuth {
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(Authenticated {
            credentials: self.credentials.clone(),
            next,
        })
    }
}

struct Authenticated {
    credentials: Arc<ServiceCredentials>,
    next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Authenticated {
    async fn call(&self, request: &mut ApiRequest) -> HandlerResult {
        let service_id = request.header(SERVICE_ID_HEADER);
        let nonce = request.header(SERVICE_NONCE_HEADER);
        let signature = request.header(SERVICE_SIGNATURE_HEADER);

        if !validate_hmac_digest(service_id, nonce, signature, &self.credentials) {
            tracing::warn!(
                service_id = %service_id,
                request_id = request.request_id().unwrap_or_default(),
                "Service authentication failed"
            );
            metrics::increment_auth_failures();
            return Err(ApiError::new(
                ErrorCode::Unauthorized,
                "Failed to authenticate",
                format!("serviceID:{service_id} serviceID is not whitelisted"),
                StatusCode::UNAUTHORIZED,
            ));
        }

        tracing::debug!(
            service_id = %service_id,
            uri = %request.uri(),
            "Service authenticated"
        );
        self.next.call(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{body::Body, http::Request};
    use serde_json::json;

    use super::*;
    use crate::core::signature::sign;

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Handler for Counting {
        async fn call(&self, _request: &mut ApiRequest) -> HandlerResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"handled": true}))
        }
    }

    fn guarded() -> (Arc<dyn Handler>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let credentials = Arc::new(ServiceCredentials::parse("svcA:alpha"));
        let handler = HmacDigestAuth::new(credentials).wrap(Arc::new(Counting {
            calls: calls.clone(),
        }));
        (handler, calls)
    }

    fn request(service_id: &str, nonce: &str, signature: &str) -> ApiRequest {
        ApiRequest::new(
            Request::builder()
                .uri("/api/v1/users")
                .header(SERVICE_ID_HEADER, service_id)
                .header(SERVICE_NONCE_HEADER, nonce)
                .header(SERVICE_SIGNATURE_HEADER, signature)
                .body(Body::empty())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_valid_signature_forwards_to_handler() {
        let (handler, calls) = guarded();
        let signature = sign("svcA", "n1", "alpha");

        let result = handler.call(&mut request("svcA", "n1", &signature)).await;

        assert_eq!(result.unwrap(), json!({"handled": true}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrong_signature_short_circuits() {
        let (handler, calls) = guarded();
        let signature = sign("svcA", "n1", "not-alpha");

        let err = handler
            .call(&mut request("svcA", "n1", &signature))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.description(), "Failed to authenticate");
        assert!(err.cause().contains("serviceID:svcA"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_headers_are_unauthorized() {
        let (handler, calls) = guarded();
        let mut req = ApiRequest::new(
            Request::builder()
                .uri("/api/v1/users")
                .body(Body::empty())
                .unwrap(),
        );

        let err = handler.call(&mut req).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unregistered_service_is_unauthorized() {
        let (handler, _) = guarded();
        let signature = sign("svcB", "n1", "alpha");

        let err = handler
            .call(&mut request("svcB", "n1", &signature))
            .await
            .unwrap_err();
        assert!(err.cause().starts_with("serviceID:svcB"));
    }
}
