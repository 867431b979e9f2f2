//! Router assembly.
use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::Response,
    routing::post,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    adapters::{
        auth::HmacDigestAuth,
        endpoint::{EndpointOptions, FaultDetail, envelope_response, serve_v1_endpoint},
        middleware::{
            REQUEST_ID_HEADER, request_id_middleware, request_timing_middleware,
            security_headers_middleware,
        },
        user_handler::CreateUserHandler,
    },
    config::models::AppConfig,
    core::{
        envelope::{API_VERSION_V1, ResponseBuilder},
        error::{ApiError, ErrorCode},
        user_service::UserService,
    },
    ports::user_repository::UserRepository,
};

pub const USERS_PATH: &str = "/api/v1/users";

/// Build the application router for the given configuration and store.
pub fn build_router(config: &AppConfig, repository: Arc<dyn UserRepository>) -> Router {
    let credentials = Arc::new(config.credentials());
    tracing::info!(
        services = credentials.len(),
        "Loaded service credentials"
    );

    let auth = HmacDigestAuth::new(credentials);
    let options = EndpointOptions {
        max_body_bytes: config.server.max_body_bytes,
        fault_detail: if config.expose_fault_details() {
            FaultDetail::Expose
        } else {
            FaultDetail::Conceal
        },
    };

    let create_user = serve_v1_endpoint(
        USERS_PATH,
        &auth,
        Arc::new(CreateUserHandler::new(UserService::new(repository))),
        options,
    );

    Router::new()
        .route(
            USERS_PATH,
            post(move |req: Request| async move { create_user.dispatch(req).await }),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors_layer(&config.origins()))
        .layer(middleware::from_fn(request_timing_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}

/// Envelope for a known path called with a method it does not serve.
async fn method_not_allowed() -> Response {
    let err = ApiError::new(
        ErrorCode::BadRequest,
        "method not allowed",
        "",
        StatusCode::METHOD_NOT_ALLOWED,
    );
    envelope_response(&ResponseBuilder::new(API_VERSION_V1), &Err(err))
}

/// CORS policy: the listed origins with credentials, or any origin (mirrored)
/// when the list is empty or contains `*`.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Skipping invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::adapters::memory_repository::MemoryUserRepository;

    fn app(origins: &str) -> Router {
        let config = AppConfig {
            service_credentials: "svcA:alpha".to_string(),
            allowed_origins: origins.to_string(),
            ..AppConfig::default()
        };
        build_router(&config, Arc::new(MemoryUserRepository::new()))
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri(USERS_PATH)
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "service-id")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_for_listed_origin() {
        let response = app("https://app.example")
            .oneshot(preflight("https://app.example"))
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "https://app.example"
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "service-id"
        );
    }

    #[tokio::test]
    async fn test_preflight_for_unlisted_origin_has_no_allow_origin() {
        let response = app("https://app.example")
            .oneshot(preflight("https://evil.example"))
            .await
            .unwrap();

        assert!(
            response
                .headers()
                .get("access-control-allow-origin")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_wildcard_mirrors_origin() {
        let response = app("*")
            .oneshot(preflight("https://any.example"))
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://any.example"
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = app("*")
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v2/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_method_gets_envelope() {
        let response = app("*")
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri(USERS_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": {"code": "bad_request", "message": "method not allowed"},
                "api_version": 1
            })
        );
    }
}
