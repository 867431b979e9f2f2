//! Per-request envelope around the transport request.
//!
//! Owns the request head, the single-use body, path parameters copied in by
//! the dispatcher and a lazily built query-parameter view. The body can be
//! taken exactly once; reading it always drops (closes) the stream.
use std::collections::HashMap;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Request, Uri, request::Parts},
};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;

use crate::core::validation::{Validate, ValidationError, decode_json, validate};

/// Upper bound on bytes read from a request body unless configured otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Separator used when a query key repeats.
pub const QUERY_VALUE_SEPARATOR: &str = " | ";

/// Correlation id attached to the request extensions by the request-id layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

#[derive(Default)]
struct QueryParams {
    joined: HashMap<String, String>,
    values: HashMap<String, Vec<String>>,
}

pub struct ApiRequest {
    parts: Parts,
    body: Option<Body>,
    body_limit: usize,
    path_params: Option<HashMap<String, String>>,
    query: OnceCell<QueryParams>,
}

impl ApiRequest {
    pub fn new(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self::from_parts(parts, body)
    }

    pub fn from_parts(parts: Parts, body: Body) -> Self {
        Self {
            parts,
            body: Some(body),
            body_limit: DEFAULT_BODY_LIMIT,
            path_params: None,
            query: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// First value of a header, or `""` when absent or not valid UTF-8.
    pub fn header(&self, name: &str) -> &str {
        self.parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.as_str())
    }

    /// Store a path parameter; a repeated key overwrites the previous value.
    pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.path_params
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
    }

    /// Path parameter value, or `""` when unset.
    pub fn path_param(&self, key: &str) -> &str {
        self.path_params
            .as_ref()
            .and_then(|params| params.get(key))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Query parameters with repeated keys joined by `" | "`. Computed once per request.
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query().joined
    }

    /// Every value given for a query key, in request order.
    pub fn query_param_values(&self, key: &str) -> &[String] {
        self.query()
            .values
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn query(&self) -> &QueryParams {
        self.query.get_or_init(|| {
            let mut values: HashMap<String, Vec<String>> = HashMap::new();
            if let Some(raw) = self.parts.uri.query() {
                for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                    values
                        .entry(key.into_owned())
                        .or_default()
                        .push(value.into_owned());
                }
            }
            let joined = values
                .iter()
                .map(|(key, vals)| (key.clone(), vals.join(QUERY_VALUE_SEPARATOR)))
                .collect();
            QueryParams { joined, values }
        })
    }

    /// Take the body stream out of the request. Later reads see it as consumed.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Put a (re-buffered) body back so a later stage can read it.
    pub fn restore_body(&mut self, body: Body) {
        self.body = Some(body);
    }

    /// Read the whole body, consuming it.
    pub async fn read_body(&mut self) -> Result<Bytes, ValidationError> {
        let body = self
            .take_body()
            .ok_or_else(|| ValidationError::Unexpected("request body already consumed".into()))?;

        axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "error reading request body");
                ValidationError::Unexpected(format!("unable to read request body: {e}"))
            })
    }

    /// Decode the JSON body into `T`.
    pub async fn bind<T: DeserializeOwned>(&mut self) -> Result<T, ValidationError> {
        let bytes = self.read_body().await?;
        decode_json(&bytes)
    }

    /// Decode the JSON body and run `T`'s field rules. Decode errors win over rule errors.
    pub async fn parse_and_validate_body<T>(&mut self) -> Result<T, ValidationError>
    where
        T: DeserializeOwned + Validate,
    {
        let payload: T = self.bind().await?;
        validate(&payload)?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde::Deserialize;

    use super::*;
    use crate::core::user::CreateUserRequest;

    fn request(uri: &str, body: &str) -> ApiRequest {
        ApiRequest::new(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header("Service-Id", "svcA")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
    }

    #[test]
    fn test_header_lookup() {
        let req = request("/", "");
        assert_eq!(req.header("service-id"), "svcA");
        assert_eq!(req.header("Service-Nonce"), "");
    }

    #[test]
    fn test_path_params_last_write_wins() {
        let mut req = request("/", "");
        assert_eq!(req.path_param("id"), "");

        req.set_path_param("id", "1");
        req.set_path_param("id", "2");
        assert_eq!(req.path_param("id"), "2");
    }

    #[test]
    fn test_query_params_join_repeated_keys() {
        let req = request("/users?tag=a&tag=b%20c&page=2", "");

        assert_eq!(req.query_params().get("tag").unwrap(), "a | b c");
        assert_eq!(req.query_params().get("page").unwrap(), "2");
        assert_eq!(req.query_param_values("tag"), ["a", "b c"]);
        assert!(req.query_param_values("missing").is_empty());
    }

    #[test]
    fn test_query_params_without_query_string() {
        let req = request("/users", "");
        assert!(req.query_params().is_empty());
    }

    #[tokio::test]
    async fn test_bind_decodes_body_once() {
        #[derive(Debug, Deserialize)]
        struct Payload {
            name: String,
        }

        let mut req = request("/", r#"{"name":"ann"}"#);
        let payload: Payload = req.bind().await.unwrap();
        assert_eq!(payload.name, "ann");

        let second = req.bind::<Payload>().await.unwrap_err();
        assert_eq!(second.kind(), "Unexpected");
    }

    #[tokio::test]
    async fn test_restored_body_can_be_read_again() {
        let mut req = request("/", r#"{"a":1}"#);
        let bytes = req.read_body().await.unwrap();
        req.restore_body(Body::from(bytes.clone()));

        assert_eq!(req.read_body().await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_body_limit_is_enforced() {
        let mut req = request("/", r#"{"name":"a very long value"}"#).with_body_limit(4);
        let err = req.read_body().await.unwrap_err();
        assert_eq!(err.kind(), "Unexpected");
    }

    #[tokio::test]
    async fn test_decode_errors_take_priority_over_rules() {
        let mut req = request("/", r#"{"username": 5}"#);
        let err = req
            .parse_and_validate_body::<CreateUserRequest>()
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "InvalidType for field: username. Expected: string"
        );

        let mut req = request("/", r#"{"username": "#);
        let err = req
            .parse_and_validate_body::<CreateUserRequest>()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidJson");
    }

    #[tokio::test]
    async fn test_rule_errors_after_successful_decode() {
        let mut req = request("/", r#"{"username":"","password":"p","email":"a@b.com"}"#);
        let err = req
            .parse_and_validate_body::<CreateUserRequest>()
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "InvalidValue: username is a required field"
        );
    }
}
