//! `POST /api/v1/users` controller.
use async_trait::async_trait;

use crate::{
    adapters::request::ApiRequest,
    core::{
        envelope::HandlerResult, error::ApiError, user::CreateUserRequest,
        user_service::UserService,
    },
    ports::handler::Handler,
};

pub struct CreateUserHandler {
    service: UserService,
}

impl CreateUserHandler {
    pub fn new(service: UserService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Handler for CreateUserHandler {
    async fn call(&self, request: &mut ApiRequest) -> HandlerResult {
        let payload: CreateUserRequest = request
            .parse_and_validate_body()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        let user = self.service.create_user(payload).await.map_err(|e| {
            ApiError::internal("failed to create user").with_cause(e.to_string())
        })?;

        tracing::info!(
            id = %user.id,
            user_id = %user.user_id,
            request_id = request.request_id().unwrap_or_default(),
            "User created"
        );

        serde_json::to_value(&user).map_err(|e| {
            ApiError::internal("failed to encode user").with_cause(e.to_string())
        })
    }
}
