//! User records and the create-user payload.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::validation::{FieldRules, Rule, Validate};

/// Body of `POST /api/v1/users`.
///
/// Fields are optional at the decoding stage so a missing key is reported
/// by validation ("... is a required field") rather than as a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Validate for CreateUserRequest {
    const RULES: &'static [FieldRules] = &[
        FieldRules::new("username", &[Rule::Required, Rule::NotBlank]),
        FieldRules::new("password", &[Rule::Required, Rule::NotBlank]),
        FieldRules::new("email", &[Rule::Required, Rule::NotBlank]),
    ];

    fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "username" => self.username.as_deref(),
            "password" => self.password.as_deref(),
            "email" => self.email.as_deref(),
            _ => None,
        }
    }
}

/// A user about to be persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    /// External identifier; generated by the repository when empty.
    pub user_id: String,
    pub username: String,
    pub password: String,
    pub email: String,
}

impl NewUser {
    /// Fill in `user_id` with a fresh UUID if the caller did not provide one.
    #[must_use]
    pub fn with_generated_id(mut self) -> Self {
        if self.user_id.is_empty() {
            self.user_id = Uuid::new_v4().to_string();
        }
        self
    }
}

impl From<CreateUserRequest> for NewUser {
    fn from(request: CreateUserRequest) -> Self {
        Self {
            user_id: String::new(),
            username: request.username.unwrap_or_default(),
            password: request.password.unwrap_or_default(),
            email: request.email.unwrap_or_default(),
        }
    }
}

/// A persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub user_id: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
