use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::models::{AppConfig, StorageBackend};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ConfigError>;

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Application configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire configuration, reporting every problem at once
    pub fn validate(config: &AppConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if config.credentials().is_empty() {
            errors.push(ConfigError::MissingField {
                field: "service_credentials".to_string(),
            });
        }

        errors.extend(Self::validate_database(config));

        if config.server.max_body_bytes == 0 {
            errors.push(ConfigError::InvalidField {
                field: "server.max_body_bytes".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if let Some(level) = &config.logging.level {
            if let Err(e) = EnvFilter::try_new(level) {
                errors.push(ConfigError::InvalidField {
                    field: "logging.level".to_string(),
                    message: e.to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_database(config: &AppConfig) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let database = &config.database;

        if database.max_connections == 0 {
            errors.push(ConfigError::InvalidField {
                field: "database.max_connections".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        if database.min_connections > database.max_connections {
            errors.push(ConfigError::InvalidField {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Must not exceed max_connections ({})",
                    database.max_connections
                ),
            });
        }

        if config.storage == StorageBackend::Postgres {
            if database.url.is_empty() {
                errors.push(ConfigError::MissingField {
                    field: "database.url".to_string(),
                });
            } else if !(database.url.starts_with("postgres://")
                || database.url.starts_with("postgresql://"))
            {
                errors.push(ConfigError::InvalidField {
                    field: "database.url".to_string(),
                    message: "Must start with postgres:// or postgresql://".to_string(),
                });
            }
        }

        errors
    }

    fn format_multiple_errors(errors: Vec<ConfigError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
