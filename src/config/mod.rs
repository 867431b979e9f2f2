pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{DEFAULT_CONFIG_PATH, load_config, load_config_file};
pub use models::*;
pub use validation::{ConfigError, ConfigValidator, ValidationResult};
