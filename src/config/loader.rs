use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::AppConfig;

/// Prefix for environment overrides, e.g. `SIGNET_DATABASE__URL`.
pub const ENV_PREFIX: &str = "SIGNET";

/// Default config file looked up when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "signet.toml";

/// Load configuration from an optional file overlaid by `SIGNET_*` environment variables.
///
/// A missing file is not an error; the environment (and built-in defaults) then
/// supply every value.
pub fn load_config(config_path: &str) -> Result<AppConfig> {
    let builder = Config::builder()
        .add_source(file_source(config_path)?.required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    build(builder, config_path)
}

/// Load configuration from the file only; used by the `validate` command.
pub fn load_config_file(config_path: &str) -> Result<AppConfig> {
    let builder = Config::builder().add_source(file_source(config_path)?.required(true));
    build(builder, config_path)
}

fn file_source(config_path: &str) -> Result<File<config::FileSourceFile, FileFormat>> {
    let path = Path::new(config_path);

    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml,
    };

    let name = path
        .to_str()
        .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", path.display()))?;
    Ok(File::new(name, format))
}

fn build(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    config_path: &str,
) -> Result<AppConfig> {
    let settings = builder
        .build()
        .with_context(|| format!("Failed to build config from {config_path}"))?;

    settings
        .try_deserialize()
        .with_context(|| format!("Failed to deserialize config from {config_path}"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::models::StorageBackend;

    #[test]
    fn test_load_toml_config() {
        let toml_content = r#"
environment = "production"
listen_addr = "127.0.0.1:3000"
service_credentials = "svcA:alpha|svcB:beta"
storage = "memory"

[server]
max_body_bytes = 2048
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config_file(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.server.max_body_bytes, 2048);
        assert_eq!(config.credentials().len(), 2);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_load_json_config() {
        let json_content = r#"
{
  "listen_addr": "127.0.0.1:3000",
  "service_credentials": "svcA:alpha",
  "database": {
    "url": "postgres://localhost/signet",
    "max_connections": 4
  }
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config_file(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.database.url, "postgres://localhost/signet");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.min_connections, 1);
    }

    #[test]
    fn test_missing_file_is_required_for_file_only_load() {
        assert!(load_config_file("/definitely/not/here/signet.toml").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config("/definitely/not/here/signet.toml").unwrap();
        assert!(!config.listen_addr.is_empty());
    }
}
