use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::models::{Environment, LoggingConfig};

/// Initialize logging for the given deployment environment.
///
/// `development` logs at `debug` to a pretty console; every other
/// environment logs at `info` as JSON. Explicit `logging` settings win over
/// those defaults, and `RUST_LOG` wins over both.
pub fn init_tracing(logging: &LoggingConfig, environment: Environment) -> Result<()> {
    let level = logging
        .level
        .clone()
        .unwrap_or_else(|| environment.default_log_level().to_string());
    let json = logging.json.unwrap_or(!environment.is_development());

    init_tracing_with_config(&level, json, json)
}

/// Initialize tracing with an explicit level directive and output format
pub fn init_tracing_with_config(level: &str, json_format: bool, include_spans: bool) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(level)?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json_format {
        Registry::default()
            .with(env_filter)
            .with(
                fmt_layer
                    .json()
                    .with_current_span(include_spans)
                    .with_span_list(include_spans),
            )
            .try_init()
            .wrap_err("Failed to install JSON tracing subscriber")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.pretty().with_ansi(true))
            .try_init()
            .wrap_err("Failed to install console tracing subscriber")?;
    }

    tracing::info!(
        level = %level,
        json = json_format,
        "Signet logging initialized"
    );
    Ok(())
}

/// Parse a level directive such as `signet=debug,tower_http=info`.
pub fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level: {level}"))
}

/// Create a request-scoped tracing span
pub fn create_request_span(method: &str, path: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        http.method = method,
        http.path = path,
        request_id = request_id,
    )
}
