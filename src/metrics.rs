//! Lightweight metrics helpers.
//!
//! Thin wrappers over the `metrics` crate macros. No exporter is embedded;
//! the hosting process installs whichever recorder it wants, and without one
//! every call is a no-op.
//!
//! Provided metrics:
//! * `signet_requests_total` (counter; labels `endpoint`, `status`, `code`)
//! * `signet_request_duration_seconds` (histogram; label `endpoint`)
//! * `signet_auth_failures_total` (counter)
//! * `signet_handler_panics_total` (counter)
use std::time::{Duration, Instant};

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::Lazy;

pub const SIGNET_REQUESTS_TOTAL: &str = "signet_requests_total";
pub const SIGNET_REQUEST_DURATION_SECONDS: &str = "signet_request_duration_seconds";
pub const SIGNET_AUTH_FAILURES_TOTAL: &str = "signet_auth_failures_total";
pub const SIGNET_HANDLER_PANICS_TOTAL: &str = "signet_handler_panics_total";

static DESCRIBED: Lazy<()> = Lazy::new(|| {
    describe_counter!(
        SIGNET_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of API calls answered, by endpoint, status and error code."
    );
    describe_histogram!(
        SIGNET_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of API calls from dispatch to envelope."
    );
    describe_counter!(
        SIGNET_AUTH_FAILURES_TOTAL,
        Unit::Count,
        "Calls rejected by service signature authentication."
    );
    describe_counter!(
        SIGNET_HANDLER_PANICS_TOTAL,
        Unit::Count,
        "Handler faults recovered by the dispatcher."
    );
});

/// Count one answered call. `code` is empty for successes.
pub fn increment_request_total(endpoint: &str, status: u16, code: &str) {
    counter!(
        SIGNET_REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}

pub fn record_request_duration(endpoint: &str, duration: Duration) {
    histogram!(SIGNET_REQUEST_DURATION_SECONDS, "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

pub fn increment_auth_failures() {
    counter!(SIGNET_AUTH_FAILURES_TOTAL).increment(1);
}

pub fn increment_handler_panics() {
    counter!(SIGNET_HANDLER_PANICS_TOTAL).increment(1);
}

/// RAII helper measuring call duration.
pub struct RequestTimer {
    start: Instant,
    endpoint: String,
}

impl RequestTimer {
    pub fn new(endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        record_request_duration(&self.endpoint, self.start.elapsed());
    }
}

/// Register metric descriptions (idempotent).
pub fn init_metrics() -> eyre::Result<()> {
    tracing::info!("Initializing signet metrics");
    Lazy::force(&DESCRIBED);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timer() {
        let timer = RequestTimer::new("/api/v1/users");
        assert!(timer.elapsed() < Duration::from_secs(60));
        // Timer records on drop
        drop(timer);
    }

    #[test]
    fn test_init_metrics() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_counters_without_recorder_are_noops() {
        increment_request_total("/api/v1/users", 200, "");
        increment_auth_failures();
        increment_handler_panics();
    }
}
