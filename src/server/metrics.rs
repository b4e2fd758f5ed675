use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all service metrics
const PREFIX: &str = "music_map";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // External collaborators (speech, model, voice, store)
    pub static ref EXTERNAL_CALL_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_external_call_duration_seconds"),
            "Duration of calls to external services in seconds"
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0]),
        &["service", "outcome"]
    ).expect("Failed to create external_call_duration_seconds metric");

    pub static ref DEGRADED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_degraded_total"),
            "Requests served through a degraded path, by component"
        ),
        &["component"]
    ).expect("Failed to create degraded_total metric");

    pub static ref MODEL_TOKENS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_model_tokens_total"),
            "Tokens reported by the language model, by kind"
        ),
        &["kind"]
    ).expect("Failed to create model_tokens_total metric");

    pub static ref DROPS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_drops_total"),
        "Number of drops in the store"
    ).expect("Failed to create drops_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type and endpoint"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(EXTERNAL_CALL_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(DEGRADED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(MODEL_TOKENS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DROPS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record one call to an external service. `outcome` is `ok`, `error` or `timeout`.
pub fn record_external_call(service: &str, outcome: &str, duration: Duration) {
    EXTERNAL_CALL_DURATION_SECONDS
        .with_label_values(&[service, outcome])
        .observe(duration.as_secs_f64());
}

pub fn record_degraded(component: &str) {
    DEGRADED_TOTAL.with_label_values(&[component]).inc();
}

/// Record the token counts of one completion.
pub fn record_model_tokens(prompt_tokens: u32, completion_tokens: u32) {
    MODEL_TOKENS_TOTAL
        .with_label_values(&["prompt"])
        .inc_by(prompt_tokens as f64);
    MODEL_TOKENS_TOTAL
        .with_label_values(&["completion"])
        .inc_by(completion_tokens as f64);
}

pub fn set_drops_total(count: usize) {
    DROPS_TOTAL.set(count as f64);
}

pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // RSS is reported in kB
                    if let Some(kb) = line
                        .split_whitespace()
                        .nth(1)
                        .and_then(|s| s.parse::<f64>().ok())
                    {
                        PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                        return;
                    }
                }
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
