// Prometheus metrics for the directory service
//
// Exposed on the /metrics HTTP endpoint:
// - Requests by route and status (counter)
// - Contact records disclosed (counter)
// - Requests served while the daily quota was already spent (counter)
// - Quota tokens discarded as unreadable (counter)
// - Dataset load failures (counter)
// - Request latency (histogram)

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests handled"),
        &["route", "status"]
    ).expect("Failed to create HTTP requests metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request latency in seconds"),
        &["route"]
    ).expect("Failed to create HTTP request duration metric");

    // Quota metrics
    pub static ref CONTACTS_DISCLOSED_TOTAL: IntCounter = IntCounter::new(
        "contacts_disclosed_total",
        "Total number of contact records disclosed to callers"
    ).expect("Failed to create contacts disclosed metric");

    pub static ref QUOTA_LOCKOUTS_TOTAL: IntCounter = IntCounter::new(
        "quota_lockouts_total",
        "Contact requests received after the daily quota was spent"
    ).expect("Failed to create quota lockouts metric");

    pub static ref QUOTA_TOKENS_REJECTED_TOTAL: IntCounter = IntCounter::new(
        "quota_tokens_rejected_total",
        "Quota tokens discarded as unreadable"
    ).expect("Failed to create quota tokens rejected metric");

    // Dataset metrics
    pub static ref DATASET_LOAD_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("dataset_load_errors_total", "Total number of dataset load failures"),
        &["dataset"]
    ).expect("Failed to create dataset load errors metric");
}

/// Register all metrics with [`REGISTRY`]
///
/// Safe to call more than once; metrics that are already registered are
/// left in place.
pub fn init() -> prometheus::Result<()> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(CONTACTS_DISCLOSED_TOTAL.clone()),
        Box::new(QUOTA_LOCKOUTS_TOTAL.clone()),
        Box::new(QUOTA_TOKENS_REJECTED_TOTAL.clone()),
        Box::new(DATASET_LOAD_ERRORS_TOTAL.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Record the outcome of one HTTP request
pub fn observe_request(route: &str, status: u16, elapsed_secs: f64) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[route, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[route])
        .observe(elapsed_secs);
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}
