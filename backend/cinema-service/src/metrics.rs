/// Prometheus metrics for search and moderation
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

static SEARCH_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cinema_search_requests_total",
        "Total number of search requests by kind and outcome",
        &["kind", "outcome"]
    )
    .expect("Failed to register search requests metric")
});

static MODERATION_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cinema_moderation_actions_total",
        "Total number of moderation actions by action and outcome",
        &["action", "outcome"]
    )
    .expect("Failed to register moderation actions metric")
});

pub fn record_search(kind: &str, outcome: &str) {
    SEARCH_REQUESTS.with_label_values(&[kind, outcome]).inc();
}

pub fn record_moderation_action(action: &str, outcome: &str) {
    MODERATION_ACTIONS.with_label_values(&[action, outcome]).inc();
}

/// Render every registered metric in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
