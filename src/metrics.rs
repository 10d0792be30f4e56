use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec,
    register_gauge, register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of chat requests").unwrap();
    pub static ref DENIED_TOTAL: CounterVec = register_counter_vec!(
        "gateway_denied_total",
        "Requests rejected before reaching the model, by reason",
        &["reason"]
    )
    .unwrap();
    pub static ref UPSTREAM_FAILURES: Counter = register_counter!(
        "gateway_upstream_failures_total",
        "Failed calls to the AI service"
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "gateway_upstream_latency_seconds",
        "AI service round trip in seconds"
    )
    .unwrap();
    pub static ref TRACKED_USERS: Gauge =
        register_gauge!("gateway_tracked_users", "Users currently held in the usage ledger")
            .unwrap();
}
