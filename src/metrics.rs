//! Prometheus metrics for the bridge warden.
//!
//! Exposed on the /metrics endpoint for scraping.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec,
};

lazy_static! {
    // Scan metrics
    pub static ref EVENTS_SCANNED: CounterVec = register_counter_vec!(
        "warden_events_scanned_total",
        "Total number of relayable events decoded from scanned windows",
        &["chain"]
    ).unwrap();

    pub static ref LATEST_SCANNED_BLOCK: GaugeVec = register_gauge_vec!(
        "warden_latest_scanned_block",
        "Upper bound of the most recent scan window",
        &["chain"]
    ).unwrap();

    // Relay metrics
    pub static ref EVENTS_SKIPPED: CounterVec = register_counter_vec!(
        "warden_events_skipped_total",
        "Total number of events skipped as already relayed",
        &["chain"]
    ).unwrap();

    pub static ref CALLS_SUBMITTED: CounterVec = register_counter_vec!(
        "warden_calls_submitted_total",
        "Total number of relay calls submitted",
        &["chain", "status"]
    ).unwrap();

    pub static ref SUBMISSION_RETRIES: CounterVec = register_counter_vec!(
        "warden_submission_retries_total",
        "Total number of nonce-conflict retries",
        &["chain"]
    ).unwrap();

    // Error metrics
    pub static ref ERRORS: CounterVec = register_counter_vec!(
        "warden_errors_total",
        "Total number of errors",
        &["chain", "stage"]
    ).unwrap();

    // Health metrics
    pub static ref UP: Gauge = register_gauge!(
        "warden_up",
        "Whether the warden is up and running"
    ).unwrap();

    pub static ref LAST_PASS_TIMESTAMP: GaugeVec = register_gauge_vec!(
        "warden_last_pass_timestamp",
        "Unix timestamp of the last completed pass",
        &["chain"]
    ).unwrap();
}

/// Record a completed scan window
pub fn record_scan(chain: &str, to_block: u64, events: usize) {
    EVENTS_SCANNED
        .with_label_values(&[chain])
        .inc_by(events as f64);
    LATEST_SCANNED_BLOCK
        .with_label_values(&[chain])
        .set(to_block as f64);
}

/// Record an event skipped by the relay cache
pub fn record_skip(chain: &str) {
    EVENTS_SKIPPED.with_label_values(&[chain]).inc();
}

/// Record a submitted relay call and how far it got
pub fn record_call_submitted(chain: &str, status: &str) {
    CALLS_SUBMITTED.with_label_values(&[chain, status]).inc();
}

/// Record nonce-conflict retries consumed by one submission
pub fn record_retries(chain: &str, retries: u32) {
    SUBMISSION_RETRIES
        .with_label_values(&[chain])
        .inc_by(retries as f64);
}

/// Record an error
pub fn record_error(chain: &str, stage: &str) {
    ERRORS.with_label_values(&[chain, stage]).inc();
}

/// Record a completed pass
pub fn record_pass(chain: &str) {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs_f64();
    LAST_PASS_TIMESTAMP
        .with_label_values(&[chain])
        .set(timestamp);
}

/// Flag the process as up or shutting down
pub fn set_up(up: bool) {
    UP.set(if up { 1.0 } else { 0.0 });
}
