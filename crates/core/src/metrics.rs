//! Metric name constants.
//!
//! All Prometheus metric names and label keys are defined centrally here.
//! Modules record through the `metrics` facade macros:
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(gitsentry_core::metrics::WEBHOOK_DELIVERIES_TOTAL).increment(1);
//! ```
//!
//! # Naming convention
//!
//! - prefix: `gitsentry_`
//! - suffix: `_total` (counter), `_seconds` (histogram), none (gauge)

// --- Label keys ---

/// Scanner label key (static-analysis, dependency-check, secret-scan, threat-model)
pub const LABEL_SCANNER: &str = "scanner";

/// Result label key (success, failure)
pub const LABEL_RESULT: &str = "result";

/// Delivery outcome label key (processed, ignored, rejected)
pub const LABEL_OUTCOME: &str = "outcome";

// --- Webhook metrics ---

/// Webhook deliveries received (counter, label: outcome)
pub const WEBHOOK_DELIVERIES_TOTAL: &str = "gitsentry_webhook_deliveries_total";

// --- Scan metrics ---

/// Scanner invocations settled (counter, labels: scanner, result)
pub const SCANS_TOTAL: &str = "gitsentry_scans_total";

/// Wall-clock duration of one scanner invocation (histogram, seconds)
pub const SCAN_DURATION_SECONDS: &str = "gitsentry_scan_duration_seconds";

/// Scanner invocations currently running (gauge)
pub const SCANS_IN_FLIGHT: &str = "gitsentry_scans_in_flight";

// --- Store metrics ---

/// Aggregate reports upserted (counter)
pub const REPORTS_STORED_TOTAL: &str = "gitsentry_reports_stored_total";

// --- Renderer metrics ---

/// PDF documents rendered (counter, label: result)
pub const DOCUMENTS_RENDERED_TOTAL: &str = "gitsentry_documents_rendered_total";

/// PDF render duration (histogram, seconds)
pub const RENDER_DURATION_SECONDS: &str = "gitsentry_render_duration_seconds";

// --- Server metrics ---

/// Server uptime (gauge, seconds)
pub const SERVER_UPTIME_SECONDS: &str = "gitsentry_server_uptime_seconds";

/// Register descriptions for every metric.
///
/// Called once by the server after the recorder is installed, so the
/// Prometheus endpoint carries HELP text.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        WEBHOOK_DELIVERIES_TOTAL,
        "Webhook deliveries received, by outcome"
    );
    describe_counter!(SCANS_TOTAL, "Scanner invocations settled, by scanner and result");
    describe_histogram!(
        SCAN_DURATION_SECONDS,
        "Wall-clock duration of one scanner invocation"
    );
    describe_gauge!(SCANS_IN_FLIGHT, "Scanner invocations currently running");
    describe_counter!(REPORTS_STORED_TOTAL, "Aggregate reports upserted");
    describe_counter!(
        DOCUMENTS_RENDERED_TOTAL,
        "PDF documents rendered, by result"
    );
    describe_histogram!(RENDER_DURATION_SECONDS, "PDF render duration");
    describe_gauge!(SERVER_UPTIME_SECONDS, "Server uptime in seconds");
}
