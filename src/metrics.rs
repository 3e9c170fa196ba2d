//! Metric names and descriptions.
//!
//! alertbox records through the `metrics` facade only. Without an installed
//! recorder every call is a no-op; embedders install the exporter they use.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register all metric descriptions.
///
/// Call once after the host application installed its recorder.
pub fn register_metric_descriptions() {
    // Counters
    describe_counter!(
        "alertbox_alerts_created_total",
        "Total number of alerts inserted into a container, by severity"
    );
    describe_counter!(
        "alertbox_alerts_reinforced_total",
        "Total number of duplicate requests that reinforced a live alert"
    );
    describe_counter!(
        "alertbox_alerts_removed_total",
        "Total number of alerts removed, by reason (timer, navigation, cleared, stamp, dismissed)"
    );
    describe_counter!(
        "alertbox_requests_rejected_total",
        "Total number of alert requests rejected at intake, by reason"
    );
    describe_counter!(
        "alertbox_anomalies_total",
        "Total number of recovered irregularities, by kind"
    );

    // Gauges
    describe_gauge!(
        "alertbox_visible_alerts",
        "Current number of live alerts across all holders"
    );
    describe_gauge!(
        "alertbox_build_info",
        "Build information with version label (always 1)"
    );
}

/// Initialize all known metrics so they are exported before the first event.
///
/// `severities` lists the severity names to pre-create creation counters for.
pub fn initialize_metrics<'a>(severities: impl IntoIterator<Item = &'a str>) {
    gauge!("alertbox_build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    gauge!("alertbox_visible_alerts").set(0.0);

    counter!("alertbox_alerts_reinforced_total").absolute(0);

    let mut severity_count = 0;
    for severity in severities {
        counter!("alertbox_alerts_created_total", "severity" => severity.to_string()).absolute(0);
        severity_count += 1;
    }

    for reason in ["timer", "navigation", "cleared", "stamp", "dismissed"] {
        counter!("alertbox_alerts_removed_total", "reason" => reason).absolute(0);
    }

    tracing::debug!(severity_count, "Metrics initialized to zero");
}
