//! Prometheus metrics recorder and metric names.
//!
//! Metric names and label sets are contractual: operator dashboards and
//! alerts select on them.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Active agent sessions (gauge, labels: namespace).
pub const AGENT_SESSIONS: &str = "agent_sessions";
/// Session errors total (counter, labels: error).
pub const SESSION_ERRORS: &str = "session_errors";
/// Websocket errors total (counter, labels: op, error).
pub const WEBSOCKET_ERRORS: &str = "websocket_errors";
/// Distribution of inbound event payload sizes in bytes
/// (histogram, labels: event_type).
pub const EVENT_BYTES: &str = "agentd_event_bytes";

/// `error` label value for failed session starts.
pub const ERROR_LABEL_START: &str = "start";
/// `error` label value for internal store failures.
pub const ERROR_LABEL_STORE_INTERNAL: &str = "store_internal";
/// `error` label value for ring removal failures.
pub const ERROR_LABEL_RING_REMOVE: &str = "ring_remove";

/// `event_type` label value for check result events.
pub const EVENT_TYPE_CHECK: &str = "check";
/// `event_type` label value for metrics-only events.
pub const EVENT_TYPE_METRICS: &str = "metrics";
/// `event_type` label value for events carrying both.
pub const EVENT_TYPE_CHECK_AND_METRICS: &str = "check_and_metrics";

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render the `/metrics` endpoint. Must be called
/// once at startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}
