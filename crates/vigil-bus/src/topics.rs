//! Topic naming.
//!
//! Topic names are flat strings with a `vigil:` prefix. Per-resource topics
//! embed the namespace and resource name as additional segments.

/// Validated keepalives, consumed by the keepalive watchdog.
pub const TOPIC_KEEPALIVE: &str = "vigil:keepalive";

/// Raw keepalive events, prior to keepalive processing.
pub const TOPIC_KEEPALIVE_RAW: &str = "vigil:keepalive:raw";

/// Raw telemetry events, prior to event processing.
pub const TOPIC_EVENT_RAW: &str = "vigil:event:raw";

/// The per-entity configuration watch topic.
pub fn entity_config_topic(namespace: &str, name: &str) -> String {
    format!("vigil:entity_config:{namespace}:{name}")
}

/// The per-subscription check request topic.
pub fn subscription_topic(namespace: &str, subscription: &str) -> String {
    format!("vigil:check_request:{namespace}:{subscription}")
}
