//! Telemetry events.
//!
//! Events are the envelope for everything an agent reports: keepalives,
//! check results, and metrics. An event must carry an entity and at least
//! one of a check or metrics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::check::Check;
use crate::entity::Entity;
use crate::meta::ObjectMeta;

/// Name of the built-in keepalive check.
pub const KEEPALIVE_CHECK_NAME: &str = "keepalive";

/// Keepalive timestamp directing the keepalive processor to bury any
/// existing watchdog switch for the entity, so the next real keepalive
/// re-arms it with current thresholds.
pub const SWITCH_BURIAL_SENTINEL: i64 = -1;

/// A telemetry event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub metadata: ObjectMeta,
    /// Unix timestamp of the observation. Keepalives use
    /// [`SWITCH_BURIAL_SENTINEL`] as a control value.
    pub timestamp: i64,
    /// The entity the event concerns.
    pub entity: Option<Entity>,
    /// Check execution result, if any.
    pub check: Option<Check>,
    /// Metric points, if any.
    pub metrics: Option<EventMetrics>,
}

/// Metric points attached to an event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventMetrics {
    /// Handlers the points are routed to.
    pub handlers: Vec<String>,
    pub points: Vec<MetricPoint>,
}

/// A single measured value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    pub timestamp: i64,
    pub tags: Vec<MetricTag>,
}

/// A key/value tag on a metric point.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricTag {
    pub name: String,
    pub value: String,
}

/// Structural validation failures for inbound events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event must contain an entity")]
    MissingEntity,
    #[error("entity name must not be empty")]
    EmptyEntityName,
    #[error("check name must not be empty")]
    EmptyCheckName,
    #[error("event must contain a check or metrics")]
    MissingCheckAndMetrics,
}

impl Event {
    /// Whether the event carries a check result.
    pub fn has_check(&self) -> bool {
        self.check.is_some()
    }

    /// Whether the event carries metric points.
    pub fn has_metrics(&self) -> bool {
        self.metrics.is_some()
    }

    /// Whether the event's check is the built-in keepalive check.
    pub fn is_keepalive(&self) -> bool {
        self.check
            .as_ref()
            .is_some_and(|check| check.metadata.name == KEEPALIVE_CHECK_NAME)
    }

    /// Structural validation applied before an event is relayed to the bus.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let entity = self.entity.as_ref().ok_or(ValidationError::MissingEntity)?;
        if entity.metadata.name.is_empty() {
            return Err(ValidationError::EmptyEntityName);
        }
        if let Some(check) = &self.check {
            if check.metadata.name.is_empty() {
                return Err(ValidationError::EmptyCheckName);
            }
        }
        if self.check.is_none() && self.metrics.is_none() {
            return Err(ValidationError::MissingCheckAndMetrics);
        }
        Ok(())
    }
}
