//! # vigil-core
//!
//! Core resource model for the vigil monitoring backend.
//!
//! - [`ObjectMeta`]: common name/namespace/labels metadata carried by every resource
//! - [`Entity`] / [`EntityConfig`]: the monitored entity as reported by its agent
//!   and as stored on the backend
//! - [`Event`]: telemetry envelope (check result, metrics, keepalive)
//! - [`Check`] / [`CheckRequest`]: check definitions and execution directives
//! - Entity-subscription helpers and the well-known constants shared between
//!   the backend daemons and the agent

#![deny(unsafe_code)]

pub mod check;
pub mod entity;
pub mod event;
pub mod meta;

pub use check::{Check, CheckRequest};
pub use entity::{
    add_entity_subscription, entity_subscription, Entity, EntityConfig, AGENT_MANAGED_BY_VALUE,
    ENTITY_AGENT_CLASS, ENTITY_NOT_FOUND_NAME, ENTITY_PROXY_CLASS, ENTITY_SUBSCRIPTION_PREFIX,
    MANAGED_BY_LABEL,
};
pub use event::{
    Event, EventMetrics, MetricPoint, MetricTag, ValidationError, KEEPALIVE_CHECK_NAME,
    SWITCH_BURIAL_SENTINEL,
};
pub use meta::ObjectMeta;
