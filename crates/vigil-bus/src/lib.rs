//! # vigil-bus
//!
//! The topic pub/sub interface the backend daemons communicate over, and the
//! topic naming scheme. Deliveries on a single topic are ordered; consumers
//! receive messages through a bounded channel capability they hand to
//! [`MessageBus::subscribe`]. The bus implementation lives with the backend
//! binary; this crate only defines the contract.

#![deny(unsafe_code)]

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use vigil_core::{CheckRequest, Event};
use vigil_store::{StoreError, WatchEvent};

pub mod topics;

/// A message travelling over the bus.
///
/// The bus is typed: every topic carries one of these variants, and
/// consumers reject mismatches explicitly instead of failing downcasts.
#[derive(Clone, Debug)]
pub enum BusMessage {
    /// Telemetry on the keepalive and event topics.
    Event(Box<Event>),
    /// Check execution directives on subscription topics.
    CheckRequest(Box<CheckRequest>),
    /// Entity-configuration changes on per-entity config topics.
    EntityConfigWatch(Box<WatchEvent>),
}

impl BusMessage {
    /// Short variant name, for logging unexpected deliveries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::CheckRequest(_) => "check_request",
            Self::EntityConfigWatch(_) => "entity_config_watch",
        }
    }
}

/// The write-only capability a subscriber hands to the bus. The bus delivers
/// each topic message by sending on this channel; a full channel exerts
/// backpressure on the publisher.
pub type BusReceiver = mpsc::Sender<BusMessage>;

/// Bus failures.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },
    #[error("subscribe to {topic} failed: {reason}")]
    Subscribe { topic: String, reason: String },
    #[error("subscription cancel failed: {0}")]
    Cancel(String),
    /// Bus operations backed by the store surface its failures unchanged,
    /// so callers can apply store error policy.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BusError {
    /// Whether the failure originated in a failing store backend.
    pub fn is_internal_store(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_internal())
    }
}

/// An active subscription. Cancelling detaches the consumer's receiver
/// capability from the topic; the handle is single-use.
#[async_trait]
pub trait Subscription: Send + Sync {
    async fn cancel(&self) -> Result<(), BusError>;
}

/// Topic pub/sub.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a message on a topic. Blocks while subscriber channels are
    /// full, per the bus backpressure policy.
    async fn publish(&self, topic: &str, message: BusMessage) -> Result<(), BusError>;

    /// Attach `receiver` to a topic under the given consumer identifier.
    /// Consumer identifiers must be unique per subscriber lifetime so a
    /// reconnecting consumer cannot collide with its predecessor.
    async fn subscribe(
        &self,
        topic: &str,
        consumer: &str,
        receiver: BusReceiver,
    ) -> Result<Box<dyn Subscription>, BusError>;
}
