//! # vigil-ring
//!
//! Round-robin rings distribute check executions across the agents sharing a
//! subscription. Each subscription maps to one ring; agents join on connect
//! and are removed when their entity deregisters. The consistency mechanism
//! behind the ring lives with the backend binary; this crate defines the
//! membership interface consumed by the daemons.

#![deny(unsafe_code)]

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// The ring key for a subscription.
pub fn ring_key(namespace: &str, subscription: &str) -> String {
    format!("/vigil/rings/{namespace}/{subscription}")
}

/// Ring membership failures.
#[derive(Debug, Error)]
pub enum RingError {
    /// The coordination backend could not be reached or rejected the
    /// operation.
    #[error("ring backend error: {0}")]
    Backend(String),
}

/// Membership operations on a single ring.
#[async_trait]
pub trait Ring: Send + Sync {
    /// Remove a member. Removing an absent member is not an error.
    async fn remove(&self, member: &str) -> Result<(), RingError>;
}

/// A directory of rings, one per ring key.
pub trait RingPool: Send + Sync {
    /// The ring stored under `key`, created on first use.
    fn get(&self, key: &str) -> Arc<dyn Ring>;
}
