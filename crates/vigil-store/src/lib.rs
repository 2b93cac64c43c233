//! # vigil-store
//!
//! The entity-configuration store interface consumed by the backend daemons,
//! plus the watch events its implementations emit on change. Persistence
//! lives behind [`EntityConfigStore`]; this crate only defines the contract.

#![deny(unsafe_code)]

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vigil_core::EntityConfig;

/// Store failures, classified for caller policy: `NotFound` is an expected
/// outcome of lookups, `Internal` is fatal for the operation that hit it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No resource under the given key.
    #[error("resource not found: {key}")]
    NotFound { key: String },
    /// The backing store failed.
    #[error("internal store error: {0}")]
    Internal(String),
    /// A stored resource could not be decoded.
    #[error("store serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether this error indicates a failing store backend rather than a
    /// normal lookup outcome.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// The change kind of a watch notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchAction {
    Create,
    Update,
    Delete,
    /// The watcher lost track of the change kind, typically across a watch
    /// stream restart.
    Unknown,
}

impl fmt::Display for WatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A change notification for a stored entity configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEvent {
    pub action: WatchAction,
    /// The configuration after the change. Absent for some delete and
    /// unknown notifications.
    pub entity: Option<EntityConfig>,
}

impl WatchEvent {
    pub fn new(action: WatchAction, entity: EntityConfig) -> Self {
        Self {
            action,
            entity: Some(entity),
        }
    }
}

/// Entity configuration storage.
#[async_trait]
pub trait EntityConfigStore: Send + Sync {
    /// Fetch the configuration for the named entity.
    async fn get(&self, namespace: &str, name: &str) -> Result<EntityConfig, StoreError>;

    /// Create or replace a configuration. Watchers of the entity observe the
    /// change as a watch event.
    async fn create_or_update(&self, entity: &EntityConfig) -> Result<(), StoreError>;
}
