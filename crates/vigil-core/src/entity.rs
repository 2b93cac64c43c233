//! Entities and entity configuration.
//!
//! An [`Entity`] is the identity an agent attaches to the telemetry it emits.
//! An [`EntityConfig`] is the authoritative backend-side description of that
//! entity; the agent session reconciles against it and echoes it back to the
//! agent when the backend owns it.

use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

/// Entity class of agent-backed entities.
pub const ENTITY_AGENT_CLASS: &str = "agent";

/// Entity class of proxy entities, which have no agent of their own.
pub const ENTITY_PROXY_CLASS: &str = "proxy";

/// Sentinel entity name published to an agent when no configuration is
/// stored for it. The agent reacts by registering its local configuration.
pub const ENTITY_NOT_FOUND_NAME: &str = "not-found";

/// Label key recording which component owns an entity's configuration.
pub const MANAGED_BY_LABEL: &str = "managed_by";

/// `managed_by` value marking the agent as authoritative for its own
/// configuration. The backend then reconciles subscriptions server-side but
/// does not echo the configuration back.
pub const AGENT_MANAGED_BY_VALUE: &str = "vigil-agent";

/// Prefix of the per-entity subscription every entity implicitly holds.
pub const ENTITY_SUBSCRIPTION_PREFIX: &str = "entity:";

/// The entity subscription for the named entity.
pub fn entity_subscription(name: &str) -> String {
    format!("{ENTITY_SUBSCRIPTION_PREFIX}{name}")
}

/// Append the entity subscription for `name` to `subscriptions` unless it is
/// already present.
pub fn add_entity_subscription(name: &str, mut subscriptions: Vec<String>) -> Vec<String> {
    let entity_sub = entity_subscription(name);
    if !subscriptions.iter().any(|s| *s == entity_sub) {
        subscriptions.push(entity_sub);
    }
    subscriptions
}

/// Entity identity as carried inside telemetry events.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entity {
    pub metadata: ObjectMeta,
    /// One of the `ENTITY_*_CLASS` constants.
    pub entity_class: String,
    /// Backend user the agent authenticated as.
    pub user: String,
    /// Subscriptions the entity participates in.
    pub subscriptions: Vec<String>,
}

impl Entity {
    /// An agent-class entity with the given identity and subscriptions.
    pub fn agent(name: &str, namespace: &str, subscriptions: Vec<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(name, namespace),
            entity_class: ENTITY_AGENT_CLASS.into(),
            user: String::new(),
            subscriptions,
        }
    }
}

/// Stored entity configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityConfig {
    pub metadata: ObjectMeta,
    /// One of the `ENTITY_*_CLASS` constants. Agent sessions coerce this to
    /// `agent` when a different class reaches them.
    pub entity_class: String,
    /// Backend user the entity's agent authenticates as.
    pub user: String,
    /// Subscriptions the entity should participate in.
    pub subscriptions: Vec<String>,
    /// Whether the entity should be deregistered, and its ring memberships
    /// dropped, when its agent disconnects.
    pub deregister: bool,
    /// Keys whose values are redacted when the entity is displayed.
    pub redact: Vec<String>,
}

impl EntityConfig {
    /// The placeholder configuration published when no entity configuration
    /// exists for a connecting agent.
    pub fn not_found_placeholder(namespace: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(ENTITY_NOT_FOUND_NAME, namespace),
            entity_class: ENTITY_AGENT_CLASS.into(),
            ..Self::default()
        }
    }

    /// Whether the agent, not the backend, owns this configuration.
    pub fn is_agent_managed(&self) -> bool {
        self.metadata.label(MANAGED_BY_LABEL) == Some(AGENT_MANAGED_BY_VALUE)
    }

    /// Drop the agent-ownership label, returning whether it was present.
    pub fn clear_agent_managed(&mut self) -> bool {
        if self.is_agent_managed() {
            self.metadata.labels.remove(MANAGED_BY_LABEL);
            return true;
        }
        false
    }
}
