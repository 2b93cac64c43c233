//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::codec::Codec;

/// Default bound, in seconds, on inbound message handling and outbound
/// writes.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 15;

/// How the sender multiplexes its outbound sources when both have messages
/// ready.
///
/// Check requests can arrive in sustained bursts; entity-config updates are
/// rare but operator-visible. Neither mode starves a source: the biased mode
/// only prefers the config channel at the moment both are ready.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendPolicy {
    /// Pick randomly among ready sources.
    #[default]
    Unbiased,
    /// Drain entity-config updates before check requests.
    EntityConfigFirst,
}

/// Everything needed to build an agent session, gathered during the
/// transport handshake.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Namespace the agent authenticated into.
    pub namespace: String,
    /// The agent's entity name.
    pub agent_name: String,
    /// Remote address, for logging.
    pub agent_addr: String,
    /// Backend user the agent authenticated as.
    pub user: String,
    /// Subscriptions the agent declared at handshake. Superseded by the
    /// stored entity configuration when one exists.
    pub subscriptions: Vec<String>,
    /// Bound, in seconds, on inbound message handling and outbound writes.
    pub write_timeout_secs: u64,
    /// Codec for the negotiated content type.
    pub codec: Codec,
    /// Outbound multiplexing policy.
    pub send_policy: SendPolicy,
}

impl SessionConfig {
    /// A configuration with default tuning for the given identity.
    pub fn new(namespace: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            agent_name: agent_name.into(),
            agent_addr: String::new(),
            user: String::new(),
            subscriptions: Vec::new(),
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
            codec: Codec::default(),
            send_policy: SendPolicy::default(),
        }
    }
}
