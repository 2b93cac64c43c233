//! # vigil-transport
//!
//! The framed duplex message channel between a connected agent and the
//! backend. Concrete implementations (WebSocket framing, handshake,
//! content-type negotiation) live with the server binary; consumers such as
//! the agent session only see the [`Transport`] trait and the frame model.

#![deny(unsafe_code)]

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Wire tag of keepalive frames sent by the agent.
pub const TYPE_KEEPALIVE: &str = "keepalive";
/// Wire tag of event frames sent by the agent.
pub const TYPE_EVENT: &str = "event";
/// Wire tag of entity-config frames sent to the agent.
pub const TYPE_ENTITY_CONFIG: &str = "entity_config";
/// Wire tag of check-request frames sent to the agent.
pub const TYPE_CHECK_REQUEST: &str = "check_request";

/// The type tag of a transport frame.
///
/// Tags outside the recognized set are preserved in [`MessageType::Other`]
/// so the session can report them instead of dropping the frame silently.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    Keepalive,
    Event,
    EntityConfig,
    CheckRequest,
    Other(String),
}

impl MessageType {
    /// Parse a wire tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            TYPE_KEEPALIVE => Self::Keepalive,
            TYPE_EVENT => Self::Event,
            TYPE_ENTITY_CONFIG => Self::EntityConfig,
            TYPE_CHECK_REQUEST => Self::CheckRequest,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire tag for this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Keepalive => TYPE_KEEPALIVE,
            Self::Event => TYPE_EVENT,
            Self::EntityConfig => TYPE_ENTITY_CONFIG,
            Self::CheckRequest => TYPE_CHECK_REQUEST,
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A framed transport message. The payload encoding follows the content
/// type negotiated during the handshake; the frame itself is opaque bytes
/// plus a type tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub message_type: MessageType,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(message_type: MessageType, payload: Vec<u8>) -> Self {
        Self {
            message_type,
            payload,
        }
    }
}

/// Transport failures, classified for session termination policy.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying connection failed mid-operation.
    #[error("connection error: {0}")]
    Connection(String),
    /// The connection is closed; no further frames will flow.
    #[error("connection closed: {0}")]
    Closed(String),
    /// Anything else: protocol violations, oversized frames, codec faults
    /// below the framing layer.
    #[error("transport error: {0}")]
    Other(String),
}

/// A connected, framed, duplex agent channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Receive the next frame. Blocks until a frame arrives, the connection
    /// fails, or the connection is closed.
    async fn receive(&self) -> Result<Message, TransportError>;

    /// Send a frame. Blocks until the frame is written out.
    async fn send(&self, message: Message) -> Result<(), TransportError>;

    /// Send a protocol-level close notification without closing the local
    /// side, asking the peer to shut down cleanly.
    async fn send_close_message(&self) -> Result<(), TransportError>;

    /// Close the connection. Further operations fail with
    /// [`TransportError::Closed`].
    async fn close(&self) -> Result<(), TransportError>;

    /// Whether the connection is already closed.
    fn closed(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_tags_roundtrip() {
        for tag in [
            TYPE_KEEPALIVE,
            TYPE_EVENT,
            TYPE_ENTITY_CONFIG,
            TYPE_CHECK_REQUEST,
        ] {
            let message_type = MessageType::from_tag(tag);
            assert!(!matches!(message_type, MessageType::Other(_)));
            assert_eq!(message_type.as_str(), tag);
        }
    }

    #[test]
    fn unknown_tag_is_preserved() {
        let message_type = MessageType::from_tag("paging");
        assert_eq!(message_type, MessageType::Other("paging".into()));
        assert_eq!(message_type.as_str(), "paging");
        assert_eq!(message_type.to_string(), "paging");
    }

    #[test]
    fn message_construction() {
        let message = Message::new(MessageType::Event, b"{}".to_vec());
        assert_eq!(message.message_type, MessageType::Event);
        assert_eq!(message.payload, b"{}");
    }

    #[test]
    fn error_display() {
        let err = TransportError::Closed("going away".into());
        assert_eq!(err.to_string(), "connection closed: going away");
    }
}
