//! Session error taxonomy.
//!
//! Errors are classified by what they mean for the session: transport
//! failures terminate the affected loop, internal store failures terminate
//! the whole session, everything else is logged and survived.

use thiserror::Error;

use crate::codec::CodecError;
use vigil_bus::BusError;
use vigil_core::ValidationError;
use vigil_store::StoreError;
use vigil_transport::TransportError;

/// Failures surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Keepalives must carry a real observation time (or the burial
    /// sentinel); zero means the agent clock never populated it.
    #[error("keepalive contains invalid timestamp")]
    InvalidKeepaliveTimestamp,
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
}

impl SessionError {
    /// Whether this error must terminate the session rather than be logged
    /// and survived. Only a failing store backend qualifies.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Store(err) => err.is_internal(),
            Self::Bus(err) => err.is_internal_store(),
            _ => false,
        }
    }
}
