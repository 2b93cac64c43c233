//! # vigil-agentd
//!
//! The server-side agent session broker. Each connected agent is represented
//! by exactly one [`Session`], which:
//!
//! - relays inbound telemetry (keepalives, check results, metrics) onto the
//!   message bus
//! - relays outbound check requests and entity-configuration updates from
//!   the bus to the agent
//! - reconciles the agent's declared subscription set against the stored
//!   entity configuration
//! - tears down deterministically on transport failure, cancellation, or
//!   entity deletion, without leaking bus subscriptions or ring memberships
//!
//! Authentication and content-type negotiation happen before a session is
//! constructed; a broken transport is not re-established here (the agent
//! re-dials and a new session is built).

#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod subscriptions;

pub use codec::{Codec, CodecError, CONTENT_TYPE_BINARY, CONTENT_TYPE_JSON};
pub use config::{SendPolicy, SessionConfig, DEFAULT_WRITE_TIMEOUT_SECS};
pub use error::SessionError;
pub use session::Session;
