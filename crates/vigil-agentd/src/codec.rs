//! Payload codecs for the negotiated content type.
//!
//! The handshake negotiates one of two content types per agent; the session
//! then encodes every outbound payload and decodes every inbound payload
//! with the matching codec. JSON is the debugging-friendly default, the
//! binary encoding is the compact production choice.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content-Type header value negotiating JSON payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content-Type header value negotiating binary payloads.
pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";

/// Encode/decode failures for frame payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json codec: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary codec: {0}")]
    Binary(#[from] postcard::Error),
}

/// The paired encoder/decoder for one content type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    #[default]
    Json,
    Binary,
}

impl Codec {
    /// The codec negotiated by a Content-Type header, if recognized.
    pub fn from_content_type(header: &str) -> Option<Self> {
        match header {
            CONTENT_TYPE_JSON => Some(Self::Json),
            CONTENT_TYPE_BINARY => Some(Self::Binary),
            _ => None,
        }
    }

    /// The Content-Type header value for this codec.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => CONTENT_TYPE_JSON,
            Self::Binary => CONTENT_TYPE_BINARY,
        }
    }

    /// Encode a payload.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Json => Ok(serde_json::to_vec(value)?),
            Self::Binary => Ok(postcard::to_allocvec(value)?),
        }
    }

    /// Decode a payload.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match self {
            Self::Json => Ok(serde_json::from_slice(bytes)?),
            Self::Binary => Ok(postcard::from_bytes(bytes)?),
        }
    }
}
