//! The `error` module defines the error types used within `connlb`.
//!
//! Errors are split along the failure taxonomy of the load balancer: a
//! transport failure force-closes the connection, a codec failure drops a
//! single message, a broker failure only affects relay to sibling instances.
//! Duplicate messages are never errors; they are filtered silently.

use thiserror::Error;

/// Failure of the underlying connection transport (socket write, closed
/// writer channel). Never retried by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection writer channel is closed")]
    ChannelClosed,

    #[error("websocket failure: {0}")]
    WebSocket(String),

    #[error("i/o failure: {0}")]
    Io(String),
}

impl From<tungstenite::Error> for TransportError {
    fn from(e: tungstenite::Error) -> Self {
        TransportError::WebSocket(e.to_string())
    }
}

/// A message could not be encoded to or decoded from its wire form.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed json envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} frames are not supported by this codec")]
    Unsupported(&'static str),
}

/// Failure reported by the external message broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("publish to topic {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("subscribe to topic {topic} failed: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("relay envelope could not be encoded: {0}")]
    Codec(#[from] CodecError),
}

/// Writing one message to one connection failed.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Outcome of `LoadBalanceConcept::send` when delivery could not be attempted.
#[derive(Debug, Error)]
pub enum ConceptError {
    #[error("local delivery to connection {id} failed: {source}")]
    Delivery {
        id: String,
        #[source]
        source: SendError,
    },

    #[error("relay to sibling instances failed: {0}")]
    Relay(#[source] BrokerError),
}
