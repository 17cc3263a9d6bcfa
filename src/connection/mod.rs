//! The `connection` module models a live client session.
//!
//! A `Connection` owns the send/close contract and the heartbeat timestamp,
//! and delegates the actual socket work to a `ConnectionTransport` injected
//! at construction. The `ConnectionRegistry` holds the connections accepted
//! by this process.

pub mod connection;
pub mod registry;
pub mod transport;

pub use connection::{Connection, ConnectionType, GOING_AWAY, INTERNAL_ERROR, Metadata, NORMAL_CLOSURE};
pub use registry::ConnectionRegistry;
pub use transport::{ChannelTransport, ConnectionTransport};
