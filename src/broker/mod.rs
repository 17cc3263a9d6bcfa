//! The `broker` module describes the external publish/subscribe system the
//! sibling instances share, and provides an in-process implementation.
//!
//! A real deployment plugs a networked broker in behind `MessageBroker`;
//! the contract assumed here is at-least-once delivery with no ordering
//! guarantee across publishers.

pub mod memory;
pub mod topic;

use std::sync::Arc;

use crate::utils::error::BrokerError;

pub use memory::MemoryBroker;

/// Callback invoked with the raw bytes of every message published on a
/// subscribed topic. May be called from any thread.
pub type BrokerHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

pub trait MessageBroker: Send + Sync {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Registers `handler` for `topic`, returning a subscription id.
    fn subscribe(&self, topic: &str, handler: BrokerHandler) -> Result<String, BrokerError>;
}
