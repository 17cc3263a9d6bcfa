//! The `subscribe` module binds this process to the fanout topic shared by
//! every instance of the same service and protocol, and implements the relay
//! protocol on top of it.

pub mod subscriber;
pub mod topic;

pub use subscriber::{ConnectionSubscriber, InboundSink};
pub use topic::{DELIMITER, PREFIX, Protocol, topic_name};
