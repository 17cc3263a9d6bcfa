//! The `monitor` module reclaims connections that went away without a clean
//! close: silent network loss, crashed clients, half-open sockets.

pub mod heartbeat;

pub use heartbeat::{HEARTBEAT_TIMEOUT_REASON, HeartbeatMonitor, SweepSummary};

#[cfg(test)]
mod tests;
