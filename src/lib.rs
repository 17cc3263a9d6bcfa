//! # connlb
//!
//! `connlb` lets several server instances behind one load balancer each hold
//! a share of long-lived client connections while any instance can still
//! deliver a message to any client. Sibling instances exchange messages for
//! connections they do not own over a shared broker topic; at-least-once
//! redelivery and self-echo are filtered by message id and origin.
//!
//! ## Core Modules
//!
//! - `message`: the envelope exchanged locally and over the broker, plus codecs.
//! - `connection`: a live client session, its transport strategy and the registry.
//! - `server`: service and instance identity of the running process.
//! - `verifier`: bounded duplicate suppression keyed by message id.
//! - `broker`: the publish/subscribe contract and an in-process broker.
//! - `subscribe`: topic naming and the fanout subscriber/relay protocol.
//! - `concept`: the orchestrator routing between local delivery and relay.
//! - `monitor`: heartbeat sweeps reclaiming dead connections.
//! - `config`: loading and validating settings.
//! - `transport`: the WebSocket server and its client routing protocol.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod concept;
pub mod config;
pub mod connection;
pub mod message;
pub mod monitor;
pub mod server;
pub mod subscribe;
pub mod transport;
pub mod utils;
pub mod verifier;

#[cfg(test)]
mod testing;
