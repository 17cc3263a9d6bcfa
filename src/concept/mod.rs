//! The `concept` module is the top-level facade of the load balancer.
//!
//! `LoadBalanceConcept` receives transport callbacks, keeps the registry of
//! local connections, routes outbound messages either to a local connection
//! or through the broker to the sibling that owns the destination, and
//! hands accepted relays back into local delivery.

pub mod concept;
pub mod event;

pub use concept::{ConceptContext, Delivery, LoadBalanceConcept};
pub use event::{ConnectionEvent, ConnectionEventListener};
