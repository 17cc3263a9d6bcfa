//! The `server` module answers "who am I" for this process: the service
//! group shared by every instance behind one balancer, and the id of this
//! particular instance.

pub mod identity;

pub use identity::{ServerIdentity, UNKNOWN};
