//! The `transport` module is responsible for handling network communication
//! with clients via WebSockets.
//!
//! It accepts sockets, adapts each one into a `Connection` owned by the
//! load-balance concept, and defines the small JSON routing protocol the
//! bundled server speaks with its clients.

pub mod message;
pub mod router;
pub mod websocket;

pub use message::{ClientMessage, ServerMessage};
pub use router::RoutingListener;
pub use websocket::{serve, start_websocket_server};
