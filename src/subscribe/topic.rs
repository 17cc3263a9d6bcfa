//! Topic naming
//!
//! `PREFIX @ extension @ serviceId`. Every instance of one service must
//! derive the same string bit for bit; a mismatch silently splits the
//! fanout group. An unset service id becomes `"Unknown"`.

use crate::server::ServerIdentity;

pub const PREFIX: &str = "ConceptConnectionLB";
pub const DELIMITER: &str = "@";

/// The connection protocol a topic carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    WebSocket,
    Sse,
    Custom(String),
}

impl Protocol {
    pub fn extension(&self) -> &str {
        match self {
            Protocol::WebSocket => "websocket",
            Protocol::Sse => "sse",
            Protocol::Custom(ext) => ext,
        }
    }
}

pub fn topic_name(protocol: &Protocol, identity: &ServerIdentity) -> String {
    format!(
        "{PREFIX}{DELIMITER}{}{DELIMITER}{}",
        protocol.extension(),
        identity.service_id()
    )
}
