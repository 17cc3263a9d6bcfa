use serde::{Deserialize, Serialize};

/// Frames a client sends to the routing server.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Deliver `payload` to connection `to`, on whichever instance owns it.
    #[serde(rename = "send")]
    Send { to: String, payload: String },
}

/// Frames the routing server sends to a client.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "welcome")]
    Welcome {
        connection_id: String,
        instance_id: String,
    },
    #[serde(rename = "message")]
    Message { from: String, payload: String },
    #[serde(rename = "error")]
    Error { message: String },
}
