//! Message envelope
//!
//! `Message` is the canonical internal and broker representation. Fields:
//! - `id`: unique per send; the only key used for duplicate suppression
//! - `from`: instance id of the publisher, `"Unknown"` until stamped; used
//!   only to filter self-echo, never for ordering
//! - `headers`: routing metadata, e.g. the destination connection id of a relay
//! - `body`: one of the closed set of message kinds

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::server::UNKNOWN;

/// Header carrying the destination connection id of a relayed message.
pub const TARGET_HEADER: &str = "connlb.target";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MessageBody {
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Text(String),
    Binary(Vec<u8>),
}

/// Discriminator of a `MessageBody`, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Ping,
    Pong,
    Text,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub from: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    pub body: MessageBody,
}

impl Message {
    /// Creates a message with a fresh id and an unset origin.
    pub fn new(body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from: UNKNOWN.to_string(),
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(MessageBody::Text(text.into()))
    }

    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageBody::Binary(data.into()))
    }

    pub fn ping(data: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageBody::Ping(data.into()))
    }

    pub fn pong(data: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageBody::Pong(data.into()))
    }

    pub fn message_type(&self) -> MessageType {
        match self.body {
            MessageBody::Ping(_) => MessageType::Ping,
            MessageBody::Pong(_) => MessageType::Pong,
            MessageBody::Text(_) => MessageType::Text,
            MessageBody::Binary(_) => MessageType::Binary,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Destination connection id of a relayed message, if any.
    pub fn target(&self) -> Option<&str> {
        self.header(TARGET_HEADER)
    }
}
