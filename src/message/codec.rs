//! Codecs
//!
//! A `MessageCodec` turns a `Message` into the `Frame` a transport writes
//! and back. Client connections use `RawCodec`: the payload travels as-is
//! and the envelope fields stay on the server. The broker uses `JsonCodec`,
//! which carries the whole envelope so siblings can dedup and filter echo.

use crate::message::envelope::{Message, MessageBody};
use crate::utils::error::CodecError;

/// A single transport-level frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
}

pub trait MessageCodec: Send + Sync {
    fn encode(&self, message: &Message) -> Result<Frame, CodecError>;

    fn decode(&self, frame: Frame) -> Result<Message, CodecError>;
}

/// Maps message bodies one-to-one onto frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawCodec;

impl MessageCodec for RawCodec {
    fn encode(&self, message: &Message) -> Result<Frame, CodecError> {
        Ok(match &message.body {
            MessageBody::Text(text) => Frame::Text(text.clone()),
            MessageBody::Binary(data) => Frame::Binary(data.clone()),
            MessageBody::Ping(data) => Frame::Ping(data.clone()),
            MessageBody::Pong(data) => Frame::Pong(data.clone()),
        })
    }

    fn decode(&self, frame: Frame) -> Result<Message, CodecError> {
        Ok(match frame {
            Frame::Text(text) => Message::text(text),
            Frame::Binary(data) => Message::binary(data),
            Frame::Ping(data) => Message::ping(data),
            Frame::Pong(data) => Message::pong(data),
        })
    }
}

/// Serializes the full envelope as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn to_bytes(&self, message: &Message) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(message)?)
    }

    pub fn from_bytes(&self, bytes: &[u8]) -> Result<Message, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl MessageCodec for JsonCodec {
    fn encode(&self, message: &Message) -> Result<Frame, CodecError> {
        Ok(Frame::Text(serde_json::to_string(message)?))
    }

    fn decode(&self, frame: Frame) -> Result<Message, CodecError> {
        match frame {
            Frame::Text(text) => self.from_bytes(text.as_bytes()),
            Frame::Binary(data) => self.from_bytes(&data),
            Frame::Ping(_) => Err(CodecError::Unsupported("ping")),
            Frame::Pong(_) => Err(CodecError::Unsupported("pong")),
        }
    }
}
