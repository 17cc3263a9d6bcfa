//! The `message` module defines the envelope exchanged both with local
//! connections and with sibling instances over the broker, and the codecs
//! translating it to wire frames.

pub mod codec;
pub mod envelope;

pub use codec::{Frame, JsonCodec, MessageCodec, RawCodec};
pub use envelope::{Message, MessageBody, MessageType, TARGET_HEADER};

#[cfg(test)]
mod tests;
