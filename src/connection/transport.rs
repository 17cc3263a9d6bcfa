//! Transport strategies
//!
//! `ConnectionTransport` is the only place raw frames are written. Each
//! transport adapter supplies its own implementation; the connection never
//! touches a socket directly.

use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::protocol::{CloseFrame, Message as WsMessage};

use crate::message::Frame;
use crate::utils::error::TransportError;

pub trait ConnectionTransport: Send {
    fn transmit(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Protocol-level ping. Transports without control frames ignore it.
    fn ping(&mut self, _payload: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    /// Protocol-level pong. Transports without control frames ignore it.
    fn pong(&mut self, _payload: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError>;
}

/// Pushes websocket frames into the per-connection writer channel. The
/// writer task on the other end is the single owner of the socket sink.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: UnboundedSender<WsMessage>,
}

impl ChannelTransport {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self { sender }
    }

    fn push(&self, msg: WsMessage) -> Result<(), TransportError> {
        self.sender
            .send(msg)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

impl ConnectionTransport for ChannelTransport {
    fn transmit(&mut self, frame: Frame) -> Result<(), TransportError> {
        let msg = match frame {
            Frame::Text(text) => WsMessage::text(text),
            Frame::Binary(data) => WsMessage::binary(data),
            Frame::Ping(data) => WsMessage::Ping(data.into()),
            Frame::Pong(data) => WsMessage::Pong(data.into()),
        };
        self.push(msg)
    }

    fn ping(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.push(WsMessage::Ping(payload.to_vec().into()))
    }

    fn pong(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.push(WsMessage::Pong(payload.to_vec().into()))
    }

    fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        self.push(WsMessage::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        })))
    }
}
