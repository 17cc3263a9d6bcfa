//! Test doubles shared by the unit test modules.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::connection::{Connection, ConnectionTransport, ConnectionType};
use crate::message::{Frame, RawCodec};
use crate::utils::error::TransportError;

/// Everything a `RecordingTransport` was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Frame(Frame),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close(u16, String),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    pub log: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                Recorded::Frame(Frame::Text(text)) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ConnectionTransport for RecordingTransport {
    fn transmit(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.log.lock().push(Recorded::Frame(frame));
        Ok(())
    }

    fn ping(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.log.lock().push(Recorded::Ping(payload.to_vec()));
        Ok(())
    }

    fn pong(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.log.lock().push(Recorded::Pong(payload.to_vec()));
        Ok(())
    }

    fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        self.log.lock().push(Recorded::Close(code, reason.to_string()));
        Ok(())
    }
}

/// A transport whose socket is already gone.
#[derive(Debug, Clone, Default)]
pub struct BrokenTransport;

impl ConnectionTransport for BrokenTransport {
    fn transmit(&mut self, _frame: Frame) -> Result<(), TransportError> {
        Err(TransportError::Io("connection reset by peer".to_string()))
    }

    fn close(&mut self, _code: u16, _reason: &str) -> Result<(), TransportError> {
        Err(TransportError::ChannelClosed)
    }
}

pub fn recording_connection(id: &str) -> (Arc<Connection>, RecordingTransport) {
    let transport = RecordingTransport::new();
    let connection = Connection::new(
        id,
        ConnectionType::Client,
        IndexMap::new(),
        Arc::new(RawCodec),
        Box::new(transport.clone()),
    );
    (Arc::new(connection), transport)
}
