//! Connection
//!
//! Concurrency notes:
//! - `send` may be called at the same time from the local delivery path and
//!   from the broker relay path. The transport sits behind a mutex so only
//!   one writer touches it at a time.
//! - `alive` only ever goes from `true` to `false`. Once it is `false`,
//!   `send` and `close` return immediately without touching the transport.
//! - `close` takes the transport out of the connection, so its resources are
//!   released even when the close frame cannot be written.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::connection::transport::ConnectionTransport;
use crate::message::{Message, MessageBody, MessageCodec};
use crate::utils::error::SendError;

/// Application-defined key/value pairs, iteration follows insertion order.
pub type Metadata = IndexMap<String, String>;

pub const NORMAL_CLOSURE: u16 = 1000;
pub const GOING_AWAY: u16 = 1001;
pub const INTERNAL_ERROR: u16 = 1011;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    /// An end user connected through the balancer.
    Client,
    /// Another server instance.
    Peer,
}

pub struct Connection {
    id: String,
    kind: ConnectionType,
    metadata: RwLock<Metadata>,
    codec: Arc<dyn MessageCodec>,
    transport: Mutex<Option<Box<dyn ConnectionTransport>>>,
    alive: AtomicBool,
    last_heartbeat: AtomicI64,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        kind: ConnectionType,
        metadata: Metadata,
        codec: Arc<dyn MessageCodec>,
        transport: Box<dyn ConnectionTransport>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            metadata: RwLock::new(metadata),
            codec,
            transport: Mutex::new(Some(transport)),
            alive: AtomicBool::new(true),
            last_heartbeat: AtomicI64::new(chrono::Utc::now().timestamp_millis()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ConnectionType {
        self.kind
    }

    pub fn metadata(&self) -> Metadata {
        self.metadata.read().clone()
    }

    pub fn metadata_value(&self, key: &str) -> Option<String> {
        self.metadata.read().get(key).cloned()
    }

    pub fn insert_metadata(&self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.write().insert(key.into(), value.into());
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Milliseconds since the Unix epoch of the last ping/pong exchange.
    pub fn last_heartbeat(&self) -> i64 {
        self.last_heartbeat.load(Ordering::SeqCst)
    }

    pub fn touch(&self) {
        self.touch_at(chrono::Utc::now().timestamp_millis());
    }

    pub fn touch_at(&self, millis: i64) {
        self.last_heartbeat.store(millis, Ordering::SeqCst);
    }

    /// Writes `message` to the transport. A no-op on a closed connection.
    ///
    /// Ping and pong go through the transport's control-frame operations,
    /// every other kind is encoded by the connection codec first.
    pub fn send(&self, message: &Message) -> Result<(), SendError> {
        if !self.is_alive() {
            return Ok(());
        }

        let mut guard = self.transport.lock();
        let Some(transport) = guard.as_mut() else {
            return Ok(());
        };

        match &message.body {
            MessageBody::Ping(data) => transport.ping(data)?,
            MessageBody::Pong(data) => transport.pong(data)?,
            MessageBody::Text(_) | MessageBody::Binary(_) => {
                let frame = self.codec.encode(message)?;
                transport.transmit(frame)?;
            }
        }
        Ok(())
    }

    pub fn close(&self) -> bool {
        self.close_with_reason("")
    }

    pub fn close_with_reason(&self, reason: &str) -> bool {
        self.close_with_code(NORMAL_CLOSURE, reason)
    }

    /// Marks the connection dead and releases its transport.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn close_with_code(&self, code: u16, reason: &str) -> bool {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return false;
        }

        let transport = self.transport.lock().take();
        if let Some(mut transport) = transport {
            if let Err(e) = transport.close(code, reason) {
                debug!("Close frame for {} not delivered: {}", self.id, e);
            }
        }
        true
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("alive", &self.is_alive())
            .field("last_heartbeat", &self.last_heartbeat())
            .finish()
    }
}
