//! Load-balance orchestrator
//!
//! Per connection: established, then any interleaving of messages, then
//! exactly one of closed or errored. Entry points may be called
//! concurrently from transport and broker threads.
//!
//! Routing:
//! - `send` delivers synchronously when the destination is registered here,
//!   otherwise publishes one relay on the service topic and returns. Whether
//!   the destination exists anywhere in the cluster is never reported.
//! - a relay accepted from the topic is delivered if its destination is
//!   registered here and dropped otherwise; it is never relayed again.
//!
//! Transport failures force-close the connection and emit `Errored`. They
//! are not retried; reconnecting is the client's job.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broker::MessageBroker;
use crate::concept::event::{ConnectionEvent, ConnectionEventListener};
use crate::connection::{
    Connection, ConnectionRegistry, ConnectionTransport, ConnectionType, INTERNAL_ERROR, Metadata,
    NORMAL_CLOSURE,
};
use crate::message::{Frame, Message, MessageCodec, RawCodec};
use crate::server::ServerIdentity;
use crate::subscribe::{ConnectionSubscriber, Protocol};
use crate::utils::error::{BrokerError, ConceptError, SendError, TransportError};
use crate::verifier::{MessageIdempotentVerifier, WindowedVerifier};

/// Collaborators and identity of one concept, assembled once.
pub struct ConceptContext {
    pub identity: ServerIdentity,
    pub protocol: Protocol,
    pub broker: Arc<dyn MessageBroker>,
    pub verifier: Arc<dyn MessageIdempotentVerifier>,
    /// Codec used between local connections and their clients.
    pub codec: Arc<dyn MessageCodec>,
}

impl ConceptContext {
    /// WebSocket protocol, raw client codec and a default-sized verifier.
    pub fn new(identity: ServerIdentity, broker: Arc<dyn MessageBroker>) -> Self {
        Self {
            identity,
            protocol: Protocol::WebSocket,
            broker,
            verifier: Arc::new(WindowedVerifier::default()),
            codec: Arc::new(RawCodec),
        }
    }
}

/// Where `send` handed the message off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Written to a connection owned by this instance.
    Local,
    /// Published for the sibling instances under a freshly minted id.
    Relayed { relay_id: String },
}

pub struct LoadBalanceConcept {
    identity: Arc<ServerIdentity>,
    registry: ConnectionRegistry,
    subscriber: ConnectionSubscriber,
    codec: Arc<dyn MessageCodec>,
    listeners: RwLock<Vec<Arc<dyn ConnectionEventListener>>>,
}

impl LoadBalanceConcept {
    pub fn new(context: ConceptContext) -> Arc<Self> {
        let identity = Arc::new(context.identity);
        let subscriber = ConnectionSubscriber::new(
            &context.protocol,
            identity.clone(),
            context.broker,
            context.verifier,
        );
        Arc::new(Self {
            identity,
            registry: ConnectionRegistry::new(),
            subscriber,
            codec: context.codec,
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Opens the fanout subscription and wires it to local delivery.
    pub fn start(self: &Arc<Self>) -> Result<(), BrokerError> {
        let concept = Arc::downgrade(self);
        self.subscriber.subscribe(Arc::new(move |message: Message| {
            if let Some(concept) = concept.upgrade() {
                concept.on_remote_message(message);
            }
        }))
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn topic(&self) -> &str {
        self.subscriber.topic()
    }

    pub fn add_listener(&self, listener: impl ConnectionEventListener + 'static) {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Wraps a freshly accepted transport in a registered connection.
    pub fn on_open(
        &self,
        transport: Box<dyn ConnectionTransport>,
        kind: ConnectionType,
        metadata: Metadata,
    ) -> Arc<Connection> {
        let connection = Arc::new(Connection::new(
            Uuid::new_v4().to_string(),
            kind,
            metadata,
            self.codec.clone(),
            transport,
        ));
        self.registry.insert(connection.clone());
        info!(
            "Connection {} established on {}",
            connection.id(),
            self.identity.instance_id()
        );

        self.notify(&ConnectionEvent::Established {
            connection: connection.clone(),
        });
        connection
    }

    /// Local inbound path: a frame read from one of our own connections.
    pub fn on_message(&self, connection_id: &str, frame: Frame) {
        let Some(connection) = self.registry.get(connection_id) else {
            debug!("Frame for unknown connection {} dropped", connection_id);
            return;
        };

        // Control frames never reach the client codec
        let frame = match frame {
            Frame::Ping(data) => {
                connection.touch();
                if let Err(e) = connection.send(&Message::pong(data)) {
                    self.handle_send_failure(connection_id, e);
                }
                return;
            }
            Frame::Pong(_) => {
                connection.touch();
                return;
            }
            frame => frame,
        };

        let message = match self.codec.decode(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!("Undecodable frame from {}: {}", connection_id, e);
                return;
            }
        };

        self.notify(&ConnectionEvent::Message {
            connection,
            message,
        });
    }

    /// Remote inbound path: a relay accepted by the subscriber.
    pub fn on_remote_message(&self, message: Message) {
        let Some(target) = message.target() else {
            warn!("Relay {} from {} has no target", message.id, message.from);
            return;
        };

        let Some(connection) = self.registry.get(target) else {
            debug!("Relay {} for {} has no local owner", message.id, target);
            return;
        };

        if let Err(e) = connection.send(&message) {
            let id = connection.id().to_string();
            self.handle_send_failure(&id, e);
        }
    }

    /// Sends `message` to connection `target`, wherever in the service it lives.
    pub fn send(&self, target: &str, message: Message) -> Result<Delivery, ConceptError> {
        if let Some(connection) = self.registry.get(target) {
            return match connection.send(&message) {
                Ok(()) => Ok(Delivery::Local),
                Err(source) => {
                    if let SendError::Transport(cause) = &source {
                        self.on_error(target, cause.clone());
                    }
                    Err(ConceptError::Delivery {
                        id: target.to_string(),
                        source,
                    })
                }
            };
        }

        match self.subscriber.publish(&message, target) {
            Ok(relay_id) => Ok(Delivery::Relayed { relay_id }),
            Err(e) => {
                warn!("Relay for {} failed: {}", target, e);
                Err(ConceptError::Relay(e))
            }
        }
    }

    /// The transport reported a clean close.
    pub fn on_close(&self, connection_id: &str, reason: &str) -> bool {
        self.terminate(connection_id, NORMAL_CLOSURE, reason, None)
    }

    /// The transport failed; the connection is force-closed.
    pub fn on_error(&self, connection_id: &str, cause: TransportError) -> bool {
        if !self.registry.contains(connection_id) {
            debug!("Late failure on closed connection {}: {}", connection_id, cause);
            return false;
        }
        warn!("Connection {} failed: {}", connection_id, cause);
        let reason = cause.to_string();
        self.terminate(connection_id, INTERNAL_ERROR, &reason, Some(cause))
    }

    /// Closes a local connection on behalf of the application.
    pub fn close(&self, connection_id: &str, reason: &str) -> bool {
        self.close_with_code(connection_id, NORMAL_CLOSURE, reason)
    }

    pub fn close_with_code(&self, connection_id: &str, code: u16, reason: &str) -> bool {
        self.terminate(connection_id, code, reason, None)
    }

    fn terminate(
        &self,
        connection_id: &str,
        code: u16,
        reason: &str,
        cause: Option<TransportError>,
    ) -> bool {
        let Some(connection) = self.registry.remove(connection_id) else {
            return false;
        };
        connection.close_with_code(code, reason);
        info!("Connection {} closed ({} {})", connection_id, code, reason);

        let event = match cause {
            Some(cause) => ConnectionEvent::Errored { connection, cause },
            None => ConnectionEvent::Closed {
                connection,
                code,
                reason: reason.to_string(),
            },
        };
        self.notify(&event);
        true
    }

    fn handle_send_failure(&self, connection_id: &str, error: SendError) {
        match error {
            SendError::Transport(cause) => {
                self.on_error(connection_id, cause);
            }
            SendError::Codec(e) => {
                warn!("Message for {} could not be encoded: {}", connection_id, e);
            }
        }
    }

    fn notify(&self, event: &ConnectionEvent) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_event(self, event);
        }
    }
}

impl std::fmt::Debug for LoadBalanceConcept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBalanceConcept")
            .field("instance_id", &self.identity.instance_id())
            .field("topic", &self.topic())
            .field("connections", &self.registry.len())
            .finish()
    }
}
