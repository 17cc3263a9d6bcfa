//! Routing listener
//!
//! Application logic of the bundled server: greets every new connection
//! with its id and forwards `send` requests through the concept, so a
//! client can reach any other client regardless of the instance it landed
//! on.

use tracing::{debug, warn};

use crate::concept::{ConnectionEvent, ConnectionEventListener, LoadBalanceConcept};
use crate::connection::Connection;
use crate::message::{Message, MessageBody};
use crate::transport::message::{ClientMessage, ServerMessage};

#[derive(Debug, Default, Clone, Copy)]
pub struct RoutingListener;

impl RoutingListener {
    fn reply(connection: &Connection, reply: &ServerMessage) {
        let text = match serde_json::to_string(reply) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize reply: {e}");
                return;
            }
        };
        if let Err(e) = connection.send(&Message::text(text)) {
            debug!("Reply to {} not delivered: {}", connection.id(), e);
        }
    }

    fn route(concept: &LoadBalanceConcept, connection: &Connection, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Send { to, payload }) => {
                let wrapped = ServerMessage::Message {
                    from: connection.id().to_string(),
                    payload,
                };
                let body = match serde_json::to_string(&wrapped) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize message: {e}");
                        return;
                    }
                };
                if let Err(e) = concept.send(&to, Message::text(body)) {
                    Self::reply(
                        connection,
                        &ServerMessage::Error {
                            message: e.to_string(),
                        },
                    );
                }
            }
            Err(err) => {
                warn!(
                    "Invalid client message from {}: {err} | {}",
                    connection.id(),
                    &text.chars().take(100).collect::<String>()
                );
                Self::reply(
                    connection,
                    &ServerMessage::Error {
                        message: "invalid client message".to_string(),
                    },
                );
            }
        }
    }
}

impl ConnectionEventListener for RoutingListener {
    fn on_event(&self, concept: &LoadBalanceConcept, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Established { connection } => {
                Self::reply(
                    connection,
                    &ServerMessage::Welcome {
                        connection_id: connection.id().to_string(),
                        instance_id: concept.identity().instance_id().to_string(),
                    },
                );
            }
            ConnectionEvent::Message {
                connection,
                message,
            } => match &message.body {
                MessageBody::Text(text) => Self::route(concept, connection, text),
                _ => debug!("Ignoring non-text message from {}", connection.id()),
            },
            ConnectionEvent::Closed { .. } | ConnectionEvent::Errored { .. } => {}
        }
    }
}
