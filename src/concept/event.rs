use std::sync::Arc;

use crate::concept::LoadBalanceConcept;
use crate::connection::Connection;
use crate::message::Message;
use crate::utils::error::TransportError;

/// Lifecycle and traffic notifications for local connections.
///
/// `Closed` and `Errored` are terminal and fire at most once per connection.
#[derive(Debug)]
pub enum ConnectionEvent {
    Established {
        connection: Arc<Connection>,
    },
    Message {
        connection: Arc<Connection>,
        message: Message,
    },
    Closed {
        connection: Arc<Connection>,
        code: u16,
        reason: String,
    },
    Errored {
        connection: Arc<Connection>,
        cause: TransportError,
    },
}

impl ConnectionEvent {
    pub fn connection(&self) -> &Arc<Connection> {
        match self {
            ConnectionEvent::Established { connection }
            | ConnectionEvent::Message { connection, .. }
            | ConnectionEvent::Closed { connection, .. }
            | ConnectionEvent::Errored { connection, .. } => connection,
        }
    }
}

/// Application hook. Called on the thread that triggered the event; the
/// concept is passed in so listeners can reply or route without keeping
/// their own handle on it.
pub trait ConnectionEventListener: Send + Sync {
    fn on_event(&self, concept: &LoadBalanceConcept, event: &ConnectionEvent);
}

impl<F> ConnectionEventListener for F
where
    F: Fn(&LoadBalanceConcept, &ConnectionEvent) + Send + Sync,
{
    fn on_event(&self, concept: &LoadBalanceConcept, event: &ConnectionEvent) {
        self(concept, event)
    }
}
